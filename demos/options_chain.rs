//! Option chain example
//!
//! Prices a small chain, solves implied volatilities from the quotes and
//! derives Greeks, put/call volume and a VIX-style index.
//!
//! Run with: cargo run --example options_chain

use ag_quant::*;
use chrono::{Duration, NaiveDate};

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    println!("=== Option Chain Analysis Example ===\n");

    let analyzer = OptionsAnalyzer::default();
    let spot: f64 = 100.0;
    let as_of = NaiveDate::from_ymd_opt(2024, 6, 3).ok_or("invalid date")?;

    // 1. Single option
    let call = analyzer.price(OptionType::Call, spot, 100.0, 0.25, 0.20)?;
    let put = analyzer.price(OptionType::Put, spot, 100.0, 0.25, 0.20)?;
    let greeks = analyzer.greeks(OptionType::Call, spot, 100.0, 0.25, 0.20)?;
    println!("ATM 3-month call: {:.4}   put: {:.4}", call, put);
    println!(
        "  delta {:.4}  gamma {:.4}  vega {:.4}/1%  theta {:.4}/day  rho {:.4}/1%",
        greeks.delta, greeks.gamma, greeks.vega, greeks.theta, greeks.rho
    );
    println!();

    // 2. Chain with a volatility smile
    let mut quotes = Vec::new();
    for days in [9_i64, 23, 58] {
        for strike in [90.0_f64, 95.0, 100.0, 105.0, 110.0] {
            let smile = 0.20 + 0.6 * (strike / spot).ln().powi(2);
            let t = days as f64 / 365.0;
            for (option_type, volume) in [(OptionType::Call, 1_200), (OptionType::Put, 900)] {
                let price = analyzer.price(option_type, spot, strike, t, smile)?;
                quotes.push(OptionQuote::new(
                    strike,
                    as_of + Duration::days(days),
                    option_type,
                    (price * 100.0).round() / 100.0,
                    volume,
                ));
            }
        }
    }

    let chain = analyzer.analyze_chain(spot, &quotes, as_of)?;

    println!(
        "{:>10} {:>6} {:>5} {:>8} {:>8} {:>8} {:>8}",
        "expiry", "strike", "type", "iv", "delta", "gamma", "vega"
    );
    for p in &chain.profiles {
        let flag = if p.implied_volatility.is_converged() { "" } else { " *" };
        println!(
            "{:>10} {:>6.1} {:>5} {:>7.2}% {:>8.4} {:>8.4} {:>8.4}{}",
            p.expiry,
            p.strike,
            format!("{:?}", p.option_type),
            p.implied_volatility.volatility * 100.0,
            p.greeks.delta,
            p.greeks.gamma,
            p.greeks.vega,
            flag
        );
    }
    println!();

    if let Some(ratio) = chain.put_call_volume_ratio {
        println!("Put/call volume ratio: {:.2}", ratio);
    }
    println!("Volatility index (≤30 days): {:.2}", chain.volatility_index);
    if chain.skipped > 0 {
        println!("Skipped quotes: {}", chain.skipped);
    }

    Ok(())
}
