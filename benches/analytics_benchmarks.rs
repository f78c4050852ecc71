//! Benchmarks for the analytics engines
//!
//! Run with: cargo bench

use ag_quant::*;
use chrono::{Duration, NaiveDate};

fn main() {
    println!("=== Analytics Engine Performance Benchmarks ===\n");

    let bars = synthetic_bars(2_520);

    benchmark_returns_and_garch(&bars);
    benchmark_risk_metrics(&bars);
    benchmark_monte_carlo(&bars);
    benchmark_volume_profile(&bars);
    benchmark_options();
}

fn synthetic_bars(n: usize) -> Vec<PriceBar> {
    let start = NaiveDate::from_ymd_opt(2014, 1, 2).unwrap();
    (0..n)
        .map(|i| {
            let x = i as f64;
            let close = 100.0 * (0.0003 * x + 0.05 * (x * 0.05).sin()).exp();
            PriceBar::new(
                start + Duration::days(i as i64),
                close,
                close * 1.01,
                close * 0.99,
                close,
                1_000_000 + (i as u64 * 7_919) % 500_000,
            )
        })
        .collect()
}

fn benchmark_returns_and_garch(bars: &[PriceBar]) {
    println!("## Returns and GARCH");

    let start = std::time::Instant::now();
    for _ in 0..100 {
        let _ = compute_returns(bars);
    }
    let elapsed = start.elapsed();
    println!("  Return series, {} bars (100 iterations): {:?}", bars.len(), elapsed);
    println!("  Average: {:?}", elapsed / 100);

    let returns = compute_returns(bars).unwrap();
    let model = GarchModel::default();
    let start = std::time::Instant::now();
    for _ in 0..100 {
        let _ = model.estimate(&returns);
    }
    let elapsed = start.elapsed();
    println!("  GARCH(1,1) path (100 iterations): {:?}", elapsed);
    println!("  Average: {:?}", elapsed / 100);

    println!();
}

fn benchmark_risk_metrics(bars: &[PriceBar]) {
    println!("## Risk Metrics");

    let returns = compute_returns(bars).unwrap();
    let calculator = RiskMetricsCalculator::default();

    let start = std::time::Instant::now();
    for _ in 0..100 {
        let _ = calculator.compute(&returns, Some(&returns));
    }
    let elapsed = start.elapsed();
    println!("  Full metrics with benchmark (100 iterations): {:?}", elapsed);
    println!("  Average: {:?}", elapsed / 100);

    let engine = VarEngine::new(returns.simple()).unwrap();
    let start = std::time::Instant::now();
    for _ in 0..10_000 {
        let _ = engine.value_at_risk(0.99, 10);
    }
    let elapsed = start.elapsed();
    println!("  VaR on presorted returns (10,000 iterations): {:?}", elapsed);
    println!("  Average: {:?}", elapsed / 10_000);

    println!();
}

fn benchmark_monte_carlo(bars: &[PriceBar]) {
    println!("## Monte Carlo");

    let returns = compute_returns(bars).unwrap();
    let params = GbmParameters::from_returns(&returns).unwrap();
    let request = SimulationRequest {
        initial_price: 100.0,
        horizon_days: 252,
        simulations: 10_000,
        target_decline: 0.2,
    };

    for workers in [Some(1), None] {
        let simulator = MonteCarloSimulator::new(MonteCarloConfig {
            seed: Some(7),
            workers,
            ..MonteCarloConfig::default()
        });

        let start = std::time::Instant::now();
        let _ = simulator.run(&request, &params);
        let elapsed = start.elapsed();

        let label = match workers {
            Some(n) => format!("{} worker", n),
            None => "global pool".to_string(),
        };
        println!("  10,000 paths x 252 days ({}): {:?}", label, elapsed);
    }

    println!();
}

fn benchmark_volume_profile(bars: &[PriceBar]) {
    println!("## Volume Profile");

    let analyzer = VolumeProfileAnalyzer::default();
    let start = std::time::Instant::now();
    for _ in 0..100 {
        let _ = analyzer.analyze_with_bins(bars, 50);
    }
    let elapsed = start.elapsed();
    println!("  50 bins over {} bars (100 iterations): {:?}", bars.len(), elapsed);
    println!("  Average: {:?}", elapsed / 100);

    println!();
}

fn benchmark_options() {
    println!("## Options");

    let analyzer = OptionsAnalyzer::default();

    let start = std::time::Instant::now();
    for _ in 0..10_000 {
        let _ = analyzer.greeks(OptionType::Call, 100.0, 105.0, 0.25, 0.2);
    }
    let elapsed = start.elapsed();
    println!("  Greeks (10,000 iterations): {:?}", elapsed);
    println!("  Average: {:?}", elapsed / 10_000);

    let price = analyzer.price(OptionType::Put, 100.0, 95.0, 0.25, 0.35).unwrap();
    let start = std::time::Instant::now();
    for _ in 0..10_000 {
        let _ = analyzer.implied_volatility(OptionType::Put, price, 100.0, 95.0, 0.25);
    }
    let elapsed = start.elapsed();
    println!("  Implied volatility (10,000 iterations): {:?}", elapsed);
    println!("  Average: {:?}", elapsed / 10_000);

    let as_of = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
    let quotes: Vec<OptionQuote> = (0..200)
        .map(|i| {
            let strike = 80.0 + (i % 40) as f64;
            let days = 7 + 7 * (i / 40) as i64;
            let option_type = if i % 2 == 0 { OptionType::Call } else { OptionType::Put };
            let t = days as f64 / 365.0;
            let price = analyzer.price(option_type, 100.0, strike, t, 0.25).unwrap_or(0.0);
            OptionQuote::new(strike, as_of + Duration::days(days), option_type, price, 100)
        })
        .collect();

    let start = std::time::Instant::now();
    let _ = analyzer.analyze_chain(100.0, &quotes, as_of);
    let elapsed = start.elapsed();
    println!("  Chain analysis, {} quotes: {:?}", quotes.len(), elapsed);

    println!();
}
