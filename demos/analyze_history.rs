//! Price history analysis example
//!
//! Runs every engine over one year of daily bars measured against a benchmark.
//!
//! Run with: cargo run --example analyze_history

use ag_quant::*;
use chrono::{Duration, NaiveDate};
use std::fs;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    println!("=== Price History Analysis Example ===\n");

    // 1. Load settings shipped with the crate
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/analytics.yaml");
    let config = AnalyticsConfig::from_yaml(&fs::read_to_string(path)?)?;

    // 2. One year of synthetic bars for the asset and a calmer benchmark
    let asset = synthetic_bars(252, 0.0006, 0.025, 3);
    let benchmark = synthetic_bars(252, 0.0003, 0.010, 5);

    let engine = AnalyticsEngine::new(config, asset, Some(&benchmark))?;
    let report = engine.report(21, 0.10)?;

    println!("As of {}  close {:.2}", report.as_of, report.last_close);
    println!(
        "Cumulative return: {:.2}%  trend: {:?}",
        report.cumulative_return * 100.0,
        report.trend
    );
    println!();

    // 3. Volatility
    println!("--- GARCH(1,1) ---");
    println!(
        "Next-day volatility: {:.3}%  (annualized {:.2}%)",
        report.garch.forecast_volatility * 100.0,
        report.garch.annualized_forecast(252.0) * 100.0
    );
    if let Some(long_run) = report.garch.long_run_variance() {
        println!("Long-run volatility: {:.3}%", long_run.sqrt() * 100.0);
    }
    println!();

    // 4. Tail risk and performance
    let m = &report.risk_metrics;
    println!("--- Risk Metrics ---");
    println!("VaR 95%: {:.2}%   VaR 99%: {:.2}%", m.var95 * 100.0, m.var99 * 100.0);
    println!(
        "ES 95%:  {:.2}%   ES 99%:  {:.2}%",
        m.expected_shortfall95 * 100.0,
        m.expected_shortfall99 * 100.0
    );
    println!("Volatility: {:.2}%  Sharpe: {:.2}", m.volatility * 100.0, m.sharpe_ratio);
    println!("Skew: {:.3}  Excess kurtosis: {:.3}", m.skewness, m.kurtosis);
    println!("Max drawdown: {:.2}%", m.max_drawdown * 100.0);
    match m.benchmark {
        BenchmarkFit::Measured { beta, alpha } => {
            println!("Beta: {:.3}  Alpha: {:.2}%", beta, alpha * 100.0)
        }
        BenchmarkFit::Unavailable => println!("Beta/alpha: no benchmark"),
    }

    let calculator = RiskMetricsCalculator::new(engine.config().risk.clone());
    let returns = engine.returns().simple();
    println!("Sortino (MAR 0%): {:.2}", calculator.sortino_ratio(returns, 0.0)?);
    println!("Calmar: {:.2}", calculator.calmar_ratio(returns)?);
    println!();

    // 5. Projection
    let mc = &report.monte_carlo;
    println!("--- Monte Carlo (21 days, {} paths) ---", mc.scenarios.len());
    println!(
        "Expected price: {:.2} ({:+.2}%)",
        mc.expected_price,
        mc.expected_return * 100.0
    );
    println!("95% interval: [{:.2}, {:.2}]", mc.ci95.0, mc.ci95.1);
    println!("99% interval: [{:.2}, {:.2}]", mc.ci99.0, mc.ci99.1);
    println!(
        "P(close below {:.2}): {:.1}%",
        mc.target_price,
        mc.probability_below_target * 100.0
    );
    println!();

    // 6. Volume profile
    let vp = &report.volume_profile;
    println!("--- Volume Profile ---");
    println!("Point of control: {:.2}", vp.point_of_control);
    println!("Value area: [{:.2}, {:.2}]", vp.value_area_low, vp.value_area_high);
    for entry in vp.entries.iter().rev() {
        let marker = if entry.is_point_of_control {
            "POC"
        } else if entry.in_value_area {
            " VA"
        } else {
            "   "
        };
        println!(
            "  {} {:>8.2}  {:>5.1}%  {}",
            marker,
            entry.price_level,
            entry.percentage_of_total,
            "#".repeat((entry.percentage_of_total / 0.5) as usize)
        );
    }

    Ok(())
}

fn synthetic_bars(n: usize, drift: f64, wiggle: f64, phase: usize) -> Vec<PriceBar> {
    let start = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
    (0..n)
        .map(|i| {
            let x = (i + phase) as f64;
            let close = 100.0 * (drift * i as f64 + wiggle * (x * 0.21).sin()).exp();
            let open = close * (1.0 - 0.002 * (x * 0.73).cos());
            PriceBar::new(
                start + Duration::days(i as i64),
                open,
                open.max(close) * 1.005,
                open.min(close) * 0.995,
                close,
                500_000 + ((i * 7_919) % 300_000) as u64,
            )
        })
        .collect()
}
