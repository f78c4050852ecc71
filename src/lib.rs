//! # ag-quant: Quantitative Risk Analytics for Daily Price Histories
//!
//! This library derives risk figures and price projections from a daily
//! OHLCV history, and prices European options against a chain snapshot.
//!
//! ## Core Components
//!
//! - **ReturnSeries**: Simple and log returns from closes
//! - **GarchModel**: GARCH(1,1) conditional volatility path and forecast
//! - **RiskMetricsCalculator**: VaR, Expected Shortfall, moments, Sharpe,
//!   drawdown and benchmark beta/alpha
//! - **MonteCarloSimulator**: Parallel geometric Brownian motion projection
//! - **VolumeProfileAnalyzer**: Volume by price, point of control, value area
//! - **OptionsAnalyzer**: Black-Scholes prices, Greeks, implied volatility and
//!   a VIX-style index
//! - **AnalyticsEngine**: One history, every engine, one report
//!
//! ## Example Usage
//!
//! ```rust
//! use ag_quant::{compute_returns, compute_risk_metrics, PriceBar};
//! use chrono::NaiveDate;
//!
//! let closes = [100.0, 102.0, 99.0, 101.0, 105.0, 103.0];
//! let bars: Vec<PriceBar> = closes
//!     .iter()
//!     .enumerate()
//!     .map(|(i, &c)| {
//!         let date = NaiveDate::from_ymd_opt(2024, 1, 2 + i as u32).unwrap();
//!         PriceBar::new(date, c, c, c, c, 1_000)
//!     })
//!     .collect();
//!
//! let returns = compute_returns(&bars).unwrap();
//! assert_eq!(returns.len(), 5);
//!
//! let metrics = compute_risk_metrics(&returns, None).unwrap();
//! assert!(metrics.var95 > 0.0);
//! assert!(!metrics.benchmark.is_measured());
//! ```

pub mod config;
pub mod distribution;
pub mod engine;
pub mod error;
pub mod garch;
pub mod metrics;
pub mod montecarlo;
pub mod options;
pub mod returns;
pub mod types;
pub mod var;
pub mod volume_profile;

pub use config::{
    AnalyticsConfig, GarchParams, MonteCarloConfig, OptionsConfig, RiskConfig,
    VolumeProfileConfig,
};
pub use engine::{AnalysisReport, AnalyticsEngine};
pub use error::{AnalyticsError, Result};
pub use garch::{GarchEstimate, GarchModel};
pub use metrics::{BenchmarkFit, RiskMetrics, RiskMetricsCalculator};
pub use montecarlo::{
    CancelToken, GbmParameters, MonteCarloResult, MonteCarloSimulator, SimulationRequest,
};
pub use options::{
    ChainAnalysis, Greeks, GreeksProfile, IvSolution, IvStatus, OptionQuote, OptionsAnalyzer,
};
pub use returns::ReturnSeries;
pub use types::{OptionType, PriceBar, Trend};
pub use var::{VarBacktestResult, VarEngine, VarResult};
pub use volume_profile::{VolumeProfile, VolumeProfileAnalyzer, VolumeProfileEntry};

use chrono::NaiveDate;

/// Simple and log returns of a bar history
pub fn compute_returns(bars: &[PriceBar]) -> Result<ReturnSeries> {
    ReturnSeries::from_bars(bars)
}

/// GARCH(1,1) path and one-step forecast with the default coefficients
pub fn compute_garch(returns: &ReturnSeries) -> Result<GarchEstimate> {
    GarchModel::default().estimate(returns)
}

/// Full risk metrics set with default settings
pub fn compute_risk_metrics(
    returns: &ReturnSeries,
    benchmark: Option<&ReturnSeries>,
) -> Result<RiskMetrics> {
    RiskMetricsCalculator::default().compute(returns, benchmark)
}

/// GBM projection of `initial_price` over `days`, calibrated on `returns`
pub fn run_monte_carlo(
    initial_price: f64,
    days: u32,
    simulations: usize,
    target_decline: f64,
    returns: &ReturnSeries,
) -> Result<MonteCarloResult> {
    let simulator = MonteCarloSimulator::default();
    let params = GbmParameters::from_returns(returns)?;
    let request = SimulationRequest {
        initial_price,
        horizon_days: days,
        simulations,
        target_decline,
    };
    simulator.run(&request, &params)
}

/// Volume profile entries over `bins` price levels
pub fn compute_volume_profile(bars: &[PriceBar], bins: usize) -> Result<Vec<VolumeProfileEntry>> {
    let profile = VolumeProfileAnalyzer::default().analyze_with_bins(bars, bins)?;
    Ok(profile.entries)
}

/// Black-Scholes price at rate `rate`
pub fn black_scholes(
    option_type: OptionType,
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    rate: f64,
    sigma: f64,
) -> Result<f64> {
    options::pricing::black_scholes(
        &options::PricingInputs {
            option_type,
            spot,
            strike,
            time_to_expiry,
            rate,
        },
        sigma,
    )
}

/// Implied volatility at rate `rate` with the default solver settings
pub fn implied_volatility(
    option_type: OptionType,
    market_price: f64,
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    rate: f64,
) -> Result<IvSolution> {
    let analyzer = OptionsAnalyzer::new(OptionsConfig {
        risk_free_rate: rate,
        ..OptionsConfig::default()
    });
    analyzer.implied_volatility(option_type, market_price, spot, strike, time_to_expiry)
}

/// VIX-style index over a chain snapshot with default options settings
pub fn volatility_index(spot: f64, quotes: &[OptionQuote], as_of: NaiveDate) -> Result<f64> {
    OptionsAnalyzer::default().volatility_index(spot, quotes, as_of)
}

/// Initialize tracing subscriber for logging
///
/// Defaults to `ag_quant=info` when `RUST_LOG` is unset.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ag_quant=info"));

    fmt().with_env_filter(filter).with_target(false).init();
}
