//! Risk and performance metrics over a return series
//!
//! - VaR / Expected Shortfall at 95% and 99% (see [`crate::var`])
//! - Annualized volatility: σ·√252
//! - Sample skewness and excess kurtosis (bias-adjusted)
//! - Sharpe Ratio: mean/σ of returns in excess of rf/252, annualized by √252
//! - Maximum Drawdown: largest peak-to-trough decline of the wealth index
//! - Beta / Alpha against an equal-length benchmark
//!
//! Sortino and Calmar ratios are available as separate calls.

use crate::config::RiskConfig;
use crate::error::{AnalyticsError, Result};
use crate::returns::{mean, sample_variance, ReturnSeries};
use crate::var::VarEngine;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Dispersion below this is treated as zero
const MIN_DISPERSION: f64 = 1e-12;

/// Minimum returns for a full metrics set (excess kurtosis needs 4)
pub const MIN_OBSERVATIONS: usize = 4;

/// Market sensitivity against a benchmark, or its explicit absence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BenchmarkFit {
    /// Regression against a supplied benchmark
    Measured {
        beta: f64,
        /// Annualized
        alpha: f64,
    },

    /// No benchmark supplied; beta and alpha are not measured
    Unavailable,
}

impl BenchmarkFit {
    /// Measured beta, or the conventional market beta of 1 when unavailable
    pub fn beta(&self) -> f64 {
        match self {
            BenchmarkFit::Measured { beta, .. } => *beta,
            BenchmarkFit::Unavailable => 1.0,
        }
    }

    /// Measured annualized alpha, or 0 when unavailable
    pub fn alpha(&self) -> f64 {
        match self {
            BenchmarkFit::Measured { alpha, .. } => *alpha,
            BenchmarkFit::Unavailable => 0.0,
        }
    }

    pub fn is_measured(&self) -> bool {
        matches!(self, BenchmarkFit::Measured { .. })
    }
}

/// Risk metrics for one return series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub var95: f64,
    pub var99: f64,
    pub expected_shortfall95: f64,
    pub expected_shortfall99: f64,

    /// Annualized standard deviation of returns
    pub volatility: f64,

    pub skewness: f64,

    /// Excess kurtosis (normal = 0)
    pub kurtosis: f64,

    /// Annualized
    pub sharpe_ratio: f64,

    /// Largest relative decline from a running peak, as a positive fraction
    pub max_drawdown: f64,

    pub benchmark: BenchmarkFit,
}

impl RiskMetrics {
    /// Beta, falling back to 1 when no benchmark was measured
    pub fn beta(&self) -> f64 {
        self.benchmark.beta()
    }

    /// Annualized alpha, falling back to 0 when no benchmark was measured
    pub fn alpha(&self) -> f64 {
        self.benchmark.alpha()
    }
}

/// Risk metrics calculator
#[derive(Debug, Clone, Default)]
pub struct RiskMetricsCalculator {
    config: RiskConfig,
}

impl RiskMetricsCalculator {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Compute the full metrics set (needs at least 4 returns)
    ///
    /// Zero-variance returns or benchmark fail with `NumericDegenerate`.
    pub fn compute(
        &self,
        returns: &ReturnSeries,
        benchmark: Option<&ReturnSeries>,
    ) -> Result<RiskMetrics> {
        let r = returns.simple();
        if r.len() < MIN_OBSERVATIONS {
            return Err(AnalyticsError::InsufficientData(format!(
                "Need at least {} returns for risk metrics, got {}",
                MIN_OBSERVATIONS,
                r.len()
            )));
        }

        let horizon = self.config.var_horizon_days;
        let tail = VarEngine::new(r)?;
        let var95 = tail.value_at_risk(0.95, horizon)?;
        let var99 = tail.value_at_risk(0.99, horizon)?;

        let benchmark = match benchmark {
            Some(bench) => self.benchmark_fit(r, bench.simple())?,
            None => {
                debug!("No benchmark supplied; beta/alpha left unmeasured");
                BenchmarkFit::Unavailable
            }
        };

        Ok(RiskMetrics {
            var95: var95.var,
            var99: var99.var,
            expected_shortfall95: tail.expected_shortfall(0.95)?,
            expected_shortfall99: tail.expected_shortfall(0.99)?,
            volatility: self.annualized_volatility(r)?,
            skewness: skewness(r)?,
            kurtosis: excess_kurtosis(r)?,
            sharpe_ratio: self.sharpe_ratio(r)?,
            max_drawdown: max_drawdown(r)?,
            benchmark,
        })
    }

    /// Standard deviation scaled by √trading_days
    pub fn annualized_volatility(&self, returns: &[f64]) -> Result<f64> {
        Ok(sample_variance(returns)?.sqrt() * self.config.trading_days.sqrt())
    }

    /// Annualized Sharpe ratio of returns in excess of the daily risk-free rate
    pub fn sharpe_ratio(&self, returns: &[f64]) -> Result<f64> {
        let daily_rf = self.config.risk_free_rate / self.config.trading_days;
        let excess: Vec<f64> = returns.iter().map(|r| r - daily_rf).collect();

        let std_dev = non_degenerate_std(&excess, "Sharpe ratio")?;
        Ok(mean(&excess) / std_dev * self.config.trading_days.sqrt())
    }

    /// Annualized Sortino ratio against an annual minimum acceptable return
    ///
    /// Downside deviation is the root mean square of shortfalls below the
    /// daily MAR, taken over all observations.
    pub fn sortino_ratio(&self, returns: &[f64], minimum_acceptable_return: f64) -> Result<f64> {
        if returns.is_empty() {
            return Err(AnalyticsError::InsufficientData(
                "No returns data".to_string(),
            ));
        }

        let daily_mar = minimum_acceptable_return / self.config.trading_days;
        let downside = (returns
            .iter()
            .map(|r| (r - daily_mar).min(0.0).powi(2))
            .sum::<f64>()
            / returns.len() as f64)
            .sqrt();

        if downside < MIN_DISPERSION {
            return Err(AnalyticsError::NumericDegenerate(
                "Downside deviation is zero".to_string(),
            ));
        }

        Ok((mean(returns) - daily_mar) / downside * self.config.trading_days.sqrt())
    }

    /// Calmar ratio: annualized mean return over maximum drawdown
    pub fn calmar_ratio(&self, returns: &[f64]) -> Result<f64> {
        let max_dd = max_drawdown(returns)?;
        if max_dd < MIN_DISPERSION {
            return Err(AnalyticsError::NumericDegenerate(
                "Maximum drawdown is zero".to_string(),
            ));
        }

        Ok(mean(returns) * self.config.trading_days / max_dd)
    }

    /// Beta and annualized alpha against an equal-length benchmark
    ///
    /// Beta = Cov(r, r_b) / Var(r_b); Alpha = (mean(r) − β·mean(r_b))·252
    pub fn benchmark_fit(&self, returns: &[f64], benchmark: &[f64]) -> Result<BenchmarkFit> {
        if returns.len() != benchmark.len() {
            return Err(AnalyticsError::InvalidParameters(format!(
                "Benchmark length {} does not match returns length {}",
                benchmark.len(),
                returns.len()
            )));
        }

        let bench_variance = sample_variance(benchmark)?;
        if bench_variance.sqrt() < MIN_DISPERSION {
            return Err(AnalyticsError::NumericDegenerate(
                "Benchmark variance is zero".to_string(),
            ));
        }

        let port_mean = mean(returns);
        let bench_mean = mean(benchmark);

        let covariance: f64 = returns
            .iter()
            .zip(benchmark)
            .map(|(p, m)| (p - port_mean) * (m - bench_mean))
            .sum::<f64>()
            / (returns.len() - 1) as f64;

        let beta = covariance / bench_variance;
        let alpha = (port_mean - beta * bench_mean) * self.config.trading_days;

        Ok(BenchmarkFit::Measured { beta, alpha })
    }
}

/// Bias-adjusted sample skewness (n ≥ 3)
pub fn skewness(returns: &[f64]) -> Result<f64> {
    let n = returns.len();
    if n < 3 {
        return Err(AnalyticsError::InsufficientData(format!(
            "Need at least 3 returns for skewness, got {}",
            n
        )));
    }

    let m = mean(returns);
    let s = non_degenerate_std(returns, "skewness")?;
    let nf = n as f64;

    let sum_cubed: f64 = returns.iter().map(|x| ((x - m) / s).powi(3)).sum();
    Ok(nf / ((nf - 1.0) * (nf - 2.0)) * sum_cubed)
}

/// Bias-adjusted sample excess kurtosis (n ≥ 4)
pub fn excess_kurtosis(returns: &[f64]) -> Result<f64> {
    let n = returns.len();
    if n < 4 {
        return Err(AnalyticsError::InsufficientData(format!(
            "Need at least 4 returns for kurtosis, got {}",
            n
        )));
    }

    let m = mean(returns);
    let s = non_degenerate_std(returns, "kurtosis")?;
    let nf = n as f64;

    let sum_fourth: f64 = returns.iter().map(|x| ((x - m) / s).powi(4)).sum();
    let scale = nf * (nf + 1.0) / ((nf - 1.0) * (nf - 2.0) * (nf - 3.0));
    let correction = 3.0 * (nf - 1.0).powi(2) / ((nf - 2.0) * (nf - 3.0));
    Ok(scale * sum_fourth - correction)
}

/// Largest peak-to-trough decline of the compounded wealth index
pub fn max_drawdown(returns: &[f64]) -> Result<f64> {
    if returns.is_empty() {
        return Err(AnalyticsError::InsufficientData(
            "No returns data".to_string(),
        ));
    }

    let mut wealth = 1.0;
    let mut peak = 1.0;
    let mut max_dd = 0.0_f64;

    for r in returns {
        wealth *= 1.0 + r;
        if wealth > peak {
            peak = wealth;
        }
        max_dd = max_dd.max((peak - wealth) / peak);
    }

    Ok(max_dd)
}

fn non_degenerate_std(data: &[f64], what: &str) -> Result<f64> {
    let std_dev = sample_variance(data)?.sqrt();
    if std_dev < MIN_DISPERSION {
        return Err(AnalyticsError::NumericDegenerate(format!(
            "Zero variance in returns; {} is undefined",
            what
        )));
    }
    Ok(std_dev)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn create_test_returns() -> Vec<f64> {
        vec![
            0.01, 0.02, -0.01, 0.015, -0.005, 0.03, -0.02, 0.01, 0.005, -0.01, 0.02, 0.01, -0.015,
            0.025, 0.01, -0.005, 0.015, 0.02, -0.01, 0.005,
        ]
    }

    fn create_market_returns() -> Vec<f64> {
        vec![
            0.008, 0.015, -0.012, 0.01, -0.008, 0.025, -0.018, 0.012, 0.003, -0.015, 0.018, 0.009,
            -0.02, 0.022, 0.012, -0.007, 0.013, 0.017, -0.012, 0.004,
        ]
    }

    #[test]
    fn test_example_history() {
        let returns = ReturnSeries::from_closes(&[100.0, 102.0, 99.0, 101.0, 105.0]).unwrap();
        let metrics = RiskMetricsCalculator::default()
            .compute(&returns, None)
            .unwrap();

        assert!((metrics.volatility - 0.468).abs() < 0.001);
        assert_relative_eq!(metrics.max_drawdown, 3.0 / 102.0, max_relative = 1e-9);
        assert_eq!(metrics.benchmark, BenchmarkFit::Unavailable);
        assert_eq!(metrics.beta(), 1.0);
        assert_eq!(metrics.alpha(), 0.0);
    }

    #[test]
    fn test_var_and_es_ordering() {
        let returns = ReturnSeries::from_simple_returns(create_test_returns()).unwrap();
        let metrics = RiskMetricsCalculator::default()
            .compute(&returns, None)
            .unwrap();

        assert!(metrics.var99 >= metrics.var95);
        assert!(metrics.expected_shortfall99 >= metrics.expected_shortfall95);
        assert!(metrics.var95 > 0.0);
    }

    #[test]
    fn test_sharpe_ratio() {
        let calc = RiskMetricsCalculator::default();
        let returns = create_test_returns();
        let sharpe = calc.sharpe_ratio(&returns).unwrap();

        let daily_rf = 0.02 / 252.0;
        let expected = (mean(&returns) - daily_rf) / sample_variance(&returns).unwrap().sqrt()
            * 252.0_f64.sqrt();
        assert_relative_eq!(sharpe, expected, max_relative = 1e-12);
        assert!(sharpe > 0.0);
    }

    #[test]
    fn test_zero_volatility_is_degenerate() {
        let calc = RiskMetricsCalculator::default();
        let returns = vec![0.01; 20];

        assert!(matches!(
            calc.sharpe_ratio(&returns),
            Err(AnalyticsError::NumericDegenerate(_))
        ));
        assert!(matches!(
            skewness(&returns),
            Err(AnalyticsError::NumericDegenerate(_))
        ));

        let series = ReturnSeries::from_simple_returns(returns).unwrap();
        assert!(matches!(
            calc.compute(&series, None),
            Err(AnalyticsError::NumericDegenerate(_))
        ));
    }

    #[test]
    fn test_skewness_sign() {
        // Long right tail
        let right = vec![-0.01, -0.01, -0.01, -0.01, 0.0, 0.0, 0.08];
        assert!(skewness(&right).unwrap() > 0.0);

        let left: Vec<f64> = right.iter().map(|r| -r).collect();
        assert_relative_eq!(
            skewness(&left).unwrap(),
            -skewness(&right).unwrap(),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_kurtosis_of_symmetric_two_point() {
        // s² = 4/3, Σz⁴ = 9/4 → (20/6)·(9/4) − 27/2
        let data = vec![1.0, -1.0, 1.0, -1.0];
        assert_relative_eq!(excess_kurtosis(&data).unwrap(), -6.0, max_relative = 1e-12);
    }

    #[test]
    fn test_moment_minimum_lengths() {
        assert!(matches!(
            skewness(&[0.01, 0.02]),
            Err(AnalyticsError::InsufficientData(_))
        ));
        assert!(matches!(
            excess_kurtosis(&[0.01, 0.02, 0.03]),
            Err(AnalyticsError::InsufficientData(_))
        ));

        let short = ReturnSeries::from_simple_returns(vec![0.01, -0.02, 0.03]).unwrap();
        assert!(matches!(
            RiskMetricsCalculator::default().compute(&short, None),
            Err(AnalyticsError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_max_drawdown() {
        let returns = vec![0.10, 0.05, -0.20, -0.10, 0.15, 0.05];
        let max_dd = max_drawdown(&returns).unwrap();

        // Peak 1.155 → trough 1.155·0.8·0.9
        assert_relative_eq!(max_dd, 1.0 - 0.8 * 0.9, max_relative = 1e-12);
        assert!(max_drawdown(&[]).is_err());
        assert_eq!(max_drawdown(&[0.01, 0.02]).unwrap(), 0.0);
    }

    #[test]
    fn test_beta_and_alpha() {
        let calc = RiskMetricsCalculator::default();
        let fit = calc
            .benchmark_fit(&create_test_returns(), &create_market_returns())
            .unwrap();

        assert!(fit.is_measured());
        assert!(fit.beta() > 0.5 && fit.beta() < 2.0);
        assert!(fit.alpha().is_finite());
    }

    #[test]
    fn test_beta_against_itself() {
        let calc = RiskMetricsCalculator::default();
        let returns = create_market_returns();
        let fit = calc.benchmark_fit(&returns, &returns).unwrap();

        assert_relative_eq!(fit.beta(), 1.0, max_relative = 1e-12);
        assert!(fit.alpha().abs() < 1e-12);
    }

    #[test]
    fn test_benchmark_length_mismatch() {
        let calc = RiskMetricsCalculator::default();
        assert!(matches!(
            calc.benchmark_fit(&create_test_returns(), &[0.01, 0.02]),
            Err(AnalyticsError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_flat_benchmark_is_degenerate() {
        let calc = RiskMetricsCalculator::default();
        assert!(matches!(
            calc.benchmark_fit(&create_test_returns(), &[0.0; 20]),
            Err(AnalyticsError::NumericDegenerate(_))
        ));
    }

    #[test]
    fn test_sortino_ratio() {
        let calc = RiskMetricsCalculator::default();
        let returns = create_test_returns();
        let sortino = calc.sortino_ratio(&returns, 0.0).unwrap();
        assert!(sortino > 0.0);

        assert!(matches!(
            calc.sortino_ratio(&[0.01, 0.02, 0.03], 0.0),
            Err(AnalyticsError::NumericDegenerate(_))
        ));
    }

    #[test]
    fn test_calmar_ratio() {
        let calc = RiskMetricsCalculator::default();
        let calmar = calc.calmar_ratio(&create_test_returns()).unwrap();
        assert!(calmar > 0.0);

        assert!(calc.calmar_ratio(&[0.01, 0.02]).is_err());
    }
}
