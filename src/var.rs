//! Value at Risk and Expected Shortfall
//!
//! Reported VaR is the larger of two estimates, both scaled by √horizon:
//! - Historical: −sorted_returns[⌊(1−c)·N⌋]
//! - Parametric: −(μ + Φ⁻¹(1−c)·σ), normal returns assumed
//!
//! Expected Shortfall is the mean loss over the worst ⌊(1−c)·N⌋ returns
//! (at least one).

use crate::distribution::inverse_norm_cdf;
use crate::error::{AnalyticsError, Result};
use crate::returns::{mean, sample_variance};
use serde::{Deserialize, Serialize};

/// VaR figure with the two estimates it was taken from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VarResult {
    /// max(historical, parametric), positive = loss
    pub var: f64,

    pub historical: f64,

    pub parametric: f64,

    /// Confidence level (e.g., 0.95, 0.99)
    pub confidence_level: f64,

    /// Time horizon in days
    pub horizon_days: u32,
}

/// VaR backtesting result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarBacktestResult {
    /// Number of VaR predictions
    pub num_predictions: usize,

    /// Number of violations (realised loss exceeded VaR)
    pub num_violations: usize,

    /// Violation rate (num_violations / num_predictions)
    pub violation_rate: f64,

    /// Expected violation rate based on confidence level
    pub expected_violation_rate: f64,

    /// Whether the violation rate falls inside the two-sigma binomial band
    pub validated: bool,
}

/// Tail-risk calculator over one return sample
///
/// Sorting and the first two moments are computed once at construction.
#[derive(Debug, Clone)]
pub struct VarEngine {
    sorted_returns: Vec<f64>,
    mean: f64,
    std_dev: f64,
}

impl VarEngine {
    /// Build from simple returns (at least 2 observations)
    pub fn new(returns: &[f64]) -> Result<Self> {
        let variance = sample_variance(returns)?;

        let mut sorted_returns = returns.to_vec();
        sorted_returns.sort_by(|a, b| a.total_cmp(b));

        Ok(Self {
            sorted_returns,
            mean: mean(returns),
            std_dev: variance.sqrt(),
        })
    }

    /// Historical VaR from the empirical lower tail
    pub fn historical_var(&self, confidence_level: f64, horizon_days: u32) -> Result<f64> {
        validate_inputs(confidence_level, horizon_days)?;

        let index = self.tail_count(confidence_level).min(self.sorted_returns.len() - 1);
        Ok(-self.sorted_returns[index] * (horizon_days as f64).sqrt())
    }

    /// Parametric VaR assuming normally distributed returns
    pub fn parametric_var(&self, confidence_level: f64, horizon_days: u32) -> Result<f64> {
        validate_inputs(confidence_level, horizon_days)?;

        let z = inverse_norm_cdf(1.0 - confidence_level)?;
        Ok(-(self.mean + z * self.std_dev) * (horizon_days as f64).sqrt())
    }

    /// VaR as the larger of the historical and parametric estimates
    pub fn value_at_risk(&self, confidence_level: f64, horizon_days: u32) -> Result<VarResult> {
        let historical = self.historical_var(confidence_level, horizon_days)?;
        let parametric = self.parametric_var(confidence_level, horizon_days)?;

        Ok(VarResult {
            var: historical.max(parametric),
            historical,
            parametric,
            confidence_level,
            horizon_days,
        })
    }

    /// Expected Shortfall: mean loss over the worst ⌊(1−c)·N⌋ returns
    pub fn expected_shortfall(&self, confidence_level: f64) -> Result<f64> {
        validate_inputs(confidence_level, 1)?;

        let count = self
            .tail_count(confidence_level)
            .clamp(1, self.sorted_returns.len());
        Ok(-mean(&self.sorted_returns[..count]))
    }

    /// Compare VaR predictions with realised returns
    ///
    /// A violation is a realised loss (−return) strictly above the predicted
    /// VaR for the same period.
    pub fn backtest(
        predictions: &[f64],
        realised_returns: &[f64],
        confidence_level: f64,
    ) -> Result<VarBacktestResult> {
        validate_inputs(confidence_level, 1)?;

        if predictions.len() != realised_returns.len() {
            return Err(AnalyticsError::InvalidParameters(
                "Predictions and realised returns must have same length".to_string(),
            ));
        }

        if predictions.is_empty() {
            return Err(AnalyticsError::InsufficientData(
                "No predictions to backtest".to_string(),
            ));
        }

        let num_predictions = predictions.len();
        let num_violations = predictions
            .iter()
            .zip(realised_returns)
            .filter(|(var, ret)| -**ret > **var)
            .count();

        let violation_rate = num_violations as f64 / num_predictions as f64;
        let expected_violation_rate = 1.0 - confidence_level;

        let std_error = (expected_violation_rate * (1.0 - expected_violation_rate)
            / num_predictions as f64)
            .sqrt();
        let lower_bound = (expected_violation_rate - 2.0 * std_error).max(0.0);
        let upper_bound = (expected_violation_rate + 2.0 * std_error).min(1.0);

        Ok(VarBacktestResult {
            num_predictions,
            num_violations,
            violation_rate,
            expected_violation_rate,
            validated: violation_rate >= lower_bound && violation_rate <= upper_bound,
        })
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    fn tail_count(&self, confidence_level: f64) -> usize {
        // Epsilon absorbs representation error in 1 − c (e.g. 1 − 0.9).
        ((1.0 - confidence_level) * self.sorted_returns.len() as f64 + 1e-9).floor() as usize
    }
}

fn validate_inputs(confidence_level: f64, horizon_days: u32) -> Result<()> {
    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return Err(AnalyticsError::InvalidParameters(format!(
            "Confidence level must lie in (0, 1), got {}",
            confidence_level
        )));
    }

    if horizon_days == 0 {
        return Err(AnalyticsError::InvalidParameters(
            "VaR horizon must be at least 1 day".to_string(),
        ));
    }

    Ok(())
}
