//! GARCH(1,1) conditional volatility
//!
//! Conditional variance recursion over simple returns r:
//!
//! - h₀ = sample variance of the full series
//! - hᵢ = ω + α·rᵢ₋₁² + β·hᵢ₋₁
//! - one-step forecast h₊ = ω + α·r_last² + β·h_last
//!
//! ω, α and β are supplied (default 1e-5, 0.08, 0.91), not estimated by
//! maximum likelihood. Results are only as good as those coefficients are for
//! the series at hand.

use crate::config::GarchParams;
use crate::error::{AnalyticsError, Result};
use crate::returns::{sample_variance, ReturnSeries};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Conditional variance path and forecast for one return series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GarchEstimate {
    /// Coefficients the path was computed with
    pub params: GarchParams,

    /// hᵢ aligned with the input returns
    pub variances: Vec<f64>,

    /// √hᵢ aligned with the input returns
    pub volatilities: Vec<f64>,

    /// Next-period conditional variance
    pub forecast_variance: f64,

    /// Next-period conditional volatility (daily)
    pub forecast_volatility: f64,
}

impl GarchEstimate {
    /// Unconditional variance ω / (1 − α − β), if the process is stationary
    pub fn long_run_variance(&self) -> Option<f64> {
        let persistence = self.params.persistence();
        if persistence < 1.0 {
            Some(self.params.omega / (1.0 - persistence))
        } else {
            None
        }
    }

    /// Variance forecast `horizon` steps ahead
    ///
    /// σ²ₜ₊ₕ = σ²∞ + (α+β)^(h−1)·(σ²ₜ₊₁ − σ²∞). A non-stationary process
    /// (α+β ≥ 1) iterates the recursion with the squared shock replaced by its
    /// expectation instead.
    pub fn forecast_variance_at(&self, horizon: u32) -> Result<f64> {
        if horizon == 0 {
            return Err(AnalyticsError::InvalidParameters(
                "Forecast horizon must be at least 1".to_string(),
            ));
        }

        let persistence = self.params.persistence();
        match self.long_run_variance() {
            Some(long_run) => Ok(long_run
                + persistence.powi(horizon as i32 - 1) * (self.forecast_variance - long_run)),
            None => {
                let mut h = self.forecast_variance;
                for _ in 1..horizon {
                    h = self.params.omega + persistence * h;
                }
                Ok(h)
            }
        }
    }

    /// Forecast volatility scaled to an annual figure
    pub fn annualized_forecast(&self, trading_days: f64) -> f64 {
        self.forecast_volatility * trading_days.sqrt()
    }
}

/// GARCH(1,1) volatility model with fixed coefficients
#[derive(Debug, Clone, Default)]
pub struct GarchModel {
    params: GarchParams,
}

impl GarchModel {
    pub fn new(params: GarchParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &GarchParams {
        &self.params
    }

    /// Run the variance recursion over a return series
    pub fn estimate(&self, returns: &ReturnSeries) -> Result<GarchEstimate> {
        self.estimate_slice(returns.simple())
    }

    /// Run the variance recursion over raw returns
    pub fn estimate_slice(&self, returns: &[f64]) -> Result<GarchEstimate> {
        let last = match returns.last() {
            Some(r) => *r,
            None => {
                return Err(AnalyticsError::InsufficientData(
                    "GARCH needs at least 1 return".to_string(),
                ))
            }
        };

        let GarchParams { omega, alpha, beta } = self.params;

        // One observation has no sample variance; start the path at zero.
        let h0 = if returns.len() >= 2 {
            sample_variance(returns)?
        } else {
            0.0
        };

        let mut variances = Vec::with_capacity(returns.len());
        variances.push(h0);
        for i in 1..returns.len() {
            let prev = variances[i - 1];
            variances.push(omega + alpha * returns[i - 1].powi(2) + beta * prev);
        }

        let h_last = variances[variances.len() - 1];
        let forecast_variance = omega + alpha * last.powi(2) + beta * h_last;
        let volatilities = variances.iter().map(|h| h.sqrt()).collect();

        debug!(
            observations = returns.len(),
            forecast_volatility = forecast_variance.sqrt(),
            "GARCH path computed"
        );

        Ok(GarchEstimate {
            params: self.params,
            variances,
            volatilities,
            forecast_variance,
            forecast_volatility: forecast_variance.sqrt(),
        })
    }
}
