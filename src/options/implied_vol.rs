//! Implied volatility by Newton-Raphson on the Black-Scholes price

use super::pricing::{price_unchecked, raw_vega, PricingInputs};
use crate::config::OptionsConfig;
use crate::error::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Vega below this is treated as zero
const MIN_VEGA: f64 = 1e-10;

/// How the solver stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IvStatus {
    /// Model price within tolerance of the market price
    Converged,
    /// Iteration budget exhausted
    MaxIterations,
    /// Vega collapsed, no further Newton step possible
    VegaVanished,
}

/// Solver output; `volatility` is the best estimate even when not converged
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IvSolution {
    pub volatility: f64,
    pub iterations: usize,
    pub status: IvStatus,
}

impl IvSolution {
    pub fn is_converged(&self) -> bool {
        self.status == IvStatus::Converged
    }
}

/// Solve for the volatility that reproduces `market_price`
pub fn solve_implied_volatility(
    inputs: &PricingInputs,
    market_price: f64,
    config: &OptionsConfig,
) -> Result<IvSolution> {
    inputs.validate()?;
    if !(market_price > 0.0) || !market_price.is_finite() {
        return Err(AnalyticsError::InvalidParameters(format!(
            "Market price must be positive, got {}",
            market_price
        )));
    }

    let mut sigma = config.iv_initial_guess;

    for iteration in 0..config.iv_max_iterations {
        let diff = price_unchecked(inputs, sigma) - market_price;
        if diff.abs() < config.iv_tolerance {
            return Ok(IvSolution {
                volatility: sigma,
                iterations: iteration,
                status: IvStatus::Converged,
            });
        }

        let vega = raw_vega(inputs, sigma);
        if vega < MIN_VEGA {
            warn!(
                strike = inputs.strike,
                market_price,
                sigma,
                iterations = iteration,
                "Vega vanished before implied volatility converged"
            );
            return Ok(IvSolution {
                volatility: sigma,
                iterations: iteration,
                status: IvStatus::VegaVanished,
            });
        }

        sigma -= diff / vega;
        if sigma <= 0.0 {
            sigma = config.iv_floor;
        }
    }

    // The last step may have landed inside tolerance.
    let diff = price_unchecked(inputs, sigma) - market_price;
    let status = if diff.abs() < config.iv_tolerance {
        IvStatus::Converged
    } else {
        warn!(
            strike = inputs.strike,
            market_price,
            sigma,
            residual = diff,
            "Implied volatility did not converge"
        );
        IvStatus::MaxIterations
    };

    Ok(IvSolution {
        volatility: sigma,
        iterations: config.iv_max_iterations,
        status,
    })
}
