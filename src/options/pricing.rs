//! Black-Scholes pricing and Greeks for European options
//!
//! d1 = [ln(S/K) + (r + σ²/2)T] / (σ√T),  d2 = d1 − σ√T
//!
//! - Call = S·Φ(d1) − K·e^(−rT)·Φ(d2)
//! - Put  = K·e^(−rT)·Φ(−d2) − S·Φ(−d1)
//!
//! Reported Greeks use desk conventions: vega and rho per 1% move, theta per
//! calendar day.

use crate::distribution::{norm_cdf, norm_pdf};
use crate::error::{AnalyticsError, Result};
use crate::types::OptionType;
use serde::{Deserialize, Serialize};

/// Greeks for a single option
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    /// Delta: ∂V/∂S
    pub delta: f64,

    /// Gamma: ∂²V/∂S²
    pub gamma: f64,

    /// Vega: ∂V/∂σ (per 1% change in volatility)
    pub vega: f64,

    /// Theta: ∂V/∂t (per day)
    pub theta: f64,

    /// Rho: ∂V/∂r (per 1% change in interest rate)
    pub rho: f64,
}

/// Inputs shared by every pricing call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingInputs {
    pub option_type: OptionType,
    /// Underlying price S
    pub spot: f64,
    /// Strike K
    pub strike: f64,
    /// Years to expiry T
    pub time_to_expiry: f64,
    /// Continuously compounded rate r
    pub rate: f64,
}

impl PricingInputs {
    pub fn validate(&self) -> Result<()> {
        if !(self.spot > 0.0) || !self.spot.is_finite() {
            return Err(AnalyticsError::InvalidParameters(format!(
                "Underlying price must be positive, got {}",
                self.spot
            )));
        }
        if !(self.strike > 0.0) || !self.strike.is_finite() {
            return Err(AnalyticsError::InvalidParameters(format!(
                "Strike price must be positive, got {}",
                self.strike
            )));
        }
        if !(self.time_to_expiry > 0.0) || !self.time_to_expiry.is_finite() {
            return Err(AnalyticsError::InvalidParameters(format!(
                "Time to expiry must be positive, got {}",
                self.time_to_expiry
            )));
        }
        if !self.rate.is_finite() {
            return Err(AnalyticsError::InvalidParameters(
                "Risk-free rate must be finite".to_string(),
            ));
        }
        Ok(())
    }

    fn d1_d2(&self, sigma: f64) -> (f64, f64) {
        let sqrt_t = self.time_to_expiry.sqrt();
        let d1 = ((self.spot / self.strike).ln()
            + (self.rate + 0.5 * sigma * sigma) * self.time_to_expiry)
            / (sigma * sqrt_t);
        (d1, d1 - sigma * sqrt_t)
    }

    fn discount(&self) -> f64 {
        (-self.rate * self.time_to_expiry).exp()
    }
}

fn validate_volatility(sigma: f64) -> Result<()> {
    if !(sigma > 0.0) || !sigma.is_finite() {
        return Err(AnalyticsError::InvalidParameters(format!(
            "Volatility must be positive, got {}",
            sigma
        )));
    }
    Ok(())
}

/// Black-Scholes price
pub fn black_scholes(inputs: &PricingInputs, sigma: f64) -> Result<f64> {
    inputs.validate()?;
    validate_volatility(sigma)?;
    Ok(price_unchecked(inputs, sigma))
}

pub(crate) fn price_unchecked(inputs: &PricingInputs, sigma: f64) -> f64 {
    let (d1, d2) = inputs.d1_d2(sigma);
    let s = inputs.spot;
    let k_disc = inputs.strike * inputs.discount();

    match inputs.option_type {
        OptionType::Call => s * norm_cdf(d1) - k_disc * norm_cdf(d2),
        OptionType::Put => k_disc * norm_cdf(-d2) - s * norm_cdf(-d1),
    }
}

/// ∂V/∂σ per unit of volatility, identical for calls and puts
pub(crate) fn raw_vega(inputs: &PricingInputs, sigma: f64) -> f64 {
    let (d1, _) = inputs.d1_d2(sigma);
    inputs.spot * norm_pdf(d1) * inputs.time_to_expiry.sqrt()
}

/// All five Greeks; `days_per_year` scales theta to a daily figure
pub fn greeks(inputs: &PricingInputs, sigma: f64, days_per_year: f64) -> Result<Greeks> {
    inputs.validate()?;
    validate_volatility(sigma)?;

    let s = inputs.spot;
    let k = inputs.strike;
    let t = inputs.time_to_expiry;
    let r = inputs.rate;
    let sqrt_t = t.sqrt();

    let (d1, d2) = inputs.d1_d2(sigma);
    let n_prime_d1 = norm_pdf(d1);
    let k_disc = k * inputs.discount();

    // Gamma and vega are the same for calls and puts
    let gamma = n_prime_d1 / (s * sigma * sqrt_t);
    let vega = s * n_prime_d1 * sqrt_t / 100.0;

    let decay = -s * n_prime_d1 * sigma / (2.0 * sqrt_t);
    let (delta, theta, rho) = match inputs.option_type {
        OptionType::Call => (
            norm_cdf(d1),
            (decay - r * k_disc * norm_cdf(d2)) / days_per_year,
            k_disc * t * norm_cdf(d2) / 100.0,
        ),
        OptionType::Put => (
            norm_cdf(d1) - 1.0,
            (decay + r * k_disc * norm_cdf(-d2)) / days_per_year,
            -k_disc * t * norm_cdf(-d2) / 100.0,
        ),
    };

    Ok(Greeks {
        delta,
        gamma,
        vega,
        theta,
        rho,
    })
}
