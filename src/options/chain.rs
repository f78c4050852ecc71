//! Option-chain analytics: per-quote Greeks, put/call volume, volatility index

use super::implied_vol::{solve_implied_volatility, IvSolution};
use super::pricing::{greeks, price_unchecked, Greeks, PricingInputs};
use crate::config::OptionsConfig;
use crate::error::{AnalyticsError, Result};
use crate::types::OptionType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One row of an option-chain snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    pub strike: f64,
    pub expiry: NaiveDate,
    pub option_type: OptionType,
    /// Quoted premium
    pub price: f64,
    pub volume: u64,
}

impl OptionQuote {
    pub fn new(
        strike: f64,
        expiry: NaiveDate,
        option_type: OptionType,
        price: f64,
        volume: u64,
    ) -> Self {
        Self {
            strike,
            expiry,
            option_type,
            price,
            volume,
        }
    }

    /// Calendar days from `as_of` to expiry
    pub fn days_to_expiry(&self, as_of: NaiveDate) -> i64 {
        (self.expiry - as_of).num_days()
    }
}

/// Greeks and implied volatility for one quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreeksProfile {
    pub strike: f64,
    pub expiry: NaiveDate,
    pub option_type: OptionType,
    /// Years to expiry
    pub time_to_expiry: f64,
    pub implied_volatility: IvSolution,
    /// Model price at the solved volatility
    pub theoretical_price: f64,
    pub greeks: Greeks,
}

/// Chain-level summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainAnalysis {
    /// One profile per live, positively priced quote
    pub profiles: Vec<GreeksProfile>,
    /// Quotes left out (expired or without a usable price)
    pub skipped: usize,
    /// Put volume / call volume; None without call volume
    pub put_call_volume_ratio: Option<f64>,
    pub volatility_index: f64,
}

pub(crate) struct ChainContext<'a> {
    pub spot: f64,
    pub as_of: NaiveDate,
    pub config: &'a OptionsConfig,
}

impl ChainContext<'_> {
    fn inputs(&self, quote: &OptionQuote, time_to_expiry: f64) -> PricingInputs {
        PricingInputs {
            option_type: quote.option_type,
            spot: self.spot,
            strike: quote.strike,
            time_to_expiry,
            rate: self.config.risk_free_rate,
        }
    }

    fn time_to_expiry(&self, quote: &OptionQuote) -> f64 {
        quote.days_to_expiry(self.as_of) as f64 / self.config.days_per_year
    }

    fn validate(&self) -> Result<()> {
        if !(self.spot > 0.0) || !self.spot.is_finite() {
            return Err(AnalyticsError::InvalidParameters(format!(
                "Underlying price must be positive, got {}",
                self.spot
            )));
        }
        Ok(())
    }

    /// Profile one quote; None when it has expired or carries no price
    fn profile(&self, quote: &OptionQuote) -> Result<Option<GreeksProfile>> {
        let t = self.time_to_expiry(quote);
        if t <= 0.0 || !(quote.price > 0.0) {
            debug!(
                strike = quote.strike,
                expiry = %quote.expiry,
                price = quote.price,
                "Skipping quote"
            );
            return Ok(None);
        }

        let inputs = self.inputs(quote, t);
        let implied_volatility = solve_implied_volatility(&inputs, quote.price, self.config)?;
        let sigma = implied_volatility.volatility;

        Ok(Some(GreeksProfile {
            strike: quote.strike,
            expiry: quote.expiry,
            option_type: quote.option_type,
            time_to_expiry: t,
            implied_volatility,
            theoretical_price: price_unchecked(&inputs, sigma),
            greeks: greeks(&inputs, sigma, self.config.days_per_year)?,
        }))
    }

    pub fn analyze(&self, quotes: &[OptionQuote]) -> Result<ChainAnalysis> {
        self.validate()?;

        let mut profiles = Vec::with_capacity(quotes.len());
        for quote in quotes {
            if let Some(profile) = self.profile(quote)? {
                profiles.push(profile);
            }
        }
        let skipped = quotes.len() - profiles.len();

        let non_converged = profiles
            .iter()
            .filter(|p| !p.implied_volatility.is_converged())
            .count();
        if non_converged > 0 {
            warn!(
                non_converged,
                total = profiles.len(),
                "Some implied volatilities did not converge"
            );
        }

        Ok(ChainAnalysis {
            volatility_index: volatility_index_from_profiles(&profiles, self.config),
            put_call_volume_ratio: put_call_volume_ratio(quotes)?,
            profiles,
            skipped,
        })
    }

    pub fn volatility_index(&self, quotes: &[OptionQuote]) -> Result<f64> {
        self.validate()?;

        let window = self.config.vix_window_days;
        let mut profiles = Vec::new();
        for quote in quotes {
            let days = quote.days_to_expiry(self.as_of);
            if days > 0 && days <= window {
                if let Some(profile) = self.profile(quote)? {
                    profiles.push(profile);
                }
            }
        }

        Ok(volatility_index_from_profiles(&profiles, self.config))
    }
}

/// Put volume over call volume, `None` without call volume
///
/// Fails with `InvalidParameters` when either side's total overflows `u64`.
pub fn put_call_volume_ratio(quotes: &[OptionQuote]) -> Result<Option<f64>> {
    let (puts, calls) = quotes
        .iter()
        .try_fold((0u64, 0u64), |(p, c), q| match q.option_type {
            OptionType::Put => Some((p.checked_add(q.volume)?, c)),
            OptionType::Call => Some((p, c.checked_add(q.volume)?)),
        })
        .ok_or_else(|| {
            AnalyticsError::InvalidParameters("Option chain volume overflows u64".to_string())
        })?;

    if calls == 0 {
        Ok(None)
    } else {
        Ok(Some(puts as f64 / calls as f64))
    }
}

/// VIX-style index over near-dated profiles
///
/// Each option contributes (ΔK/K²)·e^(rT)·IV, weighted by T. ΔK is half the
/// distance between the neighbouring strikes, one-sided at the ends of the
/// strike ladder. Returns √(Σ wᵢcᵢ / Σ wᵢ) × 100, or 0 with nothing in window.
fn volatility_index_from_profiles(profiles: &[GreeksProfile], config: &OptionsConfig) -> f64 {
    let window_years = config.vix_window_days as f64 / config.days_per_year;
    let near: Vec<&GreeksProfile> = profiles
        .iter()
        .filter(|p| p.time_to_expiry > 0.0 && p.time_to_expiry <= window_years + 1e-12)
        .collect();

    if near.is_empty() {
        return 0.0;
    }

    let mut strikes: Vec<f64> = near.iter().map(|p| p.strike).collect();
    strikes.sort_by(|a, b| a.total_cmp(b));
    strikes.dedup();

    if strikes.len() < 2 {
        debug!(strike = strikes[0], "Single strike in volatility index window");
    }

    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    for profile in near {
        let t = profile.time_to_expiry;
        let spacing = strike_spacing(&strikes, profile.strike);
        let contribution = spacing / (profile.strike * profile.strike)
            * (config.risk_free_rate * t).exp()
            * profile.implied_volatility.volatility;

        weighted += contribution * t;
        total_weight += t;
    }

    if total_weight > 0.0 {
        (weighted / total_weight).max(0.0).sqrt() * 100.0
    } else {
        0.0
    }
}

/// Half the gap between neighbouring strikes; a lone strike has no spacing
fn strike_spacing(strikes: &[f64], strike: f64) -> f64 {
    let n = strikes.len();
    if n < 2 {
        return 0.0;
    }

    let i = strikes
        .binary_search_by(|k| k.total_cmp(&strike))
        .unwrap_or_else(|insert| insert.min(n - 1));

    if i == 0 {
        strikes[1] - strikes[0]
    } else if i == n - 1 {
        strikes[n - 1] - strikes[n - 2]
    } else {
        0.5 * (strikes[i + 1] - strikes[i - 1])
    }
}
