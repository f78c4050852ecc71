//! Black-Scholes options analytics
//!
//! Pricing, Greeks, implied volatility and chain-level summaries for European
//! options. The normal CDF is the shared primitive from
//! [`crate::distribution`], so option prices and VaR share one tail model.

pub mod chain;
pub mod implied_vol;
pub mod pricing;

pub use chain::{put_call_volume_ratio, ChainAnalysis, GreeksProfile, OptionQuote};
pub use implied_vol::{IvSolution, IvStatus};
pub use pricing::{Greeks, PricingInputs};

use crate::config::OptionsConfig;
use crate::error::Result;
use crate::types::OptionType;
use chain::ChainContext;
use chrono::NaiveDate;

/// Options analytics at a fixed risk-free rate and day count
#[derive(Debug, Clone, Default)]
pub struct OptionsAnalyzer {
    config: OptionsConfig,
}

impl OptionsAnalyzer {
    pub fn new(config: OptionsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OptionsConfig {
        &self.config
    }

    fn inputs(
        &self,
        option_type: OptionType,
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
    ) -> PricingInputs {
        PricingInputs {
            option_type,
            spot,
            strike,
            time_to_expiry,
            rate: self.config.risk_free_rate,
        }
    }

    /// Black-Scholes price for `time_to_expiry` years at volatility `sigma`
    ///
    /// # Example
    ///
    /// ```
    /// use ag_quant::{OptionType, OptionsAnalyzer};
    ///
    /// let analyzer = OptionsAnalyzer::default();
    /// let call = analyzer.price(OptionType::Call, 100.0, 100.0, 1.0, 0.2).unwrap();
    /// let put = analyzer.price(OptionType::Put, 100.0, 100.0, 1.0, 0.2).unwrap();
    ///
    /// // Put-call parity at r = 5%
    /// let parity = 100.0 - 100.0 * (-0.05_f64).exp();
    /// assert!((call - put - parity).abs() < 1e-9);
    /// ```
    pub fn price(
        &self,
        option_type: OptionType,
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        sigma: f64,
    ) -> Result<f64> {
        pricing::black_scholes(&self.inputs(option_type, spot, strike, time_to_expiry), sigma)
    }

    /// Delta, gamma, vega (per 1%), theta (per day) and rho (per 1%)
    pub fn greeks(
        &self,
        option_type: OptionType,
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        sigma: f64,
    ) -> Result<Greeks> {
        pricing::greeks(
            &self.inputs(option_type, spot, strike, time_to_expiry),
            sigma,
            self.config.days_per_year,
        )
    }

    /// Volatility implied by `market_price`
    ///
    /// Non-convergence is reported in [`IvSolution::status`], not as an error.
    pub fn implied_volatility(
        &self,
        option_type: OptionType,
        market_price: f64,
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
    ) -> Result<IvSolution> {
        implied_vol::solve_implied_volatility(
            &self.inputs(option_type, spot, strike, time_to_expiry),
            market_price,
            &self.config,
        )
    }

    /// Greeks profile per quote plus chain summaries, as of `as_of`
    pub fn analyze_chain(
        &self,
        spot: f64,
        quotes: &[OptionQuote],
        as_of: NaiveDate,
    ) -> Result<ChainAnalysis> {
        self.context(spot, as_of).analyze(quotes)
    }

    /// VIX-style index over quotes expiring within the configured window
    pub fn volatility_index(
        &self,
        spot: f64,
        quotes: &[OptionQuote],
        as_of: NaiveDate,
    ) -> Result<f64> {
        self.context(spot, as_of).volatility_index(quotes)
    }

    fn context(&self, spot: f64, as_of: NaiveDate) -> ChainContext<'_> {
        ChainContext {
            spot,
            as_of,
            config: &self.config,
        }
    }
}
