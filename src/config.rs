//! Analytics configuration
//!
//! Each engine owns a small serde struct with defaults; [`AnalyticsConfig`]
//! groups them so a whole analysis can be described in one YAML or JSON
//! document. Every field may be omitted.

use crate::error::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete analytics configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub risk: RiskConfig,
    pub garch: GarchParams,
    pub monte_carlo: MonteCarloConfig,
    pub volume_profile: VolumeProfileConfig,
    pub options: OptionsConfig,
}

impl AnalyticsConfig {
    /// Load configuration from a YAML string
    ///
    /// # Example
    ///
    /// ```
    /// use ag_quant::AnalyticsConfig;
    ///
    /// let yaml = r#"
    /// monte_carlo:
    ///   simulations: 5000
    ///   seed: 7
    /// volume_profile:
    ///   bins: 12
    /// "#;
    ///
    /// let config = AnalyticsConfig::from_yaml(yaml).unwrap();
    /// assert_eq!(config.monte_carlo.simulations, 5000);
    /// assert_eq!(config.volume_profile.bins, 12);
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: AnalyticsConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: AnalyticsConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no engine can work with
    pub fn validate(&self) -> Result<()> {
        self.risk.validate()?;
        self.garch.validate()?;
        self.monte_carlo.validate()?;
        self.volume_profile.validate()?;
        self.options.validate()
    }
}

/// Risk metric settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Annual risk-free rate used for Sharpe excess returns
    pub risk_free_rate: f64,

    /// Trading days per year used for annualisation
    pub trading_days: f64,

    /// Horizon in days for the reported VaR figures
    pub var_horizon_days: u32,

    /// Cumulative returns within ±band classify as a neutral trend
    pub trend_neutral_band: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.02,
            trading_days: 252.0,
            var_horizon_days: 1,
            trend_neutral_band: 0.01,
        }
    }
}

impl RiskConfig {
    fn validate(&self) -> Result<()> {
        if !(self.trading_days > 0.0) {
            return Err(AnalyticsError::InvalidParameters(
                "trading_days must be positive".to_string(),
            ));
        }
        if self.var_horizon_days == 0 {
            return Err(AnalyticsError::InvalidParameters(
                "var_horizon_days must be at least 1".to_string(),
            ));
        }
        if self.trend_neutral_band < 0.0 {
            return Err(AnalyticsError::InvalidParameters(
                "trend_neutral_band must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// GARCH(1,1) coefficients
///
/// These are fixed inputs, not estimated from the series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GarchParams {
    pub omega: f64,
    pub alpha: f64,
    pub beta: f64,
}

impl Default for GarchParams {
    fn default() -> Self {
        Self {
            omega: 1e-5,
            alpha: 0.08,
            beta: 0.91,
        }
    }
}

impl GarchParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.omega > 0.0) || !(self.alpha >= 0.0) || !(self.beta >= 0.0) {
            return Err(AnalyticsError::InvalidParameters(format!(
                "GARCH requires omega > 0 and alpha, beta >= 0 (got {}, {}, {})",
                self.omega, self.alpha, self.beta
            )));
        }
        Ok(())
    }

    /// α + β
    pub fn persistence(&self) -> f64 {
        self.alpha + self.beta
    }
}

/// Monte Carlo simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    /// Default number of simulated paths
    pub simulations: usize,

    /// Paths per independently seeded chunk
    pub chunk_size: usize,

    /// Random seed for reproducible runs (None = entropy)
    pub seed: Option<u64>,

    /// Dedicated worker count (None = rayon global pool)
    pub workers: Option<usize>,

    /// Abort the run after this many milliseconds
    pub timeout_ms: Option<u64>,

    /// Divisor of the daily drift and variance in each GBM step (dt = 1/trading_days)
    pub trading_days: f64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            simulations: 10_000,
            chunk_size: 1_024,
            seed: None,
            workers: None,
            timeout_ms: None,
            trading_days: 252.0,
        }
    }
}

impl MonteCarloConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(AnalyticsError::InvalidParameters(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if self.workers == Some(0) {
            return Err(AnalyticsError::InvalidParameters(
                "workers must be at least 1 when set".to_string(),
            ));
        }
        if !(self.trading_days > 0.0) {
            return Err(AnalyticsError::InvalidParameters(
                "trading_days must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Volume profile settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeProfileConfig {
    /// Requested number of price bins
    pub bins: usize,

    /// Share of total volume the value area must cover
    pub value_area_fraction: f64,
}

impl Default for VolumeProfileConfig {
    fn default() -> Self {
        Self {
            bins: 24,
            value_area_fraction: 0.70,
        }
    }
}

impl VolumeProfileConfig {
    fn validate(&self) -> Result<()> {
        if self.bins == 0 {
            return Err(AnalyticsError::InvalidParameters(
                "bins must be at least 1".to_string(),
            ));
        }
        if !(self.value_area_fraction > 0.0 && self.value_area_fraction <= 1.0) {
            return Err(AnalyticsError::InvalidParameters(format!(
                "value_area_fraction must lie in (0, 1], got {}",
                self.value_area_fraction
            )));
        }
        Ok(())
    }
}

/// Options analytics settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsConfig {
    /// Continuously compounded risk-free rate
    pub risk_free_rate: f64,

    /// Calendar days per year for expiry conversion
    pub days_per_year: f64,

    /// Options expiring within this many days feed the volatility index
    pub vix_window_days: i64,

    /// Newton-Raphson starting volatility
    pub iv_initial_guess: f64,

    /// Price tolerance for implied volatility convergence
    pub iv_tolerance: f64,

    pub iv_max_iterations: usize,

    /// Lowest volatility the solver may step to
    pub iv_floor: f64,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.05,
            days_per_year: 365.0,
            vix_window_days: 30,
            iv_initial_guess: 0.20,
            iv_tolerance: 1e-6,
            iv_max_iterations: 100,
            iv_floor: 0.001,
        }
    }
}

impl OptionsConfig {
    fn validate(&self) -> Result<()> {
        if !(self.days_per_year > 0.0) {
            return Err(AnalyticsError::InvalidParameters(
                "days_per_year must be positive".to_string(),
            ));
        }
        if !(self.iv_initial_guess > 0.0) || !(self.iv_floor > 0.0) || !(self.iv_tolerance > 0.0) {
            return Err(AnalyticsError::InvalidParameters(
                "implied volatility guess, floor and tolerance must be positive".to_string(),
            ));
        }
        if self.iv_max_iterations == 0 {
            return Err(AnalyticsError::InvalidParameters(
                "iv_max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
