//! Return series derived from daily closes

use crate::error::{AnalyticsError, Result};
use crate::types::{validate_history, PriceBar, Trend};
use serde::{Deserialize, Serialize};

/// Simple and log returns of a price history, in chronological order
///
/// Both vectors have length n − 1 for n input bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    simple: Vec<f64>,
    log: Vec<f64>,
}

impl ReturnSeries {
    /// Derive returns from a validated bar history (n ≥ 2)
    pub fn from_bars(bars: &[PriceBar]) -> Result<Self> {
        if bars.len() < 2 {
            return Err(AnalyticsError::InsufficientData(format!(
                "Need at least 2 bars for returns, got {}",
                bars.len()
            )));
        }
        validate_history(bars)?;

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        Ok(Self::from_valid_closes(&closes))
    }

    /// Derive returns from a bare close series (n ≥ 2, all positive)
    pub fn from_closes(closes: &[f64]) -> Result<Self> {
        if closes.len() < 2 {
            return Err(AnalyticsError::InsufficientData(format!(
                "Need at least 2 closes for returns, got {}",
                closes.len()
            )));
        }
        if let Some(bad) = closes.iter().find(|c| !c.is_finite() || **c <= 0.0) {
            return Err(AnalyticsError::InvalidParameters(format!(
                "Close prices must be positive and finite, got {}",
                bad
            )));
        }

        Ok(Self::from_valid_closes(closes))
    }

    /// Wrap an externally supplied simple-return series (e.g. a benchmark)
    pub fn from_simple_returns(simple: Vec<f64>) -> Result<Self> {
        if let Some(bad) = simple.iter().find(|r| !r.is_finite() || **r <= -1.0) {
            return Err(AnalyticsError::InvalidParameters(format!(
                "Simple returns must be finite and greater than -1, got {}",
                bad
            )));
        }
        let log = simple.iter().map(|r| r.ln_1p()).collect();
        Ok(Self { simple, log })
    }

    fn from_valid_closes(closes: &[f64]) -> Self {
        let (simple, log) = closes
            .windows(2)
            .map(|w| ((w[1] - w[0]) / w[0], (w[1] / w[0]).ln()))
            .unzip();
        Self { simple, log }
    }

    pub fn simple(&self) -> &[f64] {
        &self.simple
    }

    pub fn log(&self) -> &[f64] {
        &self.log
    }

    pub fn len(&self) -> usize {
        self.simple.len()
    }

    pub fn is_empty(&self) -> bool {
        self.simple.is_empty()
    }

    /// Mean simple return
    pub fn mean(&self) -> f64 {
        mean(&self.simple)
    }

    /// Sample standard deviation of simple returns (n − 1 denominator)
    pub fn std_dev(&self) -> Result<f64> {
        Ok(sample_variance(&self.simple)?.sqrt())
    }

    /// Compounded return over the whole series
    pub fn cumulative_return(&self) -> f64 {
        self.simple.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
    }

    pub fn trend(&self, neutral_band: f64) -> Trend {
        Trend::classify(self.cumulative_return(), neutral_band)
    }
}

/// Arithmetic mean; 0 for an empty slice
pub(crate) fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Unbiased sample variance
pub(crate) fn sample_variance(data: &[f64]) -> Result<f64> {
    if data.len() < 2 {
        return Err(AnalyticsError::InsufficientData(format!(
            "Need at least 2 observations for variance, got {}",
            data.len()
        )));
    }
    let m = mean(data);
    Ok(data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (data.len() - 1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                PriceBar::new(
                    start + chrono::Duration::days(i as i64),
                    c,
                    c * 1.01,
                    c * 0.99,
                    c,
                    1_000,
                )
            })
            .collect()
    }

    #[test]
    fn test_simple_and_log_returns() {
        let series = ReturnSeries::from_bars(&bars_from_closes(&[100.0, 102.0, 99.0, 101.0, 105.0]))
            .unwrap();

        assert_eq!(series.len(), 4);
        assert_relative_eq!(series.simple()[0], 0.02, max_relative = 1e-12);
        assert_relative_eq!(series.simple()[1], -3.0 / 102.0, max_relative = 1e-12);
        assert_relative_eq!(series.simple()[2], 2.0 / 99.0, max_relative = 1e-12);
        assert_relative_eq!(series.simple()[3], 4.0 / 101.0, max_relative = 1e-12);
        assert_relative_eq!(series.log()[0], (102.0_f64 / 100.0).ln(), max_relative = 1e-12);
    }

    #[test]
    fn test_annualized_volatility_example() {
        let series = ReturnSeries::from_closes(&[100.0, 102.0, 99.0, 101.0, 105.0]).unwrap();
        let annual = series.std_dev().unwrap() * 252.0_f64.sqrt();
        assert!((annual - 0.468).abs() < 0.001);
    }

    #[test]
    fn test_single_bar_is_insufficient() {
        let result = ReturnSeries::from_bars(&bars_from_closes(&[100.0]));
        assert!(matches!(result, Err(AnalyticsError::InsufficientData(_))));
    }

    #[test]
    fn test_non_positive_close_rejected() {
        assert!(matches!(
            ReturnSeries::from_closes(&[100.0, 0.0, 101.0]),
            Err(AnalyticsError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_cumulative_return_and_trend() {
        let series = ReturnSeries::from_closes(&[100.0, 102.0, 99.0, 101.0, 105.0]).unwrap();
        assert_relative_eq!(series.cumulative_return(), 0.05, max_relative = 1e-12);
        assert_eq!(series.trend(0.01), Trend::Up);

        let flat = ReturnSeries::from_closes(&[100.0, 100.2, 100.1]).unwrap();
        assert_eq!(flat.trend(0.01), Trend::Neutral);
    }

    #[test]
    fn test_from_simple_returns() {
        let series = ReturnSeries::from_simple_returns(vec![0.01, -0.02]).unwrap();
        assert_relative_eq!(series.log()[1], (0.98_f64).ln(), max_relative = 1e-12);
        assert!(ReturnSeries::from_simple_returns(vec![-1.0]).is_err());
    }
}
