//! Core value types shared across the analytics engines

use crate::error::{AnalyticsError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily OHLCV bar
///
/// Bars are immutable once ingested. A history is a chronologically ordered
/// slice with no duplicate dates (see [`validate_history`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Trading date
    pub date: NaiveDate,

    /// Opening price
    pub open: f64,

    /// Session high
    pub high: f64,

    /// Session low
    pub low: f64,

    /// Closing price
    pub close: f64,

    /// Shares traded
    pub volume: u64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Typical price (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Check the OHLC invariants of a single bar
    pub fn validate(&self) -> Result<()> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Err(AnalyticsError::InvalidParameters(format!(
                "Bar {} has a non-positive or non-finite price",
                self.date
            )));
        }

        if self.high < self.open.max(self.close) {
            return Err(AnalyticsError::InvalidParameters(format!(
                "Bar {}: high {} below max(open, close)",
                self.date, self.high
            )));
        }

        if self.low > self.open.min(self.close) {
            return Err(AnalyticsError::InvalidParameters(format!(
                "Bar {}: low {} above min(open, close)",
                self.date, self.low
            )));
        }

        Ok(())
    }
}

/// Validate every bar and require strictly increasing dates
pub fn validate_history(bars: &[PriceBar]) -> Result<()> {
    for bar in bars {
        bar.validate()?;
    }

    for pair in bars.windows(2) {
        if pair[1].date <= pair[0].date {
            return Err(AnalyticsError::InvalidParameters(format!(
                "Bars out of order or duplicated at {}",
                pair[1].date
            )));
        }
    }

    Ok(())
}

/// Option type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    Call,
    Put,
}

/// Direction of a price history over its full span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

impl Trend {
    /// Classify a cumulative return; moves inside `±neutral_band` are neutral
    pub fn classify(cumulative_return: f64, neutral_band: f64) -> Self {
        if cumulative_return > neutral_band {
            Trend::Up
        } else if cumulative_return < -neutral_band {
            Trend::Down
        } else {
            Trend::Neutral
        }
    }
}
