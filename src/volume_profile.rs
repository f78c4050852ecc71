//! Volume profile: traded volume by price level
//!
//! The range [min(low), max(high)] is cut into equal-width bins and each bar's
//! volume is credited to the bin holding its typical price (H+L+C)/3.
//!
//! - Point of Control (POC): the bin with the most volume
//! - Value Area: the fewest bins, taken in descending volume order, whose
//!   combined volume reaches the value-area fraction (70% by default)

use crate::config::VolumeProfileConfig;
use crate::error::{AnalyticsError, Result};
use crate::types::PriceBar;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tracing::debug;

/// One price bin of the profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeProfileEntry {
    /// Bin center price
    pub price_level: f64,

    pub lower_bound: f64,

    pub upper_bound: f64,

    pub volume: u64,

    /// Share of total volume, in percent
    pub percentage_of_total: f64,

    pub is_point_of_control: bool,

    pub in_value_area: bool,

    pub value_area_high: f64,

    pub value_area_low: f64,
}

/// Complete volume profile with its summary levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeProfile {
    /// Bins from lowest to highest price
    pub entries: Vec<VolumeProfileEntry>,

    /// Center price of the POC bin
    pub point_of_control: f64,

    pub value_area_high: f64,

    pub value_area_low: f64,

    pub total_volume: u64,

    pub value_area_volume: u64,
}

/// Volume profile analyzer
#[derive(Debug, Clone, Default)]
pub struct VolumeProfileAnalyzer {
    config: VolumeProfileConfig,
}

impl VolumeProfileAnalyzer {
    pub fn new(config: VolumeProfileConfig) -> Self {
        Self { config }
    }

    /// Build the profile with the configured bin count
    pub fn analyze(&self, bars: &[PriceBar]) -> Result<VolumeProfile> {
        self.analyze_with_bins(bars, self.config.bins)
    }

    /// Build the profile with an explicit bin count
    ///
    /// Uses fewer bins than requested when the bars have fewer distinct
    /// typical prices than `bins`.
    pub fn analyze_with_bins(&self, bars: &[PriceBar], bins: usize) -> Result<VolumeProfile> {
        if bars.is_empty() {
            return Err(AnalyticsError::InsufficientData(
                "Volume profile needs at least 1 bar".to_string(),
            ));
        }
        if bins == 0 {
            return Err(AnalyticsError::InvalidParameters(
                "Volume profile needs at least 1 bin".to_string(),
            ));
        }
        for bar in bars {
            bar.validate()?;
        }
        // Bin sums never exceed this total, so binning below cannot overflow.
        let total_volume = bars
            .iter()
            .try_fold(0u64, |acc, b| acc.checked_add(b.volume))
            .ok_or_else(|| {
                AnalyticsError::InvalidParameters("Total bar volume overflows u64".to_string())
            })?;

        let low = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let high = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);

        let mut typical: Vec<f64> = bars.iter().map(PriceBar::typical_price).collect();
        typical.sort_by(|a, b| a.total_cmp(b));
        typical.dedup();

        let effective_bins = if high > low { bins.min(typical.len()) } else { 1 };
        if effective_bins < bins {
            debug!(
                requested = bins,
                effective = effective_bins,
                "Sparse price data; using fewer volume profile bins"
            );
        }

        let width = (high - low) / effective_bins as f64;
        let bin_of = |price: f64| -> usize {
            if width > 0.0 {
                (((price - low) / width).floor() as usize).min(effective_bins - 1)
            } else {
                0
            }
        };

        let mut volumes = vec![0u64; effective_bins];
        for bar in bars {
            volumes[bin_of(bar.typical_price())] += bar.volume;
        }

        // First bin wins ties.
        let poc = volumes
            .iter()
            .enumerate()
            .fold(0, |best, (i, v)| if *v > volumes[best] { i } else { best });

        let value_area = self.value_area(&volumes, poc, total_volume);
        let value_area_volume: u64 = value_area.iter().map(|&i| volumes[i]).sum();

        let lower = |i: usize| low + i as f64 * width;
        let upper = |i: usize| if width > 0.0 { low + (i + 1) as f64 * width } else { high };

        let value_area_low = value_area.iter().map(|&i| lower(i)).fold(f64::INFINITY, f64::min);
        let value_area_high = value_area
            .iter()
            .map(|&i| upper(i))
            .fold(f64::NEG_INFINITY, f64::max);

        let entries: Vec<VolumeProfileEntry> = volumes
            .iter()
            .enumerate()
            .map(|(i, &volume)| VolumeProfileEntry {
                price_level: 0.5 * (lower(i) + upper(i)),
                lower_bound: lower(i),
                upper_bound: upper(i),
                volume,
                percentage_of_total: if total_volume > 0 {
                    volume as f64 / total_volume as f64 * 100.0
                } else {
                    0.0
                },
                is_point_of_control: i == poc,
                in_value_area: value_area.contains(&i),
                value_area_high,
                value_area_low,
            })
            .collect();

        Ok(VolumeProfile {
            point_of_control: entries[poc].price_level,
            entries,
            value_area_high,
            value_area_low,
            total_volume,
            value_area_volume,
        })
    }

    /// Greedy descending-volume selection; ties prefer bins nearer the POC
    fn value_area(&self, volumes: &[u64], poc: usize, total_volume: u64) -> Vec<usize> {
        if total_volume == 0 {
            return vec![poc];
        }

        let mut order: Vec<usize> = (0..volumes.len()).collect();
        order.sort_by_key(|&i| (Reverse(volumes[i]), i.abs_diff(poc), i));

        let target = self.config.value_area_fraction * total_volume as f64;
        let mut cumulative = 0u64;
        let mut selected = Vec::new();
        for i in order {
            selected.push(i);
            cumulative += volumes[i];
            if cumulative as f64 >= target {
                break;
            }
        }
        selected
    }
}
