//! Per-analysis facade tying the engines to one price history

use crate::config::AnalyticsConfig;
use crate::error::{AnalyticsError, Result};
use crate::garch::{GarchEstimate, GarchModel};
use crate::metrics::{RiskMetrics, RiskMetricsCalculator};
use crate::montecarlo::{GbmParameters, MonteCarloResult, MonteCarloSimulator, SimulationRequest};
use crate::returns::ReturnSeries;
use crate::types::{PriceBar, Trend};
use crate::volume_profile::{VolumeProfile, VolumeProfileAnalyzer};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, warn};

/// Everything derived from one history in a single pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Date of the last bar
    pub as_of: NaiveDate,
    pub last_close: f64,
    pub cumulative_return: f64,
    pub trend: Trend,
    pub garch: GarchEstimate,
    pub risk_metrics: RiskMetrics,
    pub monte_carlo: MonteCarloResult,
    pub volume_profile: VolumeProfile,
}

/// Analytics over one validated price history
///
/// Returns are derived once at construction and shared by every engine.
#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    config: AnalyticsConfig,
    bars: Vec<PriceBar>,
    returns: ReturnSeries,
    benchmark: Option<ReturnSeries>,
    garch: GarchModel,
}

impl AnalyticsEngine {
    /// Build an engine for `bars`, optionally measured against benchmark bars
    ///
    /// The benchmark is used only when its dates match the asset's bar for
    /// bar; otherwise beta and alpha are reported as unavailable.
    pub fn new(
        config: AnalyticsConfig,
        bars: Vec<PriceBar>,
        benchmark: Option<&[PriceBar]>,
    ) -> Result<Self> {
        config.validate()?;
        let returns = ReturnSeries::from_bars(&bars)?;

        let benchmark = match benchmark {
            Some(bench) if dates_aligned(&bars, bench) => Some(ReturnSeries::from_bars(bench)?),
            Some(bench) => {
                warn!(
                    bars = bars.len(),
                    benchmark_bars = bench.len(),
                    "Benchmark dates do not match the price history; beta/alpha unavailable"
                );
                None
            }
            None => None,
        };

        let garch = GarchModel::new(config.garch)?;

        Ok(Self {
            config,
            bars,
            returns,
            benchmark,
            garch,
        })
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn returns(&self) -> &ReturnSeries {
        &self.returns
    }

    pub fn has_benchmark(&self) -> bool {
        self.benchmark.is_some()
    }

    pub fn last_close(&self) -> f64 {
        // from_bars guarantees at least two bars
        self.bars.last().map_or(0.0, |b| b.close)
    }

    pub fn trend(&self) -> Trend {
        self.returns.trend(self.config.risk.trend_neutral_band)
    }

    pub fn garch(&self) -> Result<GarchEstimate> {
        self.garch.estimate(&self.returns)
    }

    pub fn risk_metrics(&self) -> Result<RiskMetrics> {
        RiskMetricsCalculator::new(self.config.risk.clone())
            .compute(&self.returns, self.benchmark.as_ref())
    }

    /// Project the last close `horizon_days` ahead with the configured path count
    pub fn monte_carlo(&self, horizon_days: u32, target_decline: f64) -> Result<MonteCarloResult> {
        let simulator = MonteCarloSimulator::new(self.config.monte_carlo.clone());
        let params = GbmParameters::from_returns(&self.returns)?;
        let request = SimulationRequest {
            initial_price: self.last_close(),
            horizon_days,
            simulations: self.config.monte_carlo.simulations,
            target_decline,
        };
        simulator.run(&request, &params)
    }

    pub fn volume_profile(&self) -> Result<VolumeProfile> {
        VolumeProfileAnalyzer::new(self.config.volume_profile.clone()).analyze(&self.bars)
    }

    /// Run every engine and bundle the results
    pub fn report(&self, horizon_days: u32, target_decline: f64) -> Result<AnalysisReport> {
        let started = Instant::now();
        let as_of = match self.bars.last() {
            Some(bar) => bar.date,
            None => {
                return Err(AnalyticsError::InsufficientData(
                    "No bars to report on".to_string(),
                ))
            }
        };

        let report = AnalysisReport {
            as_of,
            last_close: self.last_close(),
            cumulative_return: self.returns.cumulative_return(),
            trend: self.trend(),
            garch: self.garch()?,
            risk_metrics: self.risk_metrics()?,
            monte_carlo: self.monte_carlo(horizon_days, target_decline)?,
            volume_profile: self.volume_profile()?,
        };

        info!(
            %as_of,
            bars = self.bars.len(),
            var95 = report.risk_metrics.var95,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Analysis report complete"
        );

        Ok(report)
    }
}

fn dates_aligned(bars: &[PriceBar], benchmark: &[PriceBar]) -> bool {
    bars.len() == benchmark.len() && bars.iter().zip(benchmark).all(|(a, b)| a.date == b.date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::BenchmarkFit;

    fn history(closes: &[f64], start_day: u32) -> Vec<PriceBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let date = NaiveDate::from_ymd_opt(2024, 1, start_day + i as u32).unwrap();
                PriceBar::new(date, c, c * 1.01, c * 0.99, c, 1_000 + 100 * i as u64)
            })
            .collect()
    }

    fn seeded_config() -> AnalyticsConfig {
        let mut config = AnalyticsConfig::default();
        config.monte_carlo.seed = Some(42);
        config.monte_carlo.simulations = 2_000;
        config
    }

    const CLOSES: [f64; 12] = [
        100.0, 101.5, 99.8, 102.3, 103.1, 101.9, 104.4, 105.0, 103.2, 106.1, 107.0, 106.4,
    ];
    const BENCH: [f64; 12] = [
        50.0, 50.4, 50.1, 50.6, 50.9, 50.5, 51.2, 51.3, 50.9, 51.6, 51.8, 51.7,
    ];

    #[test]
    fn test_report_bundles_engines() {
        let engine = AnalyticsEngine::new(seeded_config(), history(&CLOSES, 1), None).unwrap();
        let report = engine.report(30, 0.10).unwrap();

        assert_eq!(report.last_close, 106.4);
        assert_eq!(report.trend, Trend::Up);
        assert_eq!(report.garch.variances.len(), CLOSES.len() - 1);
        assert_eq!(report.monte_carlo.scenarios.len(), 2_000);
        assert_eq!(report.risk_metrics.benchmark, BenchmarkFit::Unavailable);
        let volume: u64 = engine.bars().iter().map(|b| b.volume).sum();
        assert_eq!(report.volume_profile.total_volume, volume);
    }

    #[test]
    fn test_aligned_benchmark_is_measured() {
        let engine = AnalyticsEngine::new(
            seeded_config(),
            history(&CLOSES, 1),
            Some(&history(&BENCH, 1)),
        )
        .unwrap();

        assert!(engine.has_benchmark());
        assert!(engine.risk_metrics().unwrap().benchmark.is_measured());
    }

    #[test]
    fn test_misaligned_benchmark_is_unavailable() {
        let engine = AnalyticsEngine::new(
            seeded_config(),
            history(&CLOSES, 1),
            Some(&history(&BENCH, 2)),
        )
        .unwrap();

        assert!(!engine.has_benchmark());
        assert!(!engine.risk_metrics().unwrap().benchmark.is_measured());
    }

    #[test]
    fn test_seeded_projection_is_reproducible() {
        let engine = AnalyticsEngine::new(seeded_config(), history(&CLOSES, 1), None).unwrap();
        let a = engine.monte_carlo(10, 0.05).unwrap();
        let b = engine.monte_carlo(10, 0.05).unwrap();
        assert_eq!(a.scenarios, b.scenarios);
    }

    #[test]
    fn test_rejects_short_history() {
        let result = AnalyticsEngine::new(AnalyticsConfig::default(), history(&[100.0], 1), None);
        assert!(matches!(result, Err(AnalyticsError::InsufficientData(_))));
    }
}
