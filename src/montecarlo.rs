//! Monte Carlo price projection under geometric Brownian motion
//!
//! Each path starts at S₀ and takes one step per trading day:
//!
//!   S ← S · exp((μ − σ²/2)·dt + σ·√dt·z),  dt = 1/252
//!
//! with z drawn by Box–Muller from two open-interval uniforms. μ and σ are
//! the mean and sample standard deviation of daily returns, used as they are
//! (see [`GbmParameters::from_returns`]).
//!
//! Paths are split into fixed-size chunks. Every chunk gets its own `StdRng`
//! seeded from the caller's generator before any work starts, so the terminal
//! price multiset depends only on that generator, never on thread count or
//! scheduling.

use crate::config::MonteCarloConfig;
use crate::error::{AnalyticsError, Result};
use crate::returns::ReturnSeries;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rand_distr::Open01;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Drift and volatility driving the simulation, in daily-return units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GbmParameters {
    pub drift: f64,
    pub volatility: f64,
}

impl GbmParameters {
    /// μ = mean(daily returns), σ = stddev(daily returns), unscaled
    pub fn from_returns(returns: &ReturnSeries) -> Result<Self> {
        Ok(Self {
            drift: returns.mean(),
            volatility: returns.std_dev()?,
        })
    }
}

/// One projection request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    /// S₀
    pub initial_price: f64,

    pub horizon_days: u32,

    pub simulations: usize,

    /// Fractional decline defining the target, e.g. 0.10 for S₀·0.9
    pub target_decline: f64,
}

/// Cooperative cancellation flag shared with a running simulation
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Distribution of simulated terminal prices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloResult {
    /// Terminal prices, ascending
    pub scenarios: Vec<f64>,

    /// S₀·(1 − target_decline)
    pub target_price: f64,

    /// Fraction of terminal prices below the target
    pub probability_below_target: f64,

    /// Fraction of terminal prices at or above the target
    pub probability_above_target: f64,

    /// [2.5%, 97.5%] terminal price quantiles
    pub ci95: (f64, f64),

    /// [0.5%, 99.5%] terminal price quantiles
    pub ci99: (f64, f64),

    /// Mean terminal price
    pub expected_price: f64,

    /// Mean terminal price relative to S₀, minus one
    pub expected_return: f64,

    pub worst_case: f64,

    pub best_case: f64,
}

impl MonteCarloResult {
    fn from_terminal_prices(mut scenarios: Vec<f64>, initial_price: f64, target_decline: f64) -> Self {
        scenarios.sort_by(|a, b| a.total_cmp(b));

        let n = scenarios.len() as f64;
        let target_price = initial_price * (1.0 - target_decline);
        // Sorted, so the count below target is the partition point.
        let below = scenarios.partition_point(|p| *p < target_price) as f64 / n;
        let expected_price = scenarios.iter().sum::<f64>() / n;

        let quantile = |q: f64| scenarios[quantile_index(scenarios.len(), q)];

        Self {
            target_price,
            probability_below_target: below,
            probability_above_target: 1.0 - below,
            ci95: (quantile(0.025), quantile(0.975)),
            ci99: (quantile(0.005), quantile(0.995)),
            expected_price,
            expected_return: expected_price / initial_price - 1.0,
            worst_case: scenarios[0],
            best_case: scenarios[scenarios.len() - 1],
            scenarios,
        }
    }

    /// Terminal price at quantile q ∈ [0, 1] (lower empirical quantile)
    pub fn percentile(&self, q: f64) -> Result<f64> {
        if !(0.0..=1.0).contains(&q) {
            return Err(AnalyticsError::InvalidParameters(format!(
                "Quantile must lie in [0, 1], got {}",
                q
            )));
        }
        Ok(self.scenarios[quantile_index(self.scenarios.len(), q)])
    }
}

fn quantile_index(len: usize, q: f64) -> usize {
    ((q * len as f64).floor() as usize).min(len - 1)
}

enum Abort {
    Cancelled,
    Timeout,
}

/// Monte Carlo GBM simulator
#[derive(Debug, Clone, Default)]
pub struct MonteCarloSimulator {
    config: MonteCarloConfig,
}

impl MonteCarloSimulator {
    pub fn new(config: MonteCarloConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    /// Run with the configured seed (or entropy when none is set)
    pub fn run(&self, request: &SimulationRequest, params: &GbmParameters) -> Result<MonteCarloResult> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.run_with_rng(request, params, &mut rng, &CancelToken::new())
    }

    /// Run with an injected generator and cancellation token
    ///
    /// The generator only seeds the per-chunk generators, so two runs with
    /// equally seeded generators produce the same terminal prices.
    pub fn run_with_rng<R: RngCore + ?Sized>(
        &self,
        request: &SimulationRequest,
        params: &GbmParameters,
        rng: &mut R,
        cancel: &CancelToken,
    ) -> Result<MonteCarloResult> {
        validate_request(request, params)?;

        let requested = request.simulations;
        let chunk_size = self.config.chunk_size.max(1);
        let chunk_count = requested.div_ceil(chunk_size);
        let seeds: Vec<u64> = (0..chunk_count).map(|_| rng.next_u64()).collect();

        let stepper = PathStepper::new(params, self.config.trading_days);
        let started = Instant::now();
        let deadline = self.config.timeout().map(|t| started + t);
        let completed = AtomicUsize::new(0);

        let simulate = || {
            seeds
                .par_iter()
                .enumerate()
                .map(|(chunk, seed)| {
                    let paths = chunk_size.min(requested - chunk * chunk_size);
                    let mut chunk_rng = StdRng::seed_from_u64(*seed);
                    let mut terminal = Vec::with_capacity(paths);

                    for _ in 0..paths {
                        if cancel.is_cancelled() {
                            return Err(Abort::Cancelled);
                        }
                        if deadline.is_some_and(|d| Instant::now() >= d) {
                            return Err(Abort::Timeout);
                        }
                        terminal.push(stepper.terminal_price(
                            request.initial_price,
                            request.horizon_days,
                            &mut chunk_rng,
                        ));
                        completed.fetch_add(1, Ordering::Relaxed);
                    }
                    Ok(terminal)
                })
                .collect::<std::result::Result<Vec<Vec<f64>>, Abort>>()
        };

        let outcome = match self.config.workers {
            Some(workers) => rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|e| AnalyticsError::InvalidParameters(e.to_string()))?
                .install(simulate),
            None => simulate(),
        };

        let chunks = match outcome {
            Ok(chunks) => chunks,
            Err(abort) => {
                let completed = completed.load(Ordering::Relaxed);
                return Err(match abort {
                    Abort::Cancelled => {
                        warn!(completed, requested, "Monte Carlo run cancelled");
                        AnalyticsError::Cancelled { completed, requested }
                    }
                    Abort::Timeout => {
                        warn!(completed, requested, "Monte Carlo run timed out");
                        AnalyticsError::Timeout { completed, requested }
                    }
                });
            }
        };

        let terminal: Vec<f64> = chunks.into_iter().flatten().collect();
        debug!(
            simulations = requested,
            horizon_days = request.horizon_days,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Monte Carlo run complete"
        );

        Ok(MonteCarloResult::from_terminal_prices(
            terminal,
            request.initial_price,
            request.target_decline,
        ))
    }
}

/// Per-day GBM increment with precomputed drift and diffusion terms
///
/// drift = (μ − σ²/2)/days_per_year, diffusion = σ/√days_per_year
struct PathStepper {
    drift: f64,
    diffusion: f64,
}

impl PathStepper {
    fn new(params: &GbmParameters, trading_days: f64) -> Self {
        let dt = 1.0 / trading_days;
        Self {
            drift: (params.drift - 0.5 * params.volatility * params.volatility) * dt,
            diffusion: params.volatility * dt.sqrt(),
        }
    }

    fn terminal_price<R: Rng>(&self, initial_price: f64, days: u32, rng: &mut R) -> f64 {
        let mut price = initial_price;
        for _ in 0..days {
            let z = box_muller(rng);
            price *= (self.drift + self.diffusion * z).exp();
        }
        price
    }
}

/// Standard normal draw from two independent uniforms on (0, 1)
fn box_muller<R: Rng>(rng: &mut R) -> f64 {
    let u1: f64 = rng.sample(Open01);
    let u2: f64 = rng.sample(Open01);
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

fn validate_request(request: &SimulationRequest, params: &GbmParameters) -> Result<()> {
    if request.simulations < 1 {
        return Err(AnalyticsError::InvalidParameters(
            "Number of simulations must be at least 1".to_string(),
        ));
    }
    if request.horizon_days < 1 {
        return Err(AnalyticsError::InvalidParameters(
            "Horizon must be at least 1 day".to_string(),
        ));
    }
    if !(request.initial_price > 0.0) || !request.initial_price.is_finite() {
        return Err(AnalyticsError::InvalidParameters(format!(
            "Initial price must be positive, got {}",
            request.initial_price
        )));
    }
    if !(0.0..1.0).contains(&request.target_decline) {
        return Err(AnalyticsError::InvalidParameters(format!(
            "Target decline must lie in [0, 1), got {}",
            request.target_decline
        )));
    }
    if !params.drift.is_finite() || !params.volatility.is_finite() || params.volatility < 0.0 {
        return Err(AnalyticsError::InvalidParameters(format!(
            "Drift must be finite and volatility non-negative (got {}, {})",
            params.drift, params.volatility
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> MonteCarloSimulator {
        MonteCarloSimulator::new(MonteCarloConfig {
            seed: Some(seed),
            ..Default::default()
        })
    }

    fn request(simulations: usize) -> SimulationRequest {
        SimulationRequest {
            initial_price: 100.0,
            horizon_days: 30,
            simulations,
            target_decline: 0.10,
        }
    }

    const PARAMS: GbmParameters = GbmParameters {
        drift: 0.08,
        volatility: 0.25,
    };

    #[test]
    fn test_zero_drift_zero_volatility_is_flat() {
        let params = GbmParameters {
            drift: 0.0,
            volatility: 0.0,
        };
        let result = seeded(1).run(&request(2_000), &params).unwrap();

        assert_eq!(result.scenarios.len(), 2_000);
        assert!(result.scenarios.iter().all(|p| *p == 100.0));
        assert_eq!(result.probability_below_target, 0.0);
        assert_eq!(result.probability_above_target, 1.0);
        assert_eq!(result.worst_case, 100.0);
        assert_eq!(result.best_case, 100.0);
    }

    #[test]
    fn test_result_shape() {
        let result = seeded(42).run(&request(5_000), &PARAMS).unwrap();

        assert_eq!(result.scenarios.len(), 5_000);
        assert!(result.scenarios.windows(2).all(|w| w[0] <= w[1]));
        assert!(result.ci99.0 <= result.ci95.0 && result.ci95.1 <= result.ci99.1);
        assert!(result.ci95.0 < result.ci95.1);
        assert_eq!(result.worst_case, result.scenarios[0]);
        assert_eq!(result.best_case, result.scenarios[4_999]);
        assert!(result.worst_case > 0.0);
        assert!(
            (result.probability_below_target + result.probability_above_target - 1.0).abs() < 1e-12
        );
        assert!((result.target_price - 90.0).abs() < 1e-12);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let a = seeded(7).run(&request(3_000), &PARAMS).unwrap();
        let b = seeded(7).run(&request(3_000), &PARAMS).unwrap();
        assert_eq!(a.scenarios, b.scenarios);

        let c = seeded(8).run(&request(3_000), &PARAMS).unwrap();
        assert_ne!(a.scenarios, c.scenarios);
    }

    #[test]
    fn test_worker_count_does_not_change_result() {
        let single = MonteCarloSimulator::new(MonteCarloConfig {
            seed: Some(11),
            workers: Some(1),
            chunk_size: 100,
            ..Default::default()
        });
        let many = MonteCarloSimulator::new(MonteCarloConfig {
            seed: Some(11),
            workers: Some(4),
            chunk_size: 100,
            ..Default::default()
        });

        let a = single.run(&request(1_050), &PARAMS).unwrap();
        let b = many.run(&request(1_050), &PARAMS).unwrap();
        assert_eq!(a.scenarios, b.scenarios);
        assert_eq!(a.scenarios.len(), 1_050);
    }

    #[test]
    fn test_injected_rng() {
        let sim = MonteCarloSimulator::default();
        let mut rng_a = StdRng::seed_from_u64(99);
        let mut rng_b = StdRng::seed_from_u64(99);
        let token = CancelToken::new();

        let a = sim.run_with_rng(&request(500), &PARAMS, &mut rng_a, &token).unwrap();
        let b = sim.run_with_rng(&request(500), &PARAMS, &mut rng_b, &token).unwrap();
        assert_eq!(a.scenarios, b.scenarios);
    }

    #[test]
    fn test_mean_close_to_gbm_expectation() {
        let params = GbmParameters {
            drift: 0.001,
            volatility: 0.02,
        };
        let result = seeded(2024).run(&request(20_000), &params).unwrap();
        // E[S_D] = S₀·exp(μ·D/252)
        let expected = 100.0 * (0.001 * 30.0 / 252.0_f64).exp();
        assert!((result.expected_price - expected).abs() < 0.05);
    }

    #[test]
    fn test_log_terminal_spread_scales_with_horizon() {
        let params = GbmParameters {
            drift: 0.0,
            volatility: 0.02,
        };
        for days in [1_u32, 30] {
            let req = SimulationRequest {
                horizon_days: days,
                ..request(20_000)
            };
            let result = seeded(31).run(&req, &params).unwrap();

            let logs: Vec<f64> = result.scenarios.iter().map(|p| (p / 100.0).ln()).collect();
            let n = logs.len() as f64;
            let mean = logs.iter().sum::<f64>() / n;
            let sd = (logs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt();

            // σ·√(D/252)
            let expected = 0.02 * (days as f64 / 252.0).sqrt();
            assert!((sd - expected).abs() < 0.03 * expected, "days {}: sd {}", days, sd);
        }
    }

    #[test]
    fn test_single_simulation() {
        let result = seeded(3).run(&request(1), &PARAMS).unwrap();
        assert_eq!(result.scenarios.len(), 1);
        assert_eq!(result.ci95.0, result.ci95.1);
    }

    #[test]
    fn test_percentile() {
        let result = seeded(5).run(&request(1_000), &PARAMS).unwrap();
        assert_eq!(result.percentile(0.0).unwrap(), result.worst_case);
        assert_eq!(result.percentile(1.0).unwrap(), result.best_case);
        assert_eq!(result.percentile(0.025).unwrap(), result.ci95.0);
        assert!(result.percentile(1.5).is_err());
    }

    #[test]
    fn test_invalid_requests() {
        let sim = seeded(1);
        let mut bad = request(0);
        assert!(matches!(
            sim.run(&bad, &PARAMS),
            Err(AnalyticsError::InvalidParameters(_))
        ));

        bad = request(10);
        bad.horizon_days = 0;
        assert!(sim.run(&bad, &PARAMS).is_err());

        bad = request(10);
        bad.initial_price = 0.0;
        assert!(sim.run(&bad, &PARAMS).is_err());

        let negative_vol = GbmParameters {
            drift: 0.0,
            volatility: -0.1,
        };
        assert!(sim.run(&request(10), &negative_vol).is_err());
    }

    #[test]
    fn test_cancelled_before_start() {
        let sim = seeded(1);
        let token = CancelToken::new();
        token.cancel();

        let mut rng = StdRng::seed_from_u64(1);
        let result = sim.run_with_rng(&request(10_000), &PARAMS, &mut rng, &token);
        assert!(matches!(
            result,
            Err(AnalyticsError::Cancelled {
                completed: 0,
                requested: 10_000
            })
        ));
    }

    #[test]
    fn test_timeout() {
        let sim = MonteCarloSimulator::new(MonteCarloConfig {
            seed: Some(1),
            timeout_ms: Some(0),
            ..Default::default()
        });

        let result = sim.run(&request(10_000), &PARAMS);
        assert!(matches!(
            result,
            Err(AnalyticsError::Timeout {
                requested: 10_000,
                ..
            })
        ));
    }

    #[test]
    fn test_parameters_from_returns() {
        let returns = ReturnSeries::from_closes(&[100.0, 101.0, 100.5, 102.0, 101.0]).unwrap();
        let params = GbmParameters::from_returns(&returns).unwrap();
        assert_eq!(params.drift, returns.mean());
        assert_eq!(params.volatility, returns.std_dev().unwrap());
    }
}
