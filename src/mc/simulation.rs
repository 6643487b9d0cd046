//! Parallel generation of GBM return paths and the price-path builder.
//!
//! References: Glasserman (2004), *Monte Carlo Methods in Financial
//! Engineering*, Ch. 3 and 4.
//!
//! The engine partitions the path range across workers; each worker owns a
//! seeded [`PcgNormal`] stream and writes to a disjoint slice of the output
//! buffer, so the generation loop needs no synchronisation. The only join
//! point is the end of each call. Within a path, daily increments are iid;
//! day `d + 1` never depends on day `d`.
//!
//! The multi-asset variant collapses the N-dimensional correlated Brownian
//! step to a single scalar draw per day: with `pos = (w o sigma) sqrt(dt)`
//! and lower Cholesky factor `L`, the row vector `pos^T L` lives in the
//! uncorrelated factor basis, so the per-step standard deviation is its
//! Euclidean norm and the daily portfolio return is
//! `N(drift_step, ||pos^T L||^2)` under the linear-Gaussian model.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::{EngineError, Result};
use crate::market::stats::{AssetStats, CholeskyFactor, TRADING_DAYS_PER_YEAR};
use crate::math::rng::{resolve_stream_seed, NormalSource, PcgNormal};

/// A block of simulated paths, laid out path-major: entries
/// `[p * block_size, (p + 1) * block_size)` form path `p`.
#[derive(Debug, Clone, PartialEq)]
pub struct PathBlock {
    values: Vec<f64>,
    block_size: usize,
}

impl PathBlock {
    fn zeroed(num_paths: usize, num_days: usize) -> Self {
        Self {
            values: vec![0.0; num_paths * num_days],
            block_size: num_days,
        }
    }

    /// Wraps pre-computed path-major values.
    ///
    /// # Errors
    /// `DimensionMismatch` when the value count is not a whole number of
    /// blocks.
    pub fn from_values(values: Vec<f64>, block_size: usize) -> Result<Self> {
        if block_size == 0 || values.len() % block_size != 0 {
            return Err(EngineError::DimensionMismatch(
                "path block length must be a multiple of the block size",
            ));
        }
        Ok(Self { values, block_size })
    }

    /// Flat path-major storage.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Days per path.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn num_paths(&self) -> usize {
        if self.block_size == 0 {
            0
        } else {
            self.values.len() / self.block_size
        }
    }

    /// One path's daily values.
    pub fn path(&self, path: usize) -> &[f64] {
        let start = path * self.block_size;
        &self.values[start..start + self.block_size]
    }

    /// Iterates paths in order.
    pub fn paths(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.values.chunks_exact(self.block_size.max(1))
    }
}

/// Per-call simulation parameters.
///
/// `seed: Some(s)` derives one deterministic sub-stream per worker;
/// `None` seeds every worker from OS entropy, so results differ across
/// runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub num_paths: usize,
    pub num_days: usize,
    /// Annual risk-free rate used as the drift when `ignore_asset_drift`
    /// is set.
    pub risk_free_rate: f64,
    /// Replace the weighted asset drift with the risk-free drift.
    pub ignore_asset_drift: bool,
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_paths: 1_000_000,
            num_days: 252,
            risk_free_rate: 0.04,
            ignore_asset_drift: false,
            seed: None,
        }
    }
}

/// Fork-join Monte-Carlo engine over hardware-sized worker chunks.
#[derive(Debug, Clone)]
pub struct MonteCarloEngine {
    workers: usize,
}

impl MonteCarloEngine {
    /// Engine sized to the machine's available parallelism.
    pub fn new() -> Self {
        let workers = std::thread::available_parallelism().map_or(1, |n| n.get());
        Self { workers }
    }

    /// Engine with an explicit worker count (also fixes the chunking, which
    /// makes seeded runs reproducible across machines).
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Daily GBM returns for a single asset with annual `drift` and
    /// `volatility`:
    ///
    /// `r = drift * dt + volatility * sqrt(dt) * Z`, `dt = 1/252`.
    ///
    /// # Errors
    /// `InvalidInput` when `num_days` is zero or a parameter is non-finite.
    pub fn generate_single_asset(
        &self,
        drift: f64,
        volatility: f64,
        config: &SimulationConfig,
    ) -> Result<PathBlock> {
        if !drift.is_finite() || !volatility.is_finite() {
            return Err(EngineError::InvalidInput(
                "drift and volatility must be finite",
            ));
        }
        let dt = 1.0 / TRADING_DAYS_PER_YEAR;
        self.generate_iid_steps(drift * dt, volatility * dt.sqrt(), config)
    }

    /// Daily portfolio returns for correlated multi-asset GBM, collapsed to
    /// one scalar draw per day (see the module docs).
    ///
    /// `asset_stats` carries the annualised per-asset `(mean, std_dev)`
    /// pairs; `cholesky` is the lower factor of the annualised covariance
    /// matrix. `dt = 1/252`, consistent with the 252-annualisation of both.
    ///
    /// # Errors
    /// - `DimensionMismatch` when stats, weights, and factor order
    ///   disagree.
    /// - `InvalidInput` when `num_days` is zero.
    pub fn generate_multi_asset(
        &self,
        cholesky: &CholeskyFactor,
        asset_stats: &[AssetStats],
        weights: &[f64],
        config: &SimulationConfig,
    ) -> Result<PathBlock> {
        let n = cholesky.n();
        if asset_stats.len() != n || weights.len() != n {
            return Err(EngineError::DimensionMismatch(
                "asset stats, weights, and cholesky order must match",
            ));
        }

        let dt = 1.0 / TRADING_DAYS_PER_YEAR;
        let drift_step = if config.ignore_asset_drift {
            config.risk_free_rate * dt
        } else {
            weights
                .iter()
                .zip(asset_stats)
                .map(|(w, stats)| w * stats.mean * dt)
                .sum()
        };

        // Weighted per-step stddev vector, then its image in the
        // uncorrelated factor basis.
        let pos: Vec<f64> = weights
            .iter()
            .zip(asset_stats)
            .map(|(w, stats)| w * stats.std_dev * dt.sqrt())
            .collect();

        let mut step_variance = 0.0;
        for factor in 0..n {
            let mut exposure = 0.0;
            for (i, pos_i) in pos.iter().enumerate().skip(factor) {
                exposure += pos_i * cholesky.get(i, factor);
            }
            step_variance += exposure * exposure;
        }
        let step_std = step_variance.sqrt();

        self.generate_iid_steps(drift_step, step_std, config)
    }

    /// Converts a block of daily returns into log-normal price paths:
    /// `S <- S * exp(r)` per day, resetting to `initial_price` between
    /// paths.
    pub fn build_price_paths(&self, returns: &PathBlock, initial_price: f64) -> PathBlock {
        let num_days = returns.block_size();
        let mut prices = PathBlock::zeroed(returns.num_paths(), num_days);
        if num_days == 0 {
            return prices;
        }

        let compound = |(out, path): (&mut [f64], &[f64])| {
            let mut spot = initial_price;
            for (cell, &step) in out.iter_mut().zip(path) {
                spot *= step.exp();
                *cell = spot;
            }
        };

        #[cfg(feature = "parallel")]
        prices
            .values
            .par_chunks_exact_mut(num_days)
            .zip(returns.values.par_chunks_exact(num_days))
            .for_each(compound);

        #[cfg(not(feature = "parallel"))]
        prices
            .values
            .chunks_exact_mut(num_days)
            .zip(returns.values.chunks_exact(num_days))
            .for_each(compound);

        prices
    }

    /// Fills a path block with iid `N(drift_step, std_step^2)` draws.
    ///
    /// The output buffer is allocated once and split into one disjoint
    /// slice per worker chunk; chunk `k` draws from stream `k`.
    fn generate_iid_steps(
        &self,
        drift_step: f64,
        std_step: f64,
        config: &SimulationConfig,
    ) -> Result<PathBlock> {
        if config.num_days == 0 {
            return Err(EngineError::InvalidInput("num_days must be positive"));
        }

        let mut block = PathBlock::zeroed(config.num_paths, config.num_days);
        let chunk_paths = split_paths(config.num_paths, self.workers);

        let mut slices: Vec<&mut [f64]> = Vec::with_capacity(chunk_paths.len());
        let mut rest = block.values.as_mut_slice();
        for &paths in &chunk_paths {
            let (head, tail) =
                std::mem::take(&mut rest).split_at_mut(paths * config.num_days);
            slices.push(head);
            rest = tail;
        }
        debug_assert!(rest.is_empty());

        let seed = config.seed;
        let fill = |(stream, slice): (usize, &mut [f64])| {
            let mut source = PcgNormal::seed_from_u64(resolve_stream_seed(seed, stream));
            for cell in slice.iter_mut() {
                *cell = drift_step + std_step * source.next_normal();
            }
        };

        #[cfg(feature = "parallel")]
        slices.into_par_iter().enumerate().for_each(fill);

        #[cfg(not(feature = "parallel"))]
        slices.into_iter().enumerate().for_each(fill);

        tracing::debug!(
            num_paths = config.num_paths,
            num_days = config.num_days,
            workers = chunk_paths.len(),
            "generated gbm return block"
        );
        Ok(block)
    }
}

impl Default for MonteCarloEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits `num_paths` into at most `workers` contiguous chunk sizes whose
/// sum is exactly `num_paths`; the first `num_paths % workers` chunks take
/// one extra path.
fn split_paths(num_paths: usize, workers: usize) -> Vec<usize> {
    let workers = workers.max(1);
    let base = num_paths / workers;
    let remainder = num_paths % workers;
    (0..workers)
        .map(|k| if k < remainder { base + 1 } else { base })
        .filter(|&paths| paths > 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn config(num_paths: usize, num_days: usize, seed: u64) -> SimulationConfig {
        SimulationConfig {
            num_paths,
            num_days,
            seed: Some(seed),
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn split_paths_partitions_exactly() {
        for (paths, workers) in [(10, 3), (7, 7), (5, 8), (1_000_000, 12), (0, 4)] {
            let chunks = split_paths(paths, workers);
            assert_eq!(chunks.iter().sum::<usize>(), paths);
            assert!(chunks.len() <= workers);
            assert!(chunks.iter().all(|&c| c > 0));
        }
    }

    #[test]
    fn path_block_layout_is_path_major() {
        let engine = MonteCarloEngine::with_workers(2);
        let block = engine
            .generate_single_asset(0.08, 0.2, &config(6, 4, 99))
            .unwrap();

        assert_eq!(block.num_paths(), 6);
        assert_eq!(block.block_size(), 4);
        assert_eq!(block.values().len(), 24);
        assert_eq!(block.path(2), &block.values()[8..12]);
        assert_eq!(block.paths().count(), 6);
    }

    #[test]
    fn zero_drift_and_volatility_produce_exact_zeros() {
        let engine = MonteCarloEngine::with_workers(4);
        let returns = engine
            .generate_single_asset(0.0, 0.0, &config(10, 5, 1))
            .unwrap();
        assert!(returns.values().iter().all(|&r| r == 0.0));

        let prices = engine.build_price_paths(&returns, 123.45);
        assert!(prices.values().iter().all(|&p| p == 123.45));
    }

    #[test]
    fn seeded_runs_reproduce_with_fixed_workers() {
        let engine = MonteCarloEngine::with_workers(3);
        let a = engine
            .generate_single_asset(0.05, 0.3, &config(100, 16, 42))
            .unwrap();
        let b = engine
            .generate_single_asset(0.05, 0.3, &config(100, 16, 42))
            .unwrap();
        assert_eq!(a, b);

        let c = engine
            .generate_single_asset(0.05, 0.3, &config(100, 16, 43))
            .unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn price_paths_compound_known_returns() {
        let returns = PathBlock {
            values: vec![0.0, 2.0_f64.ln(), -(2.0_f64.ln())],
            block_size: 3,
        };
        let engine = MonteCarloEngine::with_workers(1);
        let prices = engine.build_price_paths(&returns, 100.0);

        assert_relative_eq!(prices.values()[0], 100.0, epsilon = 1.0e-10);
        assert_relative_eq!(prices.values()[1], 200.0, epsilon = 1.0e-10);
        assert_relative_eq!(prices.values()[2], 100.0, epsilon = 1.0e-10);
    }

    #[test]
    fn multi_asset_checks_shapes() {
        let cov = crate::market::stats::CovarianceMatrix::from_rows(vec![
            vec![0.04, 0.0],
            vec![0.0, 0.09],
        ])
        .unwrap();
        let chol = cov.cholesky().unwrap();
        let stats = vec![AssetStats {
            mean: 0.08,
            std_dev: 0.2,
        }];

        let engine = MonteCarloEngine::with_workers(2);
        let err = engine
            .generate_multi_asset(&chol, &stats, &[1.0], &config(4, 4, 7))
            .unwrap_err();
        assert!(matches!(err, EngineError::DimensionMismatch(_)));
    }

    #[test]
    fn zero_days_is_rejected() {
        let engine = MonteCarloEngine::with_workers(1);
        let err = engine
            .generate_single_asset(0.05, 0.2, &config(10, 0, 7))
            .unwrap_err();
        assert_eq!(err, EngineError::InvalidInput("num_days must be positive"));
    }

    #[test]
    fn ignore_asset_drift_uses_the_risk_free_step() {
        let cov = crate::market::stats::CovarianceMatrix::from_rows(vec![vec![1.0e-30]]).unwrap();
        let chol = cov.cholesky().unwrap();

        // Zero per-asset stddev collapses the diffusion term entirely.
        let stats = [AssetStats {
            mean: 0.5,
            std_dev: 0.0,
        }];
        let mut cfg = config(3, 4, 11);
        cfg.ignore_asset_drift = true;
        cfg.risk_free_rate = 0.04;

        let engine = MonteCarloEngine::with_workers(1);
        let block = engine
            .generate_multi_asset(&chol, &stats, &[1.0], &cfg)
            .unwrap();

        let expected = 0.04 / 252.0;
        for &r in block.values() {
            assert_relative_eq!(r, expected, epsilon = 1.0e-12);
        }
    }
}
