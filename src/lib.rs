//! Quantfolio is a portfolio risk-and-optimisation workbench: it turns
//! historical daily prices into return matrices and risk statistics,
//! computes closed-form mean-variance portfolios and the efficient
//! frontier, and simulates correlated multi-asset GBM return paths with a
//! parallel Monte-Carlo engine.
//!
//! The pipeline is strictly one-directional: ingest -> returns ->
//! statistics/covariance -> { historical metrics, optimiser, Cholesky ->
//! simulation } -> outputs. No component keeps cross-call state except the
//! simulation workers' own RNG streams.
//!
//! References used across modules:
//! - Markowitz (1952), *Portfolio Selection*; Merton (1972) for the
//!   analytic frontier.
//! - Sharpe (1966) for the reward-to-variability ratio.
//! - Glasserman (2004), *Monte Carlo Methods in Financial Engineering*.
//! - J.P. Morgan/Reuters, *RiskMetrics Technical Document* (1996), for the
//!   historical VaR/CVaR conventions.
//!
//! Numerical considerations:
//! - Covariance matrices are annualised (x252) and factorised without
//!   automatic regularisation; a failed Cholesky surfaces as
//!   [`core::EngineError::CovarianceNotPsd`] so callers can shift the
//!   diagonal and retry deliberately.
//! - The optimiser solves SPD systems through Cholesky and the indefinite
//!   Markowitz KKT system through column-pivoted QR.
//! - Simulation accuracy is sampling-driven; path count and the per-call
//!   seed control confidence and reproducibility.
//!
//! # Feature Flags
//! - `parallel` (default): Rayon-powered path generation; without it the
//!   engine fills the same chunks sequentially with identical results for
//!   a fixed worker count.
//!
//! # Quick Start
//! Build return matrices and risk statistics from price histories:
//! ```rust
//! use chrono::NaiveDate;
//! use quantfolio::market::{returns_matrices, PriceSeries};
//! use quantfolio::risk::Portfolio;
//!
//! let day = |d: u32| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
//! let nvda = PriceSeries::new(
//!     "NVDA",
//!     vec![(day(1), 481.0), (day(2), 475.0), (day(3), 480.0), (day(4), 492.0)],
//! );
//! let amd = PriceSeries::new(
//!     "AMD",
//!     vec![(day(1), 140.0), (day(2), 143.0), (day(3), 138.0), (day(4), 144.0)],
//! );
//!
//! let (simple, _log) = returns_matrices(&[nvda, amd]);
//! let portfolio = Portfolio::new(
//!     vec!["NVDA".to_string(), "AMD".to_string()],
//!     vec![0.6, 0.4],
//!     &simple,
//! )
//! .unwrap();
//! assert!(portfolio.volatility() > 0.0);
//! assert!(portfolio.historical_var(0.95) >= 0.0);
//! ```
//!
//! Solve for the minimum-variance portfolio:
//! ```rust
//! use quantfolio::market::CovarianceMatrix;
//! use quantfolio::optimise::minimise_volatility;
//!
//! let cov = CovarianceMatrix::from_rows(vec![
//!     vec![0.04, 0.0, 0.0],
//!     vec![0.0, 0.04, 0.0],
//!     vec![0.0, 0.0, 0.04],
//! ])
//! .unwrap();
//! let result = minimise_volatility(&cov, &[0.05, 0.07, 0.09]).unwrap();
//! for w in &result.weights {
//!     assert!((w - 1.0 / 3.0).abs() < 1.0e-9);
//! }
//! ```
//!
//! Simulate seeded GBM price paths:
//! ```rust
//! use quantfolio::mc::{MonteCarloEngine, SimulationConfig};
//!
//! let engine = MonteCarloEngine::with_workers(4);
//! let config = SimulationConfig {
//!     num_paths: 64,
//!     num_days: 5,
//!     seed: Some(7),
//!     ..SimulationConfig::default()
//! };
//! let returns = engine.generate_single_asset(0.08, 0.20, &config).unwrap();
//! let prices = engine.build_price_paths(&returns, 100.0);
//! assert_eq!(prices.num_paths(), 64);
//! assert!(prices.values().iter().all(|p| *p > 0.0));
//! ```

pub mod core;
pub mod data;
pub mod market;
pub mod math;
pub mod mc;
pub mod optimise;
pub mod risk;

/// Common imports for ergonomic usage.
pub mod prelude {
    pub use crate::core::{EngineError, Result};
    pub use crate::market::{
        asset_stats, covariance, returns_matrices, AssetStats, CholeskyFactor, CovarianceMatrix,
        LogReturns, PriceSeries, SimpleReturns,
    };
    pub use crate::mc::{MonteCarloEngine, PathBlock, SimulationConfig};
    pub use crate::optimise::{
        efficient_frontier, maximise_sharpe, minimise_volatility, optimise_target_return,
        EfficientFrontier, OptimisationResult,
    };
    pub use crate::risk::Portfolio;
}
