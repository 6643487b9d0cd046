//! Price histories, return matrices, and multi-asset statistics.

pub mod returns;
pub mod stats;

pub use returns::{returns_matrices, LogReturns, PriceSeries, SimpleReturns};
pub use stats::{
    asset_stats, covariance, series_stats, weighted_log_returns, AssetStats, CholeskyFactor,
    CovarianceMatrix, TRADING_DAYS_PER_YEAR,
};
