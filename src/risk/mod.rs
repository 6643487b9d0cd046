//! Historical portfolio risk metrics.

pub mod metrics;
pub mod portfolio;

pub use metrics::{
    historical_cvar, historical_var, mean_segment_return, sharpe_ratio, volatility,
};
pub use portfolio::Portfolio;
