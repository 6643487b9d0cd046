//! Monte-Carlo simulation of GBM return and price paths.

pub mod simulation;

pub use simulation::{MonteCarloEngine, PathBlock, SimulationConfig};
