//! CSV ingest and output for price histories and analysis results.

pub mod loader;
pub mod writer;

pub use loader::{
    load_portfolio_selection, load_price_series, load_price_series_batch, SelectionEntry,
};
pub use writer::{write_efficient_frontier, write_optimised_portfolios, write_path_block};
