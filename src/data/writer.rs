//! CSV writers for frontier, optimised-portfolio, and path-block outputs.

use std::path::{Path, PathBuf};

use csv::Writer;

use crate::core::{EngineError, Result};
use crate::mc::PathBlock;
use crate::optimise::{EfficientFrontier, OptimisationResult};

/// Writes `Return,Volatility,SharpeRatio` rows, one per frontier point.
pub fn write_efficient_frontier(path: &Path, frontier: &EfficientFrontier) -> Result<()> {
    let mut writer = open_writer(path)?;
    writer
        .write_record(["Return", "Volatility", "SharpeRatio"])
        .map_err(|e| write_error(path, e))?;

    for (ret, vol) in frontier.returns.iter().zip(&frontier.volatilities) {
        let sharpe = ret / vol;
        writer
            .write_record([format_f64(*ret), format_f64(*vol), format_f64(sharpe)])
            .map_err(|e| write_error(path, e))?;
    }

    writer.flush().map_err(|e| EngineError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Writes one labelled row per optimised portfolio, with a weight column
/// per ticker:
///
/// `PortfolioType,ExpectedReturn,Volatility,SharpeRatio,Weight_<T1>,...`
pub fn write_optimised_portfolios(
    path: &Path,
    tickers: &[String],
    portfolios: &[(&str, &OptimisationResult)],
) -> Result<()> {
    let mut writer = open_writer(path)?;

    let mut header = vec![
        "PortfolioType".to_string(),
        "ExpectedReturn".to_string(),
        "Volatility".to_string(),
        "SharpeRatio".to_string(),
    ];
    header.extend(tickers.iter().map(|t| format!("Weight_{t}")));
    writer
        .write_record(&header)
        .map_err(|e| write_error(path, e))?;

    for (label, result) in portfolios {
        if result.weights.len() != tickers.len() {
            return Err(EngineError::DimensionMismatch(
                "portfolio weight count must match the ticker count",
            ));
        }
        let mut row = vec![
            (*label).to_string(),
            format_f64(result.expected_return),
            format_f64(result.volatility),
            format_f64(result.sharpe_ratio),
        ];
        row.extend(result.weights.iter().map(|w| format_f64(*w)));
        writer.write_record(&row).map_err(|e| write_error(path, e))?;
    }

    writer.flush().map_err(|e| EngineError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Writes one row per simulated path, `block_size` comma-separated values,
/// no header.
pub fn write_path_block(path: &Path, block: &PathBlock) -> Result<()> {
    let mut writer = open_writer(path)?;
    for sim_path in block.paths() {
        let row: Vec<String> = sim_path.iter().map(|v| format_f64(*v)).collect();
        writer.write_record(&row).map_err(|e| write_error(path, e))?;
    }
    writer.flush().map_err(|e| EngineError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn open_writer(path: &Path) -> Result<Writer<std::fs::File>> {
    Writer::from_path(path).map_err(|e| EngineError::Io {
        path: path.to_path_buf(),
        reason: format!("could not create file: {e}"),
    })
}

fn write_error(path: &Path, error: csv::Error) -> EngineError {
    EngineError::Io {
        path: PathBuf::from(path),
        reason: error.to_string(),
    }
}

fn format_f64(value: f64) -> String {
    // Enough digits to round-trip a double through text.
    format!("{value:.17e}")
}
