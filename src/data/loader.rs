//! CSV price-history ingest.
//!
//! Price files follow a three-line preamble:
//!
//! ```text
//! Price,...                 (discarded)
//! Ticker,NVDA
//! Date,Close
//! 2024-01-02,481.68
//! ...
//! ```
//!
//! Malformed files fail with [`EngineError::FileFormat`] carrying the path
//! and a reason. Batch loading is the one place per-item errors are
//! tolerated: a failing file is logged and skipped so one bad download does
//! not sink the whole universe.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use tracing::warn;

use crate::core::{EngineError, Result};
use crate::market::returns::PriceSeries;

/// One row of a portfolio-selection file.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionEntry {
    pub isin: String,
    pub ticker: String,
    pub weight: f64,
}

/// Loads one asset's price history and verifies the embedded ticker.
///
/// # Errors
/// `FileFormat` for a missing preamble line, a ticker mismatch, or an
/// unparseable data row; `Io` when the file cannot be opened.
pub fn load_price_series(path: &Path, expected_ticker: &str) -> Result<PriceSeries> {
    let file = File::open(path).map_err(|e| EngineError::Io {
        path: path.to_path_buf(),
        reason: format!("could not open file: {e}"),
    })?;

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut records = reader.records();
    let mut next_record = |missing: &str| -> Result<StringRecord> {
        match records.next() {
            Some(Ok(record)) => Ok(record),
            Some(Err(e)) => Err(format_error(path, format!("unreadable line: {e}"))),
            None => Err(format_error(path, missing.to_string())),
        }
    };

    // Header line, content discarded.
    next_record("missing header line")?;

    let ticker_line = next_record("missing ticker line")?;
    match ticker_line.get(0) {
        Some("Ticker") => {}
        Some(other) => {
            return Err(format_error(
                path,
                format!("expected 'Ticker' line but got: {other}"),
            ))
        }
        None => return Err(format_error(path, "missing ticker line".to_string())),
    }
    let embedded = ticker_line.get(1).unwrap_or_default();
    if embedded != expected_ticker {
        return Err(format_error(
            path,
            format!("ticker '{embedded}' does not match requested '{expected_ticker}'"),
        ));
    }

    // `Date,<column header>` line, content discarded.
    next_record("missing date header line")?;

    let mut points = Vec::new();
    for (index, record) in records.enumerate() {
        let line = index + 4;
        let record = record
            .map_err(|e| format_error(path, format!("unreadable line {line}: {e}")))?;
        if record.iter().all(str::is_empty) {
            continue;
        }

        let date_field = record
            .get(0)
            .ok_or_else(|| format_error(path, format!("line {line}: missing date field")))?;
        let price_field = record
            .get(1)
            .ok_or_else(|| format_error(path, format!("line {line}: missing price field")))?;

        let date = NaiveDate::parse_from_str(date_field, "%Y-%m-%d").map_err(|e| {
            format_error(path, format!("line {line}: bad date '{date_field}': {e}"))
        })?;
        let price: f64 = price_field.parse().map_err(|e| {
            format_error(path, format!("line {line}: bad price '{price_field}': {e}"))
        })?;

        points.push((date, price));
    }

    Ok(PriceSeries::new(expected_ticker, points))
}

/// Loads `<dir>/<TICKER>.csv` for every ticker, logging and skipping
/// files that fail to parse.
pub fn load_price_series_batch(dir: &Path, tickers: &[String]) -> Vec<PriceSeries> {
    let mut series = Vec::with_capacity(tickers.len());
    for ticker in tickers {
        let path = dir.join(format!("{ticker}.csv"));
        match load_price_series(&path, ticker) {
            Ok(loaded) => series.push(loaded),
            Err(error) => warn!(%ticker, %error, "skipping price file"),
        }
    }
    series
}

/// Loads a portfolio-selection file: one header row, then
/// `ISIN,TICKER,WEIGHT` rows.
///
/// # Errors
/// `FileFormat` for missing fields or an unparseable weight; `Io` when the
/// file cannot be opened.
pub fn load_portfolio_selection(path: &Path) -> Result<Vec<SelectionEntry>> {
    let file = File::open(path).map_err(|e| EngineError::Io {
        path: path.to_path_buf(),
        reason: format!("could not open file: {e}"),
    })?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let mut entries = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let line = index + 2;
        let record = record
            .map_err(|e| format_error(path, format!("unreadable line {line}: {e}")))?;
        if record.iter().all(str::is_empty) {
            continue;
        }

        let field = |i: usize, name: &str| -> Result<String> {
            record
                .get(i)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .ok_or_else(|| format_error(path, format!("line {line}: missing {name}")))
        };

        let isin = field(0, "ISIN")?;
        let ticker = field(1, "ticker")?;
        let weight_field = field(2, "weight")?;
        let weight: f64 = weight_field.parse().map_err(|e| {
            format_error(path, format!("line {line}: bad weight '{weight_field}': {e}"))
        })?;

        entries.push(SelectionEntry {
            isin,
            ticker,
            weight,
        });
    }

    Ok(entries)
}

fn format_error(path: &Path, reason: String) -> EngineError {
    EngineError::FileFormat {
        path: PathBuf::from(path),
        reason,
    }
}
