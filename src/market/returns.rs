//! Price histories and the daily return-matrix builder.
//!
//! Alignment policy: matrices are aligned to the shortest common history
//! across assets, by position within each asset's own series rather than by
//! calendar-date intersection. Assets whose histories start on different
//! dates therefore contribute observations from different calendar days to
//! the same row; intersecting date sets is the stricter alternative and is
//! deliberately not applied here.

use chrono::NaiveDate;

use crate::core::{EngineError, Result};

/// One asset's date-ordered price history.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    ticker: String,
    points: Vec<(NaiveDate, f64)>,
}

impl PriceSeries {
    /// Builds a series from unordered observations.
    ///
    /// Points are sorted ascending by date; duplicate dates collapse to the
    /// last value supplied.
    pub fn new(ticker: impl Into<String>, mut points: Vec<(NaiveDate, f64)>) -> Self {
        points.sort_by_key(|(date, _)| *date);
        points.dedup_by(|next, prev| {
            if next.0 == prev.0 {
                prev.1 = next.1;
                true
            } else {
                false
            }
        });
        Self {
            ticker: ticker.into(),
            points,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[(NaiveDate, f64)] {
        &self.points
    }

    /// Prices oldest-first.
    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|(_, price)| *price)
    }
}

/// Daily simple returns, shape `T x N`, oldest row first.
///
/// `r[t][i] = (P[t+1][i] - P[t][i]) / P[t][i]`, with 0 where the previous
/// price is zero.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimpleReturns {
    rows: Vec<Vec<f64>>,
}

/// Daily log returns, shape `T x N`, oldest row first.
///
/// `l[t][i] = ln(P[t+1][i] / P[t][i])`, with NaN where either price is
/// non-positive.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LogReturns {
    rows: Vec<Vec<f64>>,
}

macro_rules! returns_matrix_impl {
    ($name:ident) => {
        impl $name {
            /// Builds a matrix from pre-computed rows.
            ///
            /// # Errors
            /// `DimensionMismatch` when the rows are ragged.
            pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
                if let Some(first) = rows.first() {
                    let width = first.len();
                    if rows.iter().any(|row| row.len() != width) {
                        return Err(EngineError::DimensionMismatch(
                            "return-matrix rows must all have the same width",
                        ));
                    }
                }
                Ok(Self { rows })
            }

            /// Number of return observations per asset.
            pub fn num_periods(&self) -> usize {
                self.rows.len()
            }

            /// Number of assets (columns).
            pub fn num_assets(&self) -> usize {
                self.rows.first().map_or(0, Vec::len)
            }

            /// Observation rows, oldest first.
            pub fn rows(&self) -> &[Vec<f64>] {
                &self.rows
            }

            /// One asset's return column, oldest first.
            pub fn column(&self, asset: usize) -> Vec<f64> {
                self.rows.iter().map(|row| row[asset]).collect()
            }
        }
    };
}

returns_matrix_impl!(SimpleReturns);
returns_matrix_impl!(LogReturns);

/// Builds the simple- and log-return matrices for a set of price histories.
///
/// The row count `T` is the shortest history length minus one, taken over
/// the assets with at least two prices; assets with fewer than two prices
/// contribute an all-zero column in both matrices. Iteration runs from each
/// asset's second price onward, stopping after `T` rows.
pub fn returns_matrices(series: &[PriceSeries]) -> (SimpleReturns, LogReturns) {
    let num_assets = series.len();
    let num_rows = series
        .iter()
        .filter(|s| s.len() >= 2)
        .map(|s| s.len() - 1)
        .min()
        .unwrap_or(0);

    if num_assets == 0 || num_rows == 0 {
        return (SimpleReturns::default(), LogReturns::default());
    }

    let mut simple = vec![vec![0.0_f64; num_assets]; num_rows];
    let mut log = vec![vec![0.0_f64; num_assets]; num_rows];

    for (col, asset) in series.iter().enumerate() {
        if asset.len() < 2 {
            continue;
        }
        let prices: Vec<f64> = asset.prices().collect();
        for (row, window) in prices.windows(2).take(num_rows).enumerate() {
            let (prev, curr) = (window[0], window[1]);

            simple[row][col] = if prev == 0.0 {
                0.0
            } else {
                (curr - prev) / prev
            };

            log[row][col] = if prev <= 0.0 || curr <= 0.0 {
                f64::NAN
            } else {
                (curr / prev).ln()
            };
        }
    }

    (SimpleReturns { rows: simple }, LogReturns { rows: log })
}
