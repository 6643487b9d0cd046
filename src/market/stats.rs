//! Per-asset moments and the annualised covariance matrix.
//!
//! Daily log returns are annualised with the 252 trading-day convention:
//! means scale by 252 and standard deviations by sqrt(252). Covariance
//! entries scale by 252. NaN observations (from non-positive prices)
//! propagate into the statistics rather than being filtered.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::core::{EngineError, Result};
use crate::market::returns::LogReturns;
use crate::math;

/// Trading days per year used for annualisation.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Per-asset location/scale pair, daily or annualised depending on how it
/// was computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssetStats {
    pub mean: f64,
    pub std_dev: f64,
}

/// Sample mean and unbiased standard deviation of one return series.
pub fn series_stats(values: &[f64]) -> AssetStats {
    AssetStats {
        mean: math::mean(values),
        std_dev: math::sample_std_dev(values),
    }
}

/// Per-asset mean and sample standard deviation of the log-return columns.
///
/// With `annualise`, means scale by 252 and standard deviations by
/// sqrt(252).
pub fn asset_stats(log_returns: &LogReturns, annualise: bool) -> Vec<AssetStats> {
    (0..log_returns.num_assets())
        .map(|asset| {
            let column = log_returns.column(asset);
            let mut stats = series_stats(&column);
            if annualise {
                stats.mean *= TRADING_DAYS_PER_YEAR;
                stats.std_dev *= TRADING_DAYS_PER_YEAR.sqrt();
            }
            stats
        })
        .collect()
}

/// Weighted portfolio log-return series, one entry per observation row.
///
/// # Errors
/// `DimensionMismatch` when the weight count differs from the asset count.
pub fn weighted_log_returns(log_returns: &LogReturns, weights: &[f64]) -> Result<Vec<f64>> {
    if weights.len() != log_returns.num_assets() {
        return Err(EngineError::DimensionMismatch(
            "weight count must match the return-matrix asset count",
        ));
    }
    Ok(log_returns
        .rows()
        .iter()
        .map(|row| row.iter().zip(weights).map(|(r, w)| r * w).sum())
        .collect())
}

/// Annualised covariance matrix of multi-asset log returns.
///
/// Symmetric by construction; only the upper triangle is computed and the
/// lower is mirrored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CovarianceMatrix {
    entries: Vec<Vec<f64>>,
}

impl CovarianceMatrix {
    /// Wraps a pre-computed square matrix.
    ///
    /// # Errors
    /// `DimensionMismatch` when the matrix is not square.
    pub fn from_rows(entries: Vec<Vec<f64>>) -> Result<Self> {
        let n = entries.len();
        if entries.iter().any(|row| row.len() != n) {
            return Err(EngineError::DimensionMismatch(
                "covariance matrix must be square",
            ));
        }
        Ok(Self { entries })
    }

    /// Matrix order (number of assets).
    pub fn n(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[Vec<f64>] {
        &self.entries
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.entries[i][j]
    }

    /// Lower-triangular Cholesky factor `L` with `L * L^T` equal to this
    /// matrix.
    ///
    /// # Errors
    /// `CovarianceNotPsd` when the matrix is not positive-definite. No
    /// automatic regularisation is applied; callers may add a small
    /// diagonal shift upstream and retry.
    pub fn cholesky(&self) -> Result<CholeskyFactor> {
        let n = self.n();
        let data: Vec<f64> = self.entries.iter().flatten().copied().collect();
        let matrix = DMatrix::from_row_slice(n, n, &data);
        let factor = matrix.cholesky().ok_or(EngineError::CovarianceNotPsd)?;

        let l = factor.l();
        let mut rows = vec![vec![0.0_f64; n]; n];
        for i in 0..n {
            for j in 0..=i {
                rows[i][j] = l[(i, j)];
            }
        }
        Ok(CholeskyFactor { rows })
    }
}

/// Lower-triangular factor of a positive-definite covariance matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct CholeskyFactor {
    rows: Vec<Vec<f64>>,
}

impl CholeskyFactor {
    pub fn n(&self) -> usize {
        self.rows.len()
    }

    /// Rows of `L`; entries above the diagonal are zero.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.rows[i][j]
    }
}

/// Annualised (x252) covariance of the log-return columns.
///
/// # Errors
/// `InsufficientData` when fewer than two observation rows are available.
pub fn covariance(log_returns: &LogReturns) -> Result<CovarianceMatrix> {
    let periods = log_returns.num_periods();
    let assets = log_returns.num_assets();
    if periods < 2 {
        return Err(EngineError::InsufficientData(
            "covariance needs at least two return observations",
        ));
    }

    let rows = log_returns.rows();
    let means: Vec<f64> = (0..assets)
        .map(|asset| rows.iter().map(|row| row[asset]).sum::<f64>() / periods as f64)
        .collect();

    let mut entries = vec![vec![0.0_f64; assets]; assets];
    for i in 0..assets {
        for j in i..assets {
            let mut sum = 0.0;
            for row in rows {
                sum += (row[i] - means[i]) * (row[j] - means[j]);
            }
            let value = sum / (periods as f64 - 1.0) * TRADING_DAYS_PER_YEAR;
            entries[i][j] = value;
            entries[j][i] = value;
        }
    }

    Ok(CovarianceMatrix { entries })
}
