//! Closed-form mean-variance optimisation.
//!
//! References:
//! - Markowitz (1952), *Portfolio Selection*.
//! - Merton (1972), analytic derivation of the efficient frontier.
//!
//! All solvers work under the single budget constraint `1^T w = 1` (plus a
//! fixed expected-return constraint for the Markowitz target problem).
//! Short sales are allowed; weights may be negative. The SPD solves go
//! through a Cholesky factorisation, and the indefinite KKT system through
//! column-pivoted QR for robustness on near-degenerate inputs.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::core::{EngineError, Result};
use crate::market::stats::CovarianceMatrix;

const DEGENERACY_TOL: f64 = 1.0e-10;
const RENORMALISE_TOL: f64 = 1.0e-6;

/// A single optimised portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimisationResult {
    pub weights: Vec<f64>,
    pub expected_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
}

/// A sampled efficient frontier with the indices of its max-Sharpe and
/// min-volatility points (first occurrence wins; `None` only for an empty
/// frontier, which the constructor never produces).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficientFrontier {
    pub returns: Vec<f64>,
    pub volatilities: Vec<f64>,
    pub weights: Vec<Vec<f64>>,
    pub max_sharpe_index: Option<usize>,
    pub min_vol_index: Option<usize>,
}

impl EfficientFrontier {
    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }
}

/// Quadratic form `w^T Sigma w`.
///
/// # Errors
/// `DimensionMismatch` when the weight count differs from the matrix order.
pub fn portfolio_variance(weights: &[f64], cov: &CovarianceMatrix) -> Result<f64> {
    if weights.len() != cov.n() {
        return Err(EngineError::DimensionMismatch(
            "weight count must match the covariance order",
        ));
    }
    let mut variance = 0.0;
    for (i, &wi) in weights.iter().enumerate() {
        for (j, &wj) in weights.iter().enumerate() {
            variance += wi * wj * cov.get(i, j);
        }
    }
    Ok(variance)
}

/// Dot product `w^T mu`.
///
/// # Errors
/// `DimensionMismatch` when the slices differ in length.
pub fn portfolio_return(weights: &[f64], expected_returns: &[f64]) -> Result<f64> {
    if weights.len() != expected_returns.len() {
        return Err(EngineError::DimensionMismatch(
            "weight and expected-return counts must match",
        ));
    }
    Ok(weights
        .iter()
        .zip(expected_returns)
        .map(|(w, mu)| w * mu)
        .sum())
}

/// Global minimum-variance portfolio: `w = Sigma^-1 1 / (1^T Sigma^-1 1)`.
///
/// # Errors
/// - `DimensionMismatch` for inconsistent shapes.
/// - `CovarianceNotPsd` when the Cholesky factorisation fails.
/// - `DegenerateSystem` when `1^T Sigma^-1 1` is below tolerance.
pub fn minimise_volatility(
    cov: &CovarianceMatrix,
    expected_returns: &[f64],
) -> Result<OptimisationResult> {
    let (sigma, mu) = checked_inputs(cov, expected_returns)?;
    let n = cov.n();

    let chol = sigma
        .clone()
        .cholesky()
        .ok_or(EngineError::CovarianceNotPsd)?;
    let ones = DVector::from_element(n, 1.0);
    let sigma_inv_ones = chol.solve(&ones);

    let denominator = ones.dot(&sigma_inv_ones);
    if denominator.abs() < DEGENERACY_TOL {
        return Err(EngineError::DegenerateSystem(
            "1^T Sigma^-1 1 is numerically zero",
        ));
    }

    let w = sigma_inv_ones / denominator;
    Ok(result_from_weights(&w, &sigma, &mu, 0.0))
}

/// Tangency portfolio: `w ~ Sigma^-1 (mu - rf 1)`, normalised to sum one.
///
/// A final renormalisation corrects accumulated round-off when the weight
/// sum has drifted more than 1e-6 from one.
///
/// # Errors
/// - `DimensionMismatch` for inconsistent shapes.
/// - `CovarianceNotPsd` when the Cholesky factorisation fails.
/// - `DegenerateSystem` when every excess return is zero or the raw weights
///   sum to zero.
pub fn maximise_sharpe(
    cov: &CovarianceMatrix,
    expected_returns: &[f64],
    risk_free_rate: f64,
) -> Result<OptimisationResult> {
    let (sigma, mu) = checked_inputs(cov, expected_returns)?;

    let chol = sigma
        .clone()
        .cholesky()
        .ok_or(EngineError::CovarianceNotPsd)?;
    let excess = mu.map(|m| m - risk_free_rate);
    if excess.norm() < DEGENERACY_TOL {
        return Err(EngineError::DegenerateSystem(
            "all excess returns are numerically zero",
        ));
    }

    let raw = chol.solve(&excess);
    let raw_sum = raw.sum();
    if raw_sum.abs() < DEGENERACY_TOL {
        return Err(EngineError::DegenerateSystem(
            "raw tangency weights sum to zero",
        ));
    }

    let mut w = raw / raw_sum;
    let drift = w.sum();
    if (drift - 1.0).abs() > RENORMALISE_TOL {
        w /= drift;
    }

    Ok(result_from_weights(&w, &sigma, &mu, risk_free_rate))
}

/// Markowitz portfolio with a fixed expected return.
///
/// Solves the KKT system
///
/// ```text
/// [ 2 Sigma  mu  1 ] [ w ]   [ 0      ]
/// [ mu^T     0   0 ] [ l ] = [ target ]
/// [ 1^T      0   0 ] [ g ]   [ 1      ]
/// ```
///
/// by column-pivoted QR.
///
/// # Errors
/// - `DimensionMismatch` for inconsistent shapes.
/// - `DegenerateSystem` when the KKT matrix is singular.
pub fn optimise_target_return(
    cov: &CovarianceMatrix,
    expected_returns: &[f64],
    target_return: f64,
) -> Result<OptimisationResult> {
    let (sigma, mu) = checked_inputs(cov, expected_returns)?;
    let n = cov.n();

    let mut kkt = DMatrix::zeros(n + 2, n + 2);
    for i in 0..n {
        for j in 0..n {
            kkt[(i, j)] = 2.0 * sigma[(i, j)];
        }
        kkt[(i, n)] = mu[i];
        kkt[(i, n + 1)] = 1.0;
        kkt[(n, i)] = mu[i];
        kkt[(n + 1, i)] = 1.0;
    }

    let mut rhs = DVector::zeros(n + 2);
    rhs[n] = target_return;
    rhs[n + 1] = 1.0;

    let solution = kkt
        .col_piv_qr()
        .solve(&rhs)
        .ok_or(EngineError::DegenerateSystem("KKT system is singular"))?;
    let weights: Vec<f64> = solution.rows(0, n).iter().copied().collect();

    let w = DVector::from_column_slice(&weights);
    let variance = w.dot(&(&sigma * &w));
    let volatility = variance.max(0.0).sqrt();

    Ok(OptimisationResult {
        weights,
        expected_return: target_return,
        volatility,
        sharpe_ratio: target_return / volatility,
    })
}

/// Samples the efficient frontier at `points` equally spaced target returns
/// spanning `[min(mu), max(mu)]`.
///
/// # Errors
/// - `InvalidInput` when fewer than two points are requested or the return
///   vector is empty.
/// - Any error from the per-point target-return solve.
pub fn efficient_frontier(
    cov: &CovarianceMatrix,
    expected_returns: &[f64],
    points: usize,
) -> Result<EfficientFrontier> {
    if points < 2 {
        return Err(EngineError::InvalidInput(
            "frontier needs at least two points",
        ));
    }
    if expected_returns.is_empty() {
        return Err(EngineError::InvalidInput(
            "frontier needs at least one asset",
        ));
    }

    let min_return = expected_returns.iter().copied().fold(f64::INFINITY, f64::min);
    let max_return = expected_returns
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);

    let mut frontier = EfficientFrontier {
        returns: Vec::with_capacity(points),
        volatilities: Vec::with_capacity(points),
        weights: Vec::with_capacity(points),
        max_sharpe_index: None,
        min_vol_index: None,
    };

    let mut best_sharpe = f64::NEG_INFINITY;
    let mut best_vol = f64::INFINITY;

    for k in 0..points {
        let target =
            min_return + k as f64 * (max_return - min_return) / (points as f64 - 1.0);
        let point = optimise_target_return(cov, expected_returns, target)?;

        if point.sharpe_ratio > best_sharpe {
            best_sharpe = point.sharpe_ratio;
            frontier.max_sharpe_index = Some(k);
        }
        if point.volatility < best_vol {
            best_vol = point.volatility;
            frontier.min_vol_index = Some(k);
        }

        frontier.returns.push(point.expected_return);
        frontier.volatilities.push(point.volatility);
        frontier.weights.push(point.weights);
    }

    Ok(frontier)
}

fn checked_inputs(
    cov: &CovarianceMatrix,
    expected_returns: &[f64],
) -> Result<(DMatrix<f64>, DVector<f64>)> {
    let n = cov.n();
    if n == 0 {
        return Err(EngineError::InvalidInput(
            "optimisation needs at least one asset",
        ));
    }
    if expected_returns.len() != n {
        return Err(EngineError::DimensionMismatch(
            "expected-return count must match the covariance order",
        ));
    }

    let data: Vec<f64> = cov.entries().iter().flatten().copied().collect();
    Ok((
        DMatrix::from_row_slice(n, n, &data),
        DVector::from_column_slice(expected_returns),
    ))
}

fn result_from_weights(
    w: &DVector<f64>,
    sigma: &DMatrix<f64>,
    mu: &DVector<f64>,
    risk_free_rate: f64,
) -> OptimisationResult {
    let variance = w.dot(&(sigma * w));
    let volatility = variance.max(0.0).sqrt();
    let expected_return = w.dot(mu);

    OptimisationResult {
        weights: w.iter().copied().collect(),
        expected_return,
        volatility,
        sharpe_ratio: (expected_return - risk_free_rate) / volatility,
    }
}
