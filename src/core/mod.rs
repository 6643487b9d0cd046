//! Core result/error structures shared by every subsystem.

use std::path::PathBuf;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by the analytics, optimiser, and simulation APIs.
///
/// Precondition violations on programmer-facing invariants are asserted at
/// the call site; numerical and data failures come back through this enum so
/// callers can inspect and recover (for example by regularising a covariance
/// matrix and retrying the factorisation).
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Malformed input file; carries the offending path and a reason.
    FileFormat { path: PathBuf, reason: String },
    /// A filesystem read or write failed.
    Io { path: PathBuf, reason: String },
    /// Weights/tickers/covariance shapes disagree.
    DimensionMismatch(&'static str),
    /// Cholesky factorisation failed; the matrix is not positive-definite.
    CovarianceNotPsd,
    /// An optimiser denominator collapsed below tolerance.
    DegenerateSystem(&'static str),
    /// Too few observations for the requested statistic.
    InsufficientData(&'static str),
    /// Input validation error.
    InvalidInput(&'static str),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileFormat { path, reason } => {
                write!(f, "file format error in {}: {reason}", path.display())
            }
            Self::Io { path, reason } => write!(f, "io error on {}: {reason}", path.display()),
            Self::DimensionMismatch(msg) => write!(f, "dimension mismatch: {msg}"),
            Self::CovarianceNotPsd => {
                write!(f, "covariance matrix is not positive-definite")
            }
            Self::DegenerateSystem(msg) => write!(f, "degenerate system: {msg}"),
            Self::InsufficientData(msg) => write!(f, "insufficient data: {msg}"),
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
