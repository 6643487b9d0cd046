//! Shared numeric helpers for the statistics, risk, and simulation modules.

pub mod rng;

pub use rng::{resolve_stream_seed, stream_seed, NormalSource, PcgNormal};

/// Arithmetic mean; 0 for an empty slice.
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Unbiased sample variance (denominator `n - 1`); 0 for fewer than two
/// observations.
pub(crate) fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let mut sum = 0.0;
    for &x in values {
        let d = x - m;
        sum += d * d;
    }
    sum / (values.len() as f64 - 1.0)
}

/// Unbiased sample standard deviation.
pub(crate) fn sample_std_dev(values: &[f64]) -> f64 {
    sample_variance(values).max(0.0).sqrt()
}
