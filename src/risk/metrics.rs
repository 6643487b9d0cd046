//! Historical risk metrics over a daily portfolio-return series.
//!
//! Conventions:
//! - Returns are daily fractional changes; VaR and CVaR are reported as
//!   positive loss numbers.
//! - `volatility` uses the population denominator (N, not N-1). The
//!   per-asset statistics in [`crate::market::stats`] use the unbiased
//!   sample denominator; the mismatch is preserved for parity with the
//!   reference analytics and is worth knowing about when comparing the two.
//! - The Sharpe ratio assumes a zero risk-free rate and annualises with
//!   sqrt(252).

use crate::market::stats::TRADING_DAYS_PER_YEAR;
use crate::math;

/// Mean compounded return over contiguous segments of `window` days.
///
/// Each full segment compounds as `prod(1 + d) - 1`; a trailing partial
/// segment is kept. Returns 0 for an empty series or a zero window.
pub fn mean_segment_return(daily_returns: &[f64], window: usize) -> f64 {
    if window == 0 || daily_returns.is_empty() {
        return 0.0;
    }

    let mut segment_returns = Vec::with_capacity(daily_returns.len() / window + 1);
    let mut product = 1.0;
    let mut seen = 0usize;

    for &daily in daily_returns {
        product *= 1.0 + daily;
        seen += 1;
        if seen == window {
            segment_returns.push(product - 1.0);
            product = 1.0;
            seen = 0;
        }
    }
    if seen != 0 {
        segment_returns.push(product - 1.0);
    }

    math::mean(&segment_returns)
}

/// Population standard deviation of the daily series (denominator N).
pub fn volatility(daily_returns: &[f64]) -> f64 {
    if daily_returns.is_empty() {
        return 0.0;
    }
    let mean = math::mean(daily_returns);
    let mut sum = 0.0;
    for &x in daily_returns {
        let d = x - mean;
        sum += d * d;
    }
    (sum / daily_returns.len() as f64).sqrt()
}

/// Historical Value-at-Risk at `confidence`, as a positive loss number.
///
/// Sorts the series ascending and reads the `floor((1 - confidence) * N)`
/// order statistic. Returns 0 for an empty series.
///
/// # Panics
/// Panics when `confidence` is outside `[0, 1)`.
pub fn historical_var(daily_returns: &[f64], confidence: f64) -> f64 {
    let sorted = sorted_with_tail_index(daily_returns, confidence);
    match sorted {
        Some((values, k)) => -values[k],
        None => 0.0,
    }
}

/// Historical Conditional Value-at-Risk (expected shortfall) at
/// `confidence`: the negated mean of all observations at or below the VaR
/// threshold. Returns 0 for an empty series.
///
/// # Panics
/// Panics when `confidence` is outside `[0, 1)`.
pub fn historical_cvar(daily_returns: &[f64], confidence: f64) -> f64 {
    let Some((values, k)) = sorted_with_tail_index(daily_returns, confidence) else {
        return 0.0;
    };
    let threshold = values[k];

    let mut sum = 0.0;
    let mut count = 0usize;
    for &r in &values {
        if r <= threshold {
            sum += r;
            count += 1;
        }
    }
    -sum / count as f64
}

/// Annualised Sharpe ratio of the daily series with a zero risk-free rate.
///
/// A zero-volatility series has no defined ratio; 0 is returned.
pub fn sharpe_ratio(daily_returns: &[f64]) -> f64 {
    let vol = volatility(daily_returns);
    if vol == 0.0 {
        return 0.0;
    }
    mean_segment_return(daily_returns, 1) / vol * TRADING_DAYS_PER_YEAR.sqrt()
}

fn sorted_with_tail_index(daily_returns: &[f64], confidence: f64) -> Option<(Vec<f64>, usize)> {
    assert!(
        (0.0..1.0).contains(&confidence),
        "confidence must be in [0, 1)"
    );
    if daily_returns.is_empty() {
        return None;
    }

    let mut sorted = daily_returns.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    let k = (((1.0 - confidence) * n as f64) as usize).min(n - 1);
    Some((sorted, k))
}
