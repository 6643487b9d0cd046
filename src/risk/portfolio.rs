//! Portfolio container: normalised holdings plus the cached daily weighted
//! return series every historical metric reads from.

use crate::core::{EngineError, Result};
use crate::market::returns::SimpleReturns;
use crate::risk::metrics;

/// A set of holdings over named assets.
///
/// Weights are normalised to sum to one at construction, and the daily
/// weighted simple-return series is computed once and cached; metric calls
/// never re-derive it.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    tickers: Vec<String>,
    weights: Vec<f64>,
    daily_returns: Vec<f64>,
}

impl Portfolio {
    /// Builds a portfolio over the given return matrix.
    ///
    /// # Errors
    /// - `DimensionMismatch` when ticker, weight, and return-matrix asset
    ///   counts disagree.
    /// - `InvalidInput` when the raw weights do not sum to a positive total.
    pub fn new(
        tickers: Vec<String>,
        weights: Vec<f64>,
        simple_returns: &SimpleReturns,
    ) -> Result<Self> {
        if tickers.len() != weights.len() {
            return Err(EngineError::DimensionMismatch(
                "ticker and weight counts must match",
            ));
        }
        if simple_returns.num_assets() != tickers.len() {
            return Err(EngineError::DimensionMismatch(
                "return-matrix asset count must match the ticker count",
            ));
        }

        let total: f64 = weights.iter().sum();
        if !(total > 0.0) {
            return Err(EngineError::InvalidInput(
                "portfolio weights must sum to a positive total",
            ));
        }

        let weights: Vec<f64> = weights.iter().map(|w| w / total).collect();
        debug_assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1.0e-9);

        let daily_returns = simple_returns
            .rows()
            .iter()
            .map(|row| row.iter().zip(&weights).map(|(r, w)| r * w).sum())
            .collect();

        Ok(Self {
            tickers,
            weights,
            daily_returns,
        })
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Normalised weights, summing to one.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Weight for a ticker; 0 when the ticker is not held.
    pub fn weight(&self, ticker: &str) -> f64 {
        self.tickers
            .iter()
            .position(|t| t == ticker)
            .map_or(0.0, |i| self.weights[i])
    }

    /// Cached daily weighted simple-return series, oldest first.
    pub fn daily_returns(&self) -> &[f64] {
        &self.daily_returns
    }

    /// Mean compounded return over contiguous `window`-day segments.
    pub fn mean_segment_return(&self, window: usize) -> f64 {
        metrics::mean_segment_return(&self.daily_returns, window)
    }

    /// Mean daily return (a one-day segment window).
    pub fn mean_daily_return(&self) -> f64 {
        self.mean_segment_return(1)
    }

    /// Population standard deviation of the daily series.
    pub fn volatility(&self) -> f64 {
        metrics::volatility(&self.daily_returns)
    }

    /// Historical Value-at-Risk as a positive loss number.
    pub fn historical_var(&self, confidence: f64) -> f64 {
        metrics::historical_var(&self.daily_returns, confidence)
    }

    /// Historical Conditional Value-at-Risk as a positive loss number.
    pub fn historical_cvar(&self, confidence: f64) -> f64 {
        metrics::historical_cvar(&self.daily_returns, confidence)
    }

    /// Annualised Sharpe ratio with a zero risk-free rate.
    pub fn sharpe_ratio(&self) -> f64 {
        metrics::sharpe_ratio(&self.daily_returns)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn two_asset_returns() -> SimpleReturns {
        SimpleReturns::from_rows(vec![
            vec![0.02, -0.01],
            vec![0.01, 0.03],
            vec![-0.02, 0.00],
        ])
        .expect("rectangular rows")
    }

    fn tickers() -> Vec<String> {
        vec!["AAA".to_string(), "BBB".to_string()]
    }

    #[test]
    fn weights_normalise_and_the_series_is_cached() {
        let portfolio = Portfolio::new(tickers(), vec![3.0, 1.0], &two_asset_returns()).unwrap();

        assert_relative_eq!(portfolio.weights().iter().sum::<f64>(), 1.0, epsilon = 1.0e-12);
        assert_relative_eq!(portfolio.weight("AAA"), 0.75, epsilon = 1.0e-12);
        assert_eq!(portfolio.weight("ZZZ"), 0.0);

        let daily = portfolio.daily_returns();
        assert_eq!(daily.len(), 3);
        assert_relative_eq!(daily[0], 0.75 * 0.02 + 0.25 * -0.01, epsilon = 1.0e-12);
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        let err = Portfolio::new(tickers(), vec![1.0], &two_asset_returns()).unwrap_err();
        assert!(matches!(err, EngineError::DimensionMismatch(_)));

        let err =
            Portfolio::new(vec!["AAA".to_string()], vec![1.0], &two_asset_returns()).unwrap_err();
        assert!(matches!(err, EngineError::DimensionMismatch(_)));
    }

    #[test]
    fn non_positive_total_weight_is_rejected() {
        let err = Portfolio::new(tickers(), vec![0.0, 0.0], &two_asset_returns()).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidInput("portfolio weights must sum to a positive total")
        );
    }

    #[test]
    fn metric_methods_delegate_to_the_cached_series() {
        let portfolio = Portfolio::new(tickers(), vec![0.5, 0.5], &two_asset_returns()).unwrap();
        let daily = portfolio.daily_returns().to_vec();

        assert_relative_eq!(
            portfolio.volatility(),
            metrics::volatility(&daily),
            epsilon = 1.0e-15
        );
        assert_relative_eq!(
            portfolio.historical_var(0.95),
            metrics::historical_var(&daily, 0.95),
            epsilon = 1.0e-15
        );
        assert_relative_eq!(
            portfolio.mean_daily_return(),
            metrics::mean_segment_return(&daily, 1),
            epsilon = 1.0e-15
        );
    }
}
