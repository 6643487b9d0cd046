//! End-to-end pipeline: CSV ingest -> returns -> metrics/optimiser ->
//! simulation -> CSV output, on a small synthetic universe.

use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use tempfile::tempdir;

use quantfolio::data::{
    load_price_series_batch, write_efficient_frontier, write_optimised_portfolios,
};
use quantfolio::market::{asset_stats, covariance, returns_matrices};
use quantfolio::mc::{MonteCarloEngine, SimulationConfig};
use quantfolio::optimise::{efficient_frontier, maximise_sharpe, minimise_volatility};
use quantfolio::risk::Portfolio;

fn write_price_file(dir: &std::path::Path, ticker: &str, prices: &[f64]) -> PathBuf {
    let path = dir.join(format!("{ticker}.csv"));
    let mut file = File::create(&path).expect("create price file");
    writeln!(file, "Price,Adj Close").unwrap();
    writeln!(file, "Ticker,{ticker}").unwrap();
    writeln!(file, "Date,Close").unwrap();
    for (i, price) in prices.iter().enumerate() {
        writeln!(file, "2024-03-{:02},{price}", i + 1).unwrap();
    }
    path
}

#[test]
fn csv_universe_flows_through_to_simulated_paths() {
    let dir = tempdir().unwrap();

    // Two up-trending, loosely related price histories plus one broken file
    // the batch loader must skip.
    let alpha = [100.0, 101.2, 100.6, 102.3, 103.1, 102.7, 104.4, 105.0, 104.2, 106.1];
    let beta = [50.0, 50.4, 50.9, 50.5, 51.2, 51.8, 51.4, 52.0, 52.6, 52.2];
    write_price_file(dir.path(), "ALPHA", &alpha);
    write_price_file(dir.path(), "BETA", &beta);
    fs::write(dir.path().join("BROKEN.csv"), "garbage\n").unwrap();

    let series = load_price_series_batch(
        dir.path(),
        &[
            "ALPHA".to_string(),
            "BETA".to_string(),
            "BROKEN".to_string(),
        ],
    );
    assert_eq!(series.len(), 2);

    let (simple, log) = returns_matrices(&series);
    assert_eq!(simple.num_periods(), 9);

    let tickers = vec!["ALPHA".to_string(), "BETA".to_string()];
    let portfolio = Portfolio::new(tickers.clone(), vec![2.0, 1.0], &simple).unwrap();
    assert!((portfolio.weights().iter().sum::<f64>() - 1.0).abs() < 1.0e-9);
    assert!(portfolio.volatility() > 0.0);

    let stats = asset_stats(&log, true);
    let mu: Vec<f64> = stats.iter().map(|s| s.mean).collect();
    let cov = covariance(&log).unwrap();

    let min_vol = minimise_volatility(&cov, &mu).unwrap();
    let max_sharpe = maximise_sharpe(&cov, &mu, 0.0).unwrap();
    let frontier = efficient_frontier(&cov, &mu, 10).unwrap();

    assert!(min_vol.volatility <= max_sharpe.volatility + 1.0e-12);
    assert_eq!(frontier.len(), 10);

    let frontier_csv = dir.path().join("efficient_frontier.csv");
    write_efficient_frontier(&frontier_csv, &frontier).unwrap();
    let portfolios_csv = dir.path().join("optimised_portfolios.csv");
    write_optimised_portfolios(
        &portfolios_csv,
        &tickers,
        &[("MinVolatility", &min_vol), ("MaxSharpe", &max_sharpe)],
    )
    .unwrap();

    assert_eq!(fs::read_to_string(&frontier_csv).unwrap().lines().count(), 11);
    assert_eq!(
        fs::read_to_string(&portfolios_csv).unwrap().lines().count(),
        3
    );

    let chol = cov.cholesky().unwrap();
    let engine = MonteCarloEngine::with_workers(2);
    let config = SimulationConfig {
        num_paths: 128,
        num_days: 32,
        seed: Some(1),
        ..SimulationConfig::default()
    };
    let returns = engine
        .generate_multi_asset(&chol, &stats, portfolio.weights(), &config)
        .unwrap();
    let prices = engine.build_price_paths(&returns, 100.0);

    assert_eq!(prices.num_paths(), 128);
    assert!(prices.values().iter().all(|p| p.is_finite() && *p > 0.0));
}
