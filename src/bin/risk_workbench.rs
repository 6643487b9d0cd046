//! Command-line entry point for the portfolio risk workbench.
//!
//! ```text
//! risk_workbench [--assets-dir DIR] [--output-dir DIR] [--paths N] \
//!     [TICKER=WEIGHT ...]
//! ```
//!
//! With no positional arguments the portfolio is read from
//! `<assets-dir>/portfolio.csv`. Weights must be positive and are
//! normalised to sum to one.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use tracing::{info, Level};

use quantfolio::data::{
    load_portfolio_selection, load_price_series_batch, write_efficient_frontier,
    write_optimised_portfolios, write_path_block,
};
use quantfolio::market::{asset_stats, covariance, returns_matrices, series_stats, weighted_log_returns};
use quantfolio::mc::{MonteCarloEngine, SimulationConfig};
use quantfolio::optimise::{
    efficient_frontier, maximise_sharpe, minimise_volatility, portfolio_return,
    portfolio_variance, OptimisationResult,
};
use quantfolio::risk::Portfolio;

const FRONTIER_POINTS: usize = 50;
const CSV_PATHS: usize = 1_000;

struct Args {
    assets_dir: PathBuf,
    output_dir: PathBuf,
    num_paths: usize,
    holdings: Vec<(String, f64)>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("usage: risk_workbench [--assets-dir DIR] [--output-dir DIR] [--paths N] [TICKER=WEIGHT ...]");
            return ExitCode::FAILURE;
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn parse_args() -> Result<Args, String> {
    let mut assets_dir = PathBuf::from("assets");
    let mut output_dir = PathBuf::from(".");
    let mut num_paths = 1_000_000usize;
    let mut holdings = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--assets-dir" => {
                assets_dir = PathBuf::from(
                    args.next().ok_or("--assets-dir requires a directory")?,
                );
            }
            "--output-dir" => {
                output_dir = PathBuf::from(
                    args.next().ok_or("--output-dir requires a directory")?,
                );
            }
            "--paths" => {
                let value = args.next().ok_or("--paths requires a count")?;
                num_paths = value
                    .parse()
                    .map_err(|_| format!("invalid path count: {value}"))?;
            }
            positional => {
                let (ticker, weight) = positional
                    .split_once('=')
                    .ok_or_else(|| format!("invalid argument: {positional} (expected TICKER=WEIGHT)"))?;
                let weight: f64 = weight
                    .parse()
                    .map_err(|_| format!("invalid weight for {ticker}: {weight}"))?;
                if weight <= 0.0 {
                    return Err(format!("weight for {ticker} must be positive"));
                }
                holdings.push((ticker.to_string(), weight));
            }
        }
    }

    Ok(Args {
        assets_dir,
        output_dir,
        num_paths,
        holdings,
    })
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut holdings = args.holdings;
    if holdings.is_empty() {
        let selection_path = args.assets_dir.join("portfolio.csv");
        info!(path = %selection_path.display(), "no holdings given, loading default selection");
        holdings = load_portfolio_selection(&selection_path)?
            .into_iter()
            .map(|entry| (entry.ticker, entry.weight))
            .collect();
    }

    let total: f64 = holdings.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return Err("total portfolio weight must be positive".into());
    }

    let tickers: Vec<String> = holdings.iter().map(|(t, _)| t.clone()).collect();
    let weights: Vec<f64> = holdings.iter().map(|(_, w)| w / total).collect();

    println!("Parsed tickers and normalised weights:");
    for (ticker, weight) in tickers.iter().zip(&weights) {
        println!("  {ticker} -> {:.3}%", weight * 100.0);
    }

    let series = load_price_series_batch(&args.assets_dir, &tickers);
    if series.len() != tickers.len() {
        return Err(format!(
            "loaded {} of {} price files; aborting",
            series.len(),
            tickers.len()
        )
        .into());
    }

    let (simple, log) = returns_matrices(&series);
    let portfolio = Portfolio::new(tickers.clone(), weights.clone(), &simple)?;

    let total_return = portfolio.mean_segment_return(portfolio.daily_returns().len());
    println!("\nPortfolio Risk Metrics:");
    println!("  Total Return:        {:.2}%", total_return * 100.0);
    println!(
        "  Mean 10-Day Return:  {:.2}%",
        portfolio.mean_segment_return(10) * 100.0
    );
    println!("  Volatility (STD):    {:.2}%", portfolio.volatility() * 100.0);
    println!(
        "  Value-at-Risk (VaR): {:.2}%",
        portfolio.historical_var(0.95) * 100.0
    );
    println!(
        "  Conditional VaR:     {:.2}%",
        portfolio.historical_cvar(0.95) * 100.0
    );
    println!("  Sharpe Ratio:        {:.3}", portfolio.sharpe_ratio());

    // Annualised statistics feed both the optimiser and the simulation.
    let stats = asset_stats(&log, true);
    let mu: Vec<f64> = stats.iter().map(|s| s.mean).collect();
    let cov = covariance(&log)?;

    let current_return = portfolio_return(portfolio.weights(), &mu)?;
    let current_vol = portfolio_variance(portfolio.weights(), &cov)?.max(0.0).sqrt();
    let current = OptimisationResult {
        weights: portfolio.weights().to_vec(),
        expected_return: current_return,
        volatility: current_vol,
        sharpe_ratio: current_return / current_vol,
    };
    let min_vol = minimise_volatility(&cov, &mu)?;
    let max_sharpe = maximise_sharpe(&cov, &mu, 0.0)?;
    let frontier = efficient_frontier(&cov, &mu, FRONTIER_POINTS)?;

    println!("\nOptimised Portfolios (annualised):");
    println!(
        "  MinVolatility: return {:.2}%, vol {:.2}%, sharpe {:.3}",
        min_vol.expected_return * 100.0,
        min_vol.volatility * 100.0,
        min_vol.sharpe_ratio
    );
    println!(
        "  MaxSharpe:     return {:.2}%, vol {:.2}%, sharpe {:.3}",
        max_sharpe.expected_return * 100.0,
        max_sharpe.volatility * 100.0,
        max_sharpe.sharpe_ratio
    );

    write_efficient_frontier(&args.output_dir.join("efficient_frontier.csv"), &frontier)?;
    write_optimised_portfolios(
        &args.output_dir.join("optimised_portfolios.csv"),
        &tickers,
        &[
            ("Current", &current),
            ("MinVolatility", &min_vol),
            ("MaxSharpe", &max_sharpe),
        ],
    )?;

    // Fit the portfolio-level series and run the correlated simulation.
    let combined = weighted_log_returns(&log, portfolio.weights())?;
    let fitted = series_stats(&combined);
    info!(
        mean = fitted.mean,
        std_dev = fitted.std_dev,
        "fitted daily portfolio statistics"
    );

    let chol = cov.cholesky()?;
    let engine = MonteCarloEngine::new();
    let config = SimulationConfig {
        num_paths: args.num_paths,
        ..SimulationConfig::default()
    };

    let started = Instant::now();
    let returns = engine.generate_multi_asset(&chol, &stats, portfolio.weights(), &config)?;
    let elapsed = started.elapsed();

    println!("\nMonte Carlo Simulation:");
    println!("  Runs: {}", returns.num_paths());
    println!("  Time taken: {} ms", elapsed.as_millis());

    // Only a small block goes to the CSV output.
    let csv_config = SimulationConfig {
        num_paths: CSV_PATHS.min(args.num_paths.max(1)),
        ..config
    };
    let csv_returns = engine.generate_multi_asset(&chol, &stats, portfolio.weights(), &csv_config)?;
    let price_paths = engine.build_price_paths(&csv_returns, 100.0);
    write_path_block(&args.output_dir.join("simulated_price_paths.csv"), &price_paths)?;

    info!(output_dir = %args.output_dir.display(), "wrote frontier, portfolio, and path CSVs");
    Ok(())
}
