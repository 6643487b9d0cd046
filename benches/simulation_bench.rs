use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use quantfolio::market::{AssetStats, CovarianceMatrix};
use quantfolio::mc::{MonteCarloEngine, SimulationConfig};

// Simulation performance benchmarks
// Goals:
// - path generation should scale near-linearly with worker count
// - the multi-asset collapse must cost no more than the single-asset loop
//   (one draw per day either way)

fn config(num_paths: usize) -> SimulationConfig {
    SimulationConfig {
        num_paths,
        num_days: 252,
        seed: Some(42),
        ..SimulationConfig::default()
    }
}

fn bench_single_asset_paths(c: &mut Criterion) {
    let engine = MonteCarloEngine::new();
    let mut group = c.benchmark_group("single_asset_paths");

    for paths in [10_000usize, 50_000, 200_000] {
        group.bench_with_input(BenchmarkId::from_parameter(paths), &paths, |b, &paths| {
            let cfg = config(paths);
            b.iter(|| {
                let block = engine
                    .generate_single_asset(black_box(0.08), black_box(0.20), &cfg)
                    .expect("simulation should succeed");
                black_box(block.values().len())
            })
        });
    }

    group.finish();
}

fn bench_multi_asset_paths(c: &mut Criterion) {
    let cov = CovarianceMatrix::from_rows(vec![
        vec![0.0625, 0.015, 0.0075],
        vec![0.015, 0.04, 0.006],
        vec![0.0075, 0.006, 0.0225],
    ])
    .expect("square covariance");
    let chol = cov.cholesky().expect("positive-definite covariance");
    let stats = [
        AssetStats {
            mean: 0.08,
            std_dev: 0.25,
        },
        AssetStats {
            mean: 0.06,
            std_dev: 0.20,
        },
        AssetStats {
            mean: 0.10,
            std_dev: 0.15,
        },
    ];
    let weights = [0.5, 0.3, 0.2];

    let engine = MonteCarloEngine::new();
    let mut group = c.benchmark_group("multi_asset_paths");

    for paths in [10_000usize, 50_000] {
        group.bench_with_input(BenchmarkId::from_parameter(paths), &paths, |b, &paths| {
            let cfg = config(paths);
            b.iter(|| {
                let block = engine
                    .generate_multi_asset(&chol, &stats, &weights, &cfg)
                    .expect("simulation should succeed");
                black_box(block.values().len())
            })
        });
    }

    group.finish();
}

fn bench_price_path_builder(c: &mut Criterion) {
    let engine = MonteCarloEngine::new();
    let returns = engine
        .generate_single_asset(0.08, 0.20, &config(50_000))
        .expect("simulation should succeed");

    c.bench_function("build_price_paths_50k", |b| {
        b.iter(|| {
            let prices = engine.build_price_paths(black_box(&returns), black_box(100.0));
            black_box(prices.values().len())
        })
    });
}

criterion_group!(
    benches,
    bench_single_asset_paths,
    bench_multi_asset_paths,
    bench_price_path_builder
);
criterion_main!(benches);
