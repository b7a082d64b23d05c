//! Benchmarks for the split/scale step and model training
//!
//! Run with: cargo bench --bench preprocess_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use polars::prelude::*;
use rand::prelude::*;
use rand::SeedableRng;
use serde_json::json;

use aqpipe::config::{Hyperparameters, PipelineConfig};
use aqpipe::model::Model;
use aqpipe::pipeline::{model_for_name, Preprocessor};

/// Generate a labelled frame whose class depends on the first two features
fn generate_test_dataframe(n_rows: usize, n_features: usize, seed: u64) -> DataFrame {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut columns: Vec<Column> = Vec::with_capacity(n_features + 1);

    let mut matrix: Vec<Vec<f64>> = Vec::with_capacity(n_features);
    for _ in 0..n_features {
        matrix.push((0..n_rows).map(|_| rng.gen::<f64>() * 100.0).collect());
    }

    let labels: Vec<&str> = (0..n_rows)
        .map(|row| match matrix[0][row] + matrix[1][row] {
            s if s < 70.0 => "Good",
            s if s < 130.0 => "Moderate",
            _ => "Poor",
        })
        .collect();

    for (i, values) in matrix.into_iter().enumerate() {
        columns.push(Column::new(format!("feature_{}", i).into(), values));
    }
    columns.push(Column::new("Air Quality".into(), labels));

    DataFrame::new(columns).expect("Failed to create DataFrame")
}

fn preprocessor(scaling: &str) -> Preprocessor {
    let cfg = PipelineConfig::parse(&json!({
        "data_loader": { "file_path": "bench.csv", "file_type": "csv" },
        "transformation": { "normalize": true, "scaling_method": scaling },
        "model": { "type": "logistic" },
        "splitting": { "test_size": 0.2, "random_state": 42 }
    }))
    .expect("valid bench config");
    Preprocessor::new(&cfg)
}

/// Split + scale cost for growing row counts
fn benchmark_preprocess_by_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("preprocess_by_rows");
    group.sample_size(30);

    let n_features = 20;
    for n_rows in [1_000, 10_000, 100_000] {
        let df = generate_test_dataframe(n_rows, n_features, 42);
        group.throughput(Throughput::Elements(n_rows as u64));

        for scaling in ["standard", "minmax"] {
            let p = preprocessor(scaling);
            group.bench_with_input(BenchmarkId::new(scaling, n_rows), &df, |b, df| {
                b.iter(|| p.preprocess(black_box(df), "Air Quality").expect("preprocess"))
            });
        }
    }

    group.finish();
}

/// Training cost per model on a preprocessed split
fn benchmark_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10);

    for n_rows in [1_000, 10_000] {
        let df = generate_test_dataframe(n_rows, 10, 7);
        let split = preprocessor("standard")
            .preprocess(&df, "Air Quality")
            .expect("preprocess");

        for name in ["logistic", "decisiontree"] {
            group.bench_with_input(BenchmarkId::new(name, n_rows), &split, |b, split| {
                b.iter(|| {
                    let mut model = model_for_name(name, &Hyperparameters::new()).expect("model");
                    model
                        .train(black_box(&split.train_features), &split.train_labels)
                        .expect("train");
                    model
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, benchmark_preprocess_by_rows, benchmark_training);
criterion_main!(benches);
