//! Shared test utilities and fixture generators
#![allow(dead_code)]

use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const TARGET: &str = "Air Quality";

/// Create a seeded air-quality style DataFrame
///
/// This DataFrame includes:
/// - `Temperature`, `Humidity`: weak noise features
/// - `PM25`, `NO2`: pollutant readings that drive the label
/// - `Air Quality`: "Good" / "Moderate" / "Poor" derived from `PM25` and `NO2`
pub fn create_air_quality_dataframe(rows: usize, seed: u64) -> DataFrame {
    generate_air_quality(rows, seed, &[0, 1, 2])
}

/// Same generator restricted to "Good" / "Poor"
pub fn create_binary_air_quality_dataframe(rows: usize, seed: u64) -> DataFrame {
    generate_air_quality(rows, seed, &[0, 2])
}

fn generate_air_quality(rows: usize, seed: u64, bands: &[usize]) -> DataFrame {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut temperature = Vec::with_capacity(rows);
    let mut humidity = Vec::with_capacity(rows);
    let mut pm25 = Vec::with_capacity(rows);
    let mut no2 = Vec::with_capacity(rows);
    let mut label = Vec::with_capacity(rows);

    for i in 0..rows {
        // Cycle the classes so every class is well represented
        let (quality, pm_range, no2_range) = match bands[i % bands.len()] {
            0 => ("Good", 2.0..15.0, 5.0..20.0),
            1 => ("Moderate", 30.0..55.0, 25.0..40.0),
            _ => ("Poor", 80.0..150.0, 50.0..90.0),
        };
        temperature.push(rng.gen_range(15.0..35.0));
        humidity.push(rng.gen_range(30.0..90.0));
        pm25.push(rng.gen_range(pm_range));
        no2.push(rng.gen_range(no2_range));
        label.push(quality);
    }

    df! {
        "Temperature" => temperature,
        "Humidity" => humidity,
        "PM25" => pm25,
        "NO2" => no2,
        TARGET => label,
    }
    .unwrap()
}

/// Write a DataFrame to a CSV file inside a fresh temp directory
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("air_quality.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}

/// Write a JSON document to `name` inside `dir`
pub fn write_json(dir: &Path, name: &str, document: &Value) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string_pretty(document).unwrap()).unwrap();
    path
}

/// Render a DataFrame as an array of JSON records
pub fn dataframe_to_records(df: &DataFrame) -> Value {
    let records: Vec<Value> = (0..df.height())
        .map(|row| {
            let mut record = serde_json::Map::new();
            for col in df.get_columns() {
                let value = match col.get(row).unwrap() {
                    AnyValue::Float64(v) => json!(v),
                    AnyValue::Int64(v) => json!(v),
                    AnyValue::Int32(v) => json!(v),
                    AnyValue::String(v) => json!(v),
                    AnyValue::Null => Value::Null,
                    other => json!(other.to_string()),
                };
                record.insert(col.name().to_string(), value);
            }
            Value::Object(record)
        })
        .collect();
    Value::Array(records)
}

/// YAML pipeline config pointing at `data_path`
pub fn pipeline_yaml(data_path: &Path, file_type: &str, model: &str, scaling: &str) -> String {
    format!(
        r#"data_loader:
  file_path: "{}"
  file_type: {}
transformation:
  normalize: true
  scaling_method: {}
model:
  type: {}
splitting:
  test_size: 0.2
  random_state: 42
"#,
        data_path.display(),
        file_type,
        scaling,
        model
    )
}

/// Write a YAML config next to the data file
pub fn write_config(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("pipeline.yaml");
    std::fs::write(&path, contents).unwrap();
    path
}

/// Assert that a DataFrame has expected shape
pub fn assert_shape(df: &DataFrame, expected_rows: usize, expected_cols: usize) {
    let (rows, cols) = df.shape();
    assert_eq!(rows, expected_rows, "Row count mismatch: expected {}, got {}", expected_rows, rows);
    assert_eq!(cols, expected_cols, "Column count mismatch: expected {}, got {}", expected_cols, cols);
}

/// Assert that a DataFrame does NOT contain specific columns
pub fn assert_missing_columns(df: &DataFrame, unexpected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in unexpected_cols {
        assert!(
            !actual_cols.contains(&col.to_string()),
            "Unexpected column still present: '{}'",
            col
        );
    }
}
