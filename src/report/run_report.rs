//! JSON export of a pipeline run

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use super::metrics::ClassificationReport;
use crate::pipeline::{RunOutcome, StepTimings};

/// Metadata about the run
#[derive(Serialize)]
pub struct RunMetadata {
    /// Timestamp of the run (ISO 8601 format)
    pub timestamp: String,
    pub aqpipe_version: String,
    /// Config file the run was started from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<String>,
}

/// Split shapes as `[rows, columns]`
#[derive(Serialize)]
pub struct SplitShapes {
    pub rows_loaded: usize,
    pub train: [usize; 2],
    pub test: [usize; 2],
}

/// Complete run export
#[derive(Serialize)]
pub struct RunReport<'a> {
    pub metadata: RunMetadata,
    /// The validated configuration in file layout
    pub config: Value,
    pub model: &'a str,
    pub classes: &'a [String],
    pub split: SplitShapes,
    pub metrics: &'a ClassificationReport,
    /// Predicted labels for the test partition, in split order
    pub predictions: Vec<&'a str>,
    pub timings_secs: &'a StepTimings,
}

impl<'a> RunReport<'a> {
    pub fn from_outcome(outcome: &'a RunOutcome, config_file: Option<&Path>) -> Self {
        Self {
            metadata: RunMetadata {
                timestamp: Utc::now().to_rfc3339(),
                aqpipe_version: env!("CARGO_PKG_VERSION").to_string(),
                config_file: config_file.map(|p| p.display().to_string()),
            },
            config: outcome.config.to_value(),
            model: &outcome.model,
            classes: &outcome.classes,
            split: SplitShapes {
                rows_loaded: outcome.rows_loaded,
                train: [outcome.train_shape.0, outcome.train_shape.1],
                test: [outcome.test_shape.0, outcome.test_shape.1],
            },
            metrics: &outcome.metrics,
            predictions: outcome.predicted_labels(),
            timings_secs: &outcome.timings,
        }
    }
}

/// Write the run report as pretty-printed JSON
pub fn export_run_report(outcome: &RunOutcome, config_file: Option<&Path>, output_path: &Path) -> Result<()> {
    let report = RunReport::from_outcome(outcome, config_file);

    let json = serde_json::to_string_pretty(&report).context("Failed to serialize run report to JSON")?;

    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write run report to {}", output_path.display()))?;

    Ok(())
}
