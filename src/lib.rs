//! aqpipe: config-driven tabular classification pipeline
//!
//! Loads a CSV or JSON dataset described by a YAML/JSON config, splits it
//! with a seeded shuffle, scales features on the training rows only, and
//! trains and evaluates a logistic regression or decision tree classifier.

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod utils;

pub use config::{load_config, PipelineConfig};
pub use error::{ErrorKind, PipelineError, Result};
pub use pipeline::{run_pipeline, Pipeline, RunOutcome};
