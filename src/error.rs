//! Error types for the pipeline library.
//!
//! Every stage returns [`PipelineError`]. The binary wraps it in `anyhow`
//! for context, but the variant (and its [`ErrorKind`]) is never rewritten
//! on the way up, so the failing field or value always reaches the user.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// A single configuration violation found by the schema validator.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    /// Required field is absent
    Missing { field: String },
    /// Field is present but has the wrong type
    WrongType { field: String, expected: &'static str },
    /// Field value is not one of the accepted enum values
    InvalidEnum {
        field: String,
        value: String,
        allowed: &'static [&'static str],
    },
    /// Numeric field lies outside its accepted range
    OutOfRange { field: String, value: String, range: &'static str },
}

impl Violation {
    /// Dotted name of the offending field
    pub fn field(&self) -> &str {
        match self {
            Violation::Missing { field }
            | Violation::WrongType { field, .. }
            | Violation::InvalidEnum { field, .. }
            | Violation::OutOfRange { field, .. } => field,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Missing { field } => write!(f, "{}: required field is missing", field),
            Violation::WrongType { field, expected } => {
                write!(f, "{}: expected {}", field, expected)
            }
            Violation::InvalidEnum {
                field,
                value,
                allowed,
            } => write!(
                f,
                "{}: '{}' is not one of {}",
                field,
                value,
                allowed.join(", ")
            ),
            Violation::OutOfRange {
                field,
                value,
                range,
            } => write!(f, "{}: {} is outside {}", field, value, range),
        }
    }
}

/// All violations found while validating one configuration document.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationError {
    pub violations: Vec<Violation>,
}

impl ConfigValidationError {
    /// True if any violation concerns the given dotted field
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field() == field)
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid configuration ({} violation(s))",
            self.violations.len()
        )?;
        for violation in &self.violations {
            write!(f, "\n  - {}", violation)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigValidationError {}

/// Failure category, one per family of the error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ConfigValidation,
    UnsupportedKind,
    DataAccess,
    MalformedInput,
    PipelineData,
    ModelState,
}

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigValidationError),

    #[error("Invalid hyperparameter for {model} model: {name} ({reason})")]
    InvalidHyperparameter {
        model: &'static str,
        name: String,
        reason: String,
    },

    #[error("Unsupported {family}: '{value}'")]
    UnsupportedKind { family: &'static str, value: String },

    #[error("File not found or unreadable: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Malformed input in {}: {detail}", path.display())]
    MalformedInput { path: PathBuf, detail: String },

    #[error("Column '{0}' not found in dataset")]
    MissingColumn(String),

    #[error("Feature column '{0}' is not numeric")]
    NonNumericFeature(String),

    #[error("Feature column '{0}' contains null values")]
    NullFeature(String),

    #[error("Feature column '{0}' contains NaN or infinite values")]
    NonFiniteFeature(String),

    #[error("Target column '{0}' contains null values")]
    NullTarget(String),

    #[error("Dataset is empty (zero rows)")]
    EmptyDataset,

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("Training failed: {0}")]
    Training(String),

    #[error("Model has not been trained")]
    NotTrained,

    #[error("Data error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

impl PipelineError {
    /// Taxonomy family of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Config(_) | PipelineError::InvalidHyperparameter { .. } => {
                ErrorKind::ConfigValidation
            }
            PipelineError::UnsupportedKind { .. } => ErrorKind::UnsupportedKind,
            PipelineError::FileNotFound { .. } => ErrorKind::DataAccess,
            PipelineError::MalformedInput { .. } => ErrorKind::MalformedInput,
            PipelineError::MissingColumn(_)
            | PipelineError::NonNumericFeature(_)
            | PipelineError::NullFeature(_)
            | PipelineError::NonFiniteFeature(_)
            | PipelineError::NullTarget(_)
            | PipelineError::EmptyDataset
            | PipelineError::ShapeMismatch { .. }
            | PipelineError::Training(_)
            | PipelineError::Polars(_) => ErrorKind::PipelineData,
            PipelineError::NotTrained => ErrorKind::ModelState,
        }
    }
}
