//! Dataset loaders for CSV and JSON files

use std::path::Path;

use polars::prelude::*;
use tracing::{debug, info};

use super::json::JsonLoader;
use crate::error::{PipelineError, Result};

/// Default number of rows used for CSV schema inference
pub const DEFAULT_INFER_SCHEMA_LENGTH: usize = 10_000;

/// Capability shared by every dataset loader
pub trait DataLoader {
    /// Read the file at `path` into a DataFrame
    fn load_data(&self, path: &Path) -> Result<DataFrame>;

    /// Short name used in logs and reports
    fn name(&self) -> &'static str;
}

/// Fail with `FileNotFound` unless `path` is a readable regular file
pub(crate) fn ensure_readable(path: &Path) -> Result<()> {
    let readable = path.is_file() && std::fs::File::open(path).is_ok();
    if readable {
        Ok(())
    } else {
        Err(PipelineError::FileNotFound {
            path: path.to_path_buf(),
        })
    }
}

/// Delimited text loader; the first row is the header
#[derive(Debug, Clone)]
pub struct CsvLoader {
    /// Rows used for schema inference; `None` scans the whole file
    pub infer_schema_length: Option<usize>,
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self {
            infer_schema_length: Some(DEFAULT_INFER_SCHEMA_LENGTH),
        }
    }
}

impl DataLoader for CsvLoader {
    fn load_data(&self, path: &Path) -> Result<DataFrame> {
        info!(path = %path.display(), "loading CSV dataset");
        ensure_readable(path)?;

        let malformed = |e: PolarsError| PipelineError::MalformedInput {
            path: path.to_path_buf(),
            detail: e.to_string(),
        };

        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .finish()
            .and_then(|lf| lf.collect())
            .map_err(malformed)?;

        debug!(rows = df.height(), cols = df.width(), "CSV dataset loaded");
        Ok(df)
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}

/// Closed set of loader implementations
#[derive(Debug, Clone)]
pub enum AnyLoader {
    Csv(CsvLoader),
    Json(JsonLoader),
}

impl DataLoader for AnyLoader {
    fn load_data(&self, path: &Path) -> Result<DataFrame> {
        match self {
            AnyLoader::Csv(loader) => loader.load_data(path),
            AnyLoader::Json(loader) => loader.load_data(path),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            AnyLoader::Csv(loader) => loader.name(),
            AnyLoader::Json(loader) => loader.name(),
        }
    }
}

/// Column names of a loaded dataset
pub fn get_column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}
