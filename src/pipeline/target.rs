//! Target column extraction and label encoding
//!
//! Target values are rendered as strings, the distinct values become the
//! class vocabulary, and every row is replaced by its class index.

use std::cmp::Ordering;

use polars::prelude::*;
use serde::Serialize;

use crate::error::{PipelineError, Result};

/// Maps class labels to contiguous indices `0..n_classes`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit the class vocabulary on a target column.
    ///
    /// Numeric targets sort numerically, everything else lexicographically.
    pub fn fit(col: &Column) -> Result<Self> {
        let name = col.name().to_string();
        let values = column_to_string_vec(col)?;
        if values.iter().any(Option::is_none) {
            return Err(PipelineError::NullTarget(name));
        }

        let mut classes: Vec<String> = values.into_iter().flatten().collect();
        if col.dtype().is_primitive_numeric() {
            classes.sort_by(|a, b| compare_numeric(a, b));
        } else {
            classes.sort();
        }
        classes.dedup();

        Ok(Self { classes })
    }

    /// Encode a target column into class indices
    pub fn transform(&self, col: &Column) -> Result<Vec<u32>> {
        let name = col.name().to_string();
        column_to_string_vec(col)?
            .into_iter()
            .map(|value| {
                let value = value.ok_or_else(|| PipelineError::NullTarget(name.clone()))?;
                self.index_of(&value).ok_or_else(|| {
                    PipelineError::Training(format!(
                        "label '{}' in column '{}' was not seen when fitting the encoder",
                        value, name
                    ))
                })
            })
            .collect()
    }

    /// Class label for an index
    pub fn decode(&self, index: u32) -> Option<&str> {
        self.classes.get(index as usize).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    fn index_of(&self, value: &str) -> Option<u32> {
        self.classes.iter().position(|c| c == value).map(|i| i as u32)
    }
}

fn compare_numeric(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    }
}

/// Convert a column to a Vec of Option<String> for comparison
pub(crate) fn column_to_string_vec(col: &Column) -> Result<Vec<Option<String>>> {
    let values: Vec<Option<String>> = match col.dtype() {
        DataType::String => col
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect(),
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => {
            let cast = col.cast(&DataType::Int64)?;
            cast.i64()?
                .into_iter()
                .map(|v| v.map(|n| n.to_string()))
                .collect()
        }
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
            let cast = col.cast(&DataType::UInt64)?;
            cast.u64()?
                .into_iter()
                .map(|v| v.map(|n| n.to_string()))
                .collect()
        }
        DataType::Float32 | DataType::Float64 => {
            let cast = col.cast(&DataType::Float64)?;
            cast.f64()?
                .into_iter()
                .map(|v| v.map(|n| format!("{}", n)))
                .collect()
        }
        DataType::Boolean => col
            .bool()?
            .into_iter()
            .map(|v| v.map(|b| b.to_string()))
            .collect(),
        _ => {
            // For other types, try to cast to string
            let cast = col.cast(&DataType::String)?;
            cast.str()?
                .into_iter()
                .map(|v| v.map(|s| s.to_string()))
                .collect()
        }
    };

    Ok(values)
}
