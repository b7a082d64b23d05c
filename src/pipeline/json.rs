//! JSON dataset loader with record flattening
//!
//! A top-level array becomes one row per element, a single object becomes a
//! one-row table. Nested objects are flattened into dotted column names
//! (`{"a": {"b": 1}}` -> column `a.b`). Columns appear in first-seen order;
//! keys missing from a record become nulls.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use polars::prelude::*;
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::loader::{ensure_readable, DataLoader};
use crate::error::{PipelineError, Result};

/// Loader for JSON documents (array of objects, or a single object)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLoader;

impl DataLoader for JsonLoader {
    fn load_data(&self, path: &Path) -> Result<DataFrame> {
        info!(path = %path.display(), "loading JSON dataset");
        ensure_readable(path)?;

        let text = std::fs::read_to_string(path).map_err(|e| PipelineError::MalformedInput {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

        let document: Value =
            serde_json::from_str(&text).map_err(|e| PipelineError::MalformedInput {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;

        let df = normalize_json(&document).map_err(|detail| PipelineError::MalformedInput {
            path: path.to_path_buf(),
            detail,
        })?;

        debug!(rows = df.height(), cols = df.width(), "JSON dataset loaded");
        Ok(df)
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

/// Flatten a parsed JSON document into a DataFrame
pub fn normalize_json(document: &Value) -> std::result::Result<DataFrame, String> {
    let records: Vec<&Map<String, Value>> = match document {
        Value::Object(obj) => vec![obj],
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_object()
                    .ok_or_else(|| format!("array element {} is not an object", i))
            })
            .collect::<std::result::Result<_, _>>()?,
        _ => return Err("expected a JSON object or an array of objects".to_string()),
    };

    let mut names: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut rows: Vec<Vec<(usize, &Value)>> = Vec::with_capacity(records.len());

    for (record_idx, record) in records.iter().enumerate() {
        let mut flat = Vec::new();
        flatten_into("", record, &mut flat);

        let mut row: Vec<(usize, &Value)> = Vec::with_capacity(flat.len());
        let mut seen = HashSet::new();
        for (name, value) in flat {
            let idx = *index.entry(name.clone()).or_insert_with(|| {
                names.push(name);
                names.len() - 1
            });
            // A literal dotted key and a nested path can flatten to the same name
            if !seen.insert(idx) {
                return Err(format!(
                    "record {} has more than one value for column '{}'",
                    record_idx, names[idx]
                ));
            }
            row.push((idx, value));
        }
        rows.push(row);
    }

    let mut cells: Vec<Vec<Option<&Value>>> = vec![vec![None; rows.len()]; names.len()];
    for (row_idx, row) in rows.iter().enumerate() {
        for &(col_idx, value) in row {
            if !value.is_null() {
                cells[col_idx][row_idx] = Some(value);
            }
        }
    }

    let columns: Vec<Column> = names
        .iter()
        .zip(cells.iter())
        .map(|(name, values)| build_column(name, values))
        .collect();

    DataFrame::new(columns).map_err(|e| e.to_string())
}

fn flatten_into<'a>(prefix: &str, obj: &'a Map<String, Value>, out: &mut Vec<(String, &'a Value)>) {
    for (key, value) in obj {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => flatten_into(&name, inner, out),
            _ => out.push((name, value)),
        }
    }
}

/// Build a typed column: bool, i64, f64, or string, in that order of preference
fn build_column(name: &str, values: &[Option<&Value>]) -> Column {
    let present = || values.iter().flatten();

    if present().next().is_none() {
        let nulls: Vec<Option<f64>> = vec![None; values.len()];
        return Column::new(name.into(), nulls);
    }

    if present().all(|v| v.is_boolean()) {
        let data: Vec<Option<bool>> = values.iter().map(|v| v.and_then(Value::as_bool)).collect();
        return Column::new(name.into(), data);
    }

    if present().all(|v| v.is_i64()) {
        let data: Vec<Option<i64>> = values.iter().map(|v| v.and_then(Value::as_i64)).collect();
        return Column::new(name.into(), data);
    }

    if present().all(|v| v.is_number()) {
        let data: Vec<Option<f64>> = values.iter().map(|v| v.and_then(Value::as_f64)).collect();
        return Column::new(name.into(), data);
    }

    let data: Vec<Option<String>> = values
        .iter()
        .map(|v| {
            v.map(|value| match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
        })
        .collect();
    Column::new(name.into(), data)
}
