//! Configuration module - file loading and schema validation

pub mod params;
pub mod schema;

pub use params::ParamReader;
pub use schema::*;

use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};

/// Read a configuration file into its raw mapping.
///
/// `.json` files are read with serde_json; anything else is treated as YAML.
pub fn read_raw_config(path: &Path) -> Result<Value> {
    let bytes = std::fs::read(path).map_err(|_| PipelineError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    let text = String::from_utf8(bytes).map_err(|e| PipelineError::MalformedInput {
        path: path.to_path_buf(),
        detail: format!("config is not valid UTF-8: {}", e.utf8_error()),
    })?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let raw = match extension.as_str() {
        "json" => serde_json::from_str::<Value>(&text).map_err(|e| e.to_string()),
        _ => serde_yaml::from_str::<Value>(&text).map_err(|e| e.to_string()),
    };

    raw.map_err(|detail| PipelineError::MalformedInput {
        path: path.to_path_buf(),
        detail,
    })
}

/// Load and validate a pipeline configuration file
pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    info!(path = %path.display(), "loading configuration");
    let raw = read_raw_config(path)?;
    let config = PipelineConfig::parse(&raw)?;
    debug!(?config, "configuration validated");
    Ok(config)
}
