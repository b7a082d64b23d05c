//! Feature scaling fitted on the training partition
//!
//! Parameters are computed from the frame passed to [`Scaler::fit`] only;
//! [`Scaler::transform`] applies the stored parameters to any frame, so
//! test rows never influence the fitted statistics.

use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ScalingMethod;
use crate::error::{PipelineError, Result};

/// Fitted parameters for one column: `scaled = (x - center) / scale`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScaleParams {
    /// Mean (standard) or minimum (minmax)
    pub center: f64,
    /// Population std (standard) or range (minmax); 1.0 when degenerate
    pub scale: f64,
}

/// Column scaler with parameters fitted per column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scaler {
    method: ScalingMethod,
    params: Vec<(String, ScaleParams)>,
}

impl Scaler {
    /// Fit parameters for `columns` of `df`. Columns must be numeric.
    pub fn fit(method: ScalingMethod, df: &DataFrame, columns: &[String]) -> Result<Self> {
        let mut params = Vec::with_capacity(columns.len());

        for name in columns {
            let values = numeric_values(df, name)?;
            let present: Vec<f64> = values.into_iter().flatten().collect();
            let fitted = compute_params(method, &present);
            if present.is_empty() {
                warn!(column = %name, "no non-null values to fit scaler; leaving column unscaled");
            }
            debug!(column = %name, center = fitted.center, scale = fitted.scale, "fitted scaler");
            params.push((name.clone(), fitted));
        }

        Ok(Self { method, params })
    }

    /// Apply the fitted parameters; unscaled columns pass through unchanged
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();
        for (name, p) in &self.params {
            let scaled: Vec<Option<f64>> = numeric_values(df, name)?
                .into_iter()
                .map(|v| v.map(|x| (x - p.center) / p.scale))
                .collect();
            result.with_column(Column::new(name.as_str().into(), scaled))?;
        }
        Ok(result)
    }

    pub fn method(&self) -> ScalingMethod {
        self.method
    }

    /// Fitted parameters for a column, if it was scaled
    pub fn params(&self, column: &str) -> Option<ScaleParams> {
        self.params
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, p)| *p)
    }

    /// Names of the scaled columns in fit order
    pub fn columns(&self) -> Vec<&str> {
        self.params.iter().map(|(name, _)| name.as_str()).collect()
    }
}

fn compute_params(method: ScalingMethod, values: &[f64]) -> ScaleParams {
    if values.is_empty() {
        return ScaleParams {
            center: 0.0,
            scale: 1.0,
        };
    }
    let n = values.len() as f64;

    let (center, scale) = match method {
        ScalingMethod::Standard => {
            let mean = values.iter().sum::<f64>() / n;
            let var = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
            (mean, var.sqrt())
        }
        ScalingMethod::MinMax => {
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            (min, max - min)
        }
    };

    // Constant columns map to 0 rather than dividing by zero
    let scale = if scale == 0.0 || !scale.is_finite() {
        1.0
    } else {
        scale
    };

    ScaleParams { center, scale }
}

/// Read a numeric column as `f64` values
fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let col = df
        .column(name)
        .map_err(|_| PipelineError::MissingColumn(name.to_string()))?;
    if !col.dtype().is_primitive_numeric() {
        return Err(PipelineError::NonNumericFeature(name.to_string()));
    }
    let cast = col.cast(&DataType::Float64)?;
    Ok(cast.f64()?.into_iter().collect())
}
