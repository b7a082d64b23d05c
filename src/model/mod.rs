//! Model module - classifiers behind a shared train/predict capability

pub mod logistic;
pub mod tree;

pub use logistic::{LogisticModel, LogisticParams};
pub use tree::{Criterion, DecisionTreeModel, TreeParams};

use faer::Mat;
use polars::prelude::*;

use crate::error::{PipelineError, Result};

/// Capability shared by every classifier.
///
/// Labels are class indices (`UInt32`) as produced by the preprocessor's
/// label encoder; predictions use the same indices.
pub trait Model {
    /// Fit the model. Calling it again replaces the previous fit.
    fn train(&mut self, features: &DataFrame, labels: &DataFrame) -> Result<()>;

    /// Predict one class index per row. Fails with `NotTrained` before `train`.
    fn predict(&self, features: &DataFrame) -> Result<Vec<u32>>;

    fn is_trained(&self) -> bool;

    /// Human-readable model summary for reports
    fn describe(&self) -> String;
}

/// Closed set of model implementations
#[derive(Debug, Clone)]
pub enum AnyModel {
    Logistic(LogisticModel),
    DecisionTree(DecisionTreeModel),
}

impl Model for AnyModel {
    fn train(&mut self, features: &DataFrame, labels: &DataFrame) -> Result<()> {
        match self {
            AnyModel::Logistic(m) => m.train(features, labels),
            AnyModel::DecisionTree(m) => m.train(features, labels),
        }
    }

    fn predict(&self, features: &DataFrame) -> Result<Vec<u32>> {
        match self {
            AnyModel::Logistic(m) => m.predict(features),
            AnyModel::DecisionTree(m) => m.predict(features),
        }
    }

    fn is_trained(&self) -> bool {
        match self {
            AnyModel::Logistic(m) => m.is_trained(),
            AnyModel::DecisionTree(m) => m.is_trained(),
        }
    }

    fn describe(&self) -> String {
        match self {
            AnyModel::Logistic(m) => m.describe(),
            AnyModel::DecisionTree(m) => m.describe(),
        }
    }
}

/// Convert a feature frame into a dense row-major `f64` matrix.
///
/// Every column must be numeric, free of nulls and finite.
pub fn features_to_matrix(df: &DataFrame) -> Result<Mat<f64>> {
    let n_rows = df.height();
    let n_cols = df.width();
    let mut x = Mat::<f64>::zeros(n_rows, n_cols);

    for (col_idx, col) in df.get_columns().iter().enumerate() {
        let name = col.name().to_string();
        if !col.dtype().is_primitive_numeric() {
            return Err(PipelineError::NonNumericFeature(name));
        }
        if col.null_count() > 0 {
            return Err(PipelineError::NullFeature(name));
        }
        let cast = col.cast(&DataType::Float64)?;
        for (row_idx, val) in cast.f64()?.into_no_null_iter().enumerate() {
            if !val.is_finite() {
                return Err(PipelineError::NonFiniteFeature(name));
            }
            x[(row_idx, col_idx)] = val;
        }
    }

    Ok(x)
}

/// Read the single class-index column of a label frame
pub fn labels_to_vec(df: &DataFrame) -> Result<Vec<u32>> {
    if df.width() != 1 {
        return Err(PipelineError::ShapeMismatch {
            expected: "1 label column".to_string(),
            actual: format!("{} columns", df.width()),
        });
    }
    let col = &df.get_columns()[0];
    let name = col.name().to_string();
    if col.null_count() > 0 {
        return Err(PipelineError::NullTarget(name));
    }
    let cast = col.cast(&DataType::UInt32)?;
    Ok(cast.u32()?.into_no_null_iter().collect())
}

/// Shared shape checks before fitting
pub(crate) fn check_training_shapes(x: &Mat<f64>, y: &[u32]) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(PipelineError::ShapeMismatch {
            expected: format!("{} labels", x.nrows()),
            actual: format!("{} labels", y.len()),
        });
    }
    if x.nrows() == 0 {
        return Err(PipelineError::EmptyDataset);
    }
    Ok(())
}

/// Feature count at predict time must match the count seen at training
pub(crate) fn check_feature_count(expected: usize, x: &Mat<f64>) -> Result<()> {
    if x.ncols() != expected {
        return Err(PipelineError::ShapeMismatch {
            expected: format!("{} feature columns", expected),
            actual: format!("{} feature columns", x.ncols()),
        });
    }
    Ok(())
}
