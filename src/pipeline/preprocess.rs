//! Preprocessing: target extraction, seeded train/test split, scaling
//!
//! Order of operations:
//! 1. separate the target column and label-encode it
//! 2. shuffle row indices with a seeded generator and cut the test set off
//!    the front (`floor(rows * test_size)` rows)
//! 3. fit the scaler on training rows only, then apply it to both partitions
//!
//! Non-numeric feature columns under `normalize = true` follow
//! `transformation.non_numeric`: `reject` fails with `NonNumericFeature`,
//! `passthrough` leaves the column unscaled. With `normalize = false` no
//! column is inspected here.

use polars::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use super::scaler::Scaler;
use super::target::LabelEncoder;
use crate::config::{NonNumericPolicy, PipelineConfig, SplitConfig, TransformConfig};
use crate::error::{PipelineError, Result};

/// Output of preprocessing: four aligned frames plus fitted transformers
#[derive(Debug, Clone)]
pub struct SplitResult {
    pub train_features: DataFrame,
    pub test_features: DataFrame,
    /// Single `UInt32` column of class indices, named after the target
    pub train_labels: DataFrame,
    pub test_labels: DataFrame,
    pub label_encoder: LabelEncoder,
    /// Present when normalization was enabled
    pub scaler: Option<Scaler>,
    /// Original row positions of each training row, in split order
    pub train_indices: Vec<usize>,
    /// Original row positions of each test row, in split order
    pub test_indices: Vec<usize>,
}

impl SplitResult {
    pub fn train_rows(&self) -> usize {
        self.train_features.height()
    }

    pub fn test_rows(&self) -> usize {
        self.test_features.height()
    }
}

/// Applies the configured transformation and split to a dataset
#[derive(Debug, Clone)]
pub struct Preprocessor {
    transform: TransformConfig,
    split: SplitConfig,
}

impl Preprocessor {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            transform: config.transformation().clone(),
            split: config.splitting().clone(),
        }
    }

    /// Split `df` into train/test features and labels for `target`
    pub fn preprocess(&self, df: &DataFrame, target: &str) -> Result<SplitResult> {
        if df.height() == 0 {
            return Err(PipelineError::EmptyDataset);
        }

        let target_col = df
            .column(target)
            .map_err(|_| PipelineError::MissingColumn(target.to_string()))?;
        let features = df.drop(target)?;
        if features.width() == 0 {
            return Err(PipelineError::ShapeMismatch {
                expected: "at least one feature column".to_string(),
                actual: "only the target column".to_string(),
            });
        }

        let label_encoder = LabelEncoder::fit(target_col)?;
        let codes = label_encoder.transform(target_col)?;
        debug!(classes = ?label_encoder.classes(), "encoded target labels");

        let (train_indices, test_indices) =
            shuffle_split_indices(df.height(), self.split.test_size(), self.split.random_state());
        if test_indices.is_empty() {
            warn!(
                rows = df.height(),
                test_size = self.split.test_size(),
                "test partition is empty"
            );
        }

        let mut train_features = take_rows(&features, &train_indices)?;
        let mut test_features = take_rows(&features, &test_indices)?;
        let train_labels = label_frame(target, &codes, &train_indices)?;
        let test_labels = label_frame(target, &codes, &test_indices)?;

        let scaler = if self.transform.normalize() {
            let columns = self.columns_to_scale(&train_features)?;
            let scaler = Scaler::fit(self.transform.scaling_method(), &train_features, &columns)?;
            train_features = scaler.transform(&train_features)?;
            test_features = scaler.transform(&test_features)?;
            Some(scaler)
        } else {
            None
        };

        info!(
            train = train_indices.len(),
            test = test_indices.len(),
            features = train_features.width(),
            "preprocessing complete"
        );

        Ok(SplitResult {
            train_features,
            test_features,
            train_labels,
            test_labels,
            label_encoder,
            scaler,
            train_indices,
            test_indices,
        })
    }

    fn columns_to_scale(&self, features: &DataFrame) -> Result<Vec<String>> {
        let mut columns = Vec::with_capacity(features.width());
        for col in features.get_columns() {
            let name = col.name().to_string();
            if col.dtype().is_primitive_numeric() {
                columns.push(name);
                continue;
            }
            match self.transform.non_numeric() {
                NonNumericPolicy::Reject => return Err(PipelineError::NonNumericFeature(name)),
                NonNumericPolicy::Passthrough => {
                    debug!(column = %name, dtype = %col.dtype(), "passing non-numeric column through unscaled");
                }
            }
        }
        Ok(columns)
    }
}

/// Shuffle-then-cut: permute `0..n_rows` with a seeded generator, take the
/// first `floor(n_rows * test_fraction)` indices as the test set.
///
/// Returns `(train, test)`.
pub fn shuffle_split_indices(n_rows: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n_rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((n_rows as f64) * test_fraction).floor() as usize;
    let n_test = n_test.min(n_rows);
    let train = indices.split_off(n_test);
    (train, indices)
}

fn take_rows(df: &DataFrame, indices: &[usize]) -> Result<DataFrame> {
    let idx: Vec<IdxSize> = indices.iter().map(|&i| i as IdxSize).collect();
    let idx = IdxCa::from_vec("idx".into(), idx);
    Ok(df.take(&idx)?)
}

fn label_frame(target: &str, codes: &[u32], indices: &[usize]) -> Result<DataFrame> {
    let values: Vec<u32> = indices.iter().map(|&i| codes[i]).collect();
    Ok(DataFrame::new(vec![Column::new(target.into(), values)])?)
}
