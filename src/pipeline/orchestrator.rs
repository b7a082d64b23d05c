//! End-to-end run: config -> load -> preprocess -> train -> predict -> evaluate

use std::path::Path;
use std::time::{Duration, Instant};

use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::{info, warn};

use super::loader::DataLoader;
use super::preprocess::{Preprocessor, SplitResult};
use super::registry::{resolve_loader, resolve_model};
use crate::config::{load_config, PipelineConfig};
use crate::error::Result;
use crate::model::{labels_to_vec, AnyModel, Model};
use crate::report::{evaluate, ClassificationReport};

/// Wall-clock time spent in each stage
#[derive(Debug, Clone, Default, Serialize)]
pub struct StepTimings {
    #[serde(serialize_with = "as_secs")]
    pub load: Duration,
    #[serde(serialize_with = "as_secs")]
    pub preprocess: Duration,
    #[serde(serialize_with = "as_secs")]
    pub train: Duration,
    #[serde(serialize_with = "as_secs")]
    pub predict: Duration,
}

impl StepTimings {
    pub fn total(&self) -> Duration {
        self.load + self.preprocess + self.train + self.predict
    }
}

fn as_secs<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Everything a run produces
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub config: PipelineConfig,
    pub rows_loaded: usize,
    /// (rows, feature columns)
    pub train_shape: (usize, usize),
    pub test_shape: (usize, usize),
    /// Predicted class indices for the test partition, in split order
    pub predictions: Vec<u32>,
    /// True class indices for the test partition
    pub y_test: Vec<u32>,
    /// Class labels indexed by class index
    pub classes: Vec<String>,
    pub model: String,
    pub metrics: ClassificationReport,
    pub timings: StepTimings,
}

impl RunOutcome {
    /// Predictions rendered back to the original class labels
    pub fn predicted_labels(&self) -> Vec<&str> {
        self.predictions
            .iter()
            .filter_map(|&i| self.classes.get(i as usize).map(String::as_str))
            .collect()
    }
}

/// A validated configuration ready to run
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn from_config(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Load and validate a config file, optionally overriding the target column
    pub fn from_path(path: &Path, target_override: Option<&str>) -> Result<Self> {
        let mut config = load_config(path)?;
        if let Some(target) = target_override {
            config = config.with_target_column(target)?;
        }
        Ok(Self::from_config(config))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Execute every stage in order. The first failure aborts the run.
    pub fn run(&self) -> Result<RunOutcome> {
        let mut timings = StepTimings::default();

        let start = Instant::now();
        let df = self.load()?;
        timings.load = start.elapsed();

        let mut model = self.build_model()?;

        let start = Instant::now();
        let split = self.preprocess(&df)?;
        timings.preprocess = start.elapsed();

        let start = Instant::now();
        self.train(&mut model, &split)?;
        timings.train = start.elapsed();

        let start = Instant::now();
        let predictions = self.predict(&model, &split)?;
        timings.predict = start.elapsed();

        self.outcome(df.height(), &split, &model, predictions, timings)
    }

    /// Read the configured dataset with the loader for its file type
    pub fn load(&self) -> Result<DataFrame> {
        let source = self.config.data_loader();
        let loader = resolve_loader(source.file_type());
        let df = loader.load_data(source.file_path())?;
        info!(
            loader = loader.name(),
            rows = df.height(),
            columns = df.width(),
            "loaded dataset"
        );
        Ok(df)
    }

    /// Resolve the configured model. Bad hyperparameters fail here, before
    /// any data is split.
    pub fn build_model(&self) -> Result<AnyModel> {
        resolve_model(self.config.model().kind(), self.config.model().params())
    }

    pub fn preprocess(&self, df: &DataFrame) -> Result<SplitResult> {
        Preprocessor::new(&self.config).preprocess(df, self.config.data_loader().target_column())
    }

    pub fn train(&self, model: &mut AnyModel, split: &SplitResult) -> Result<()> {
        model.train(&split.train_features, &split.train_labels)
    }

    /// Predict the test partition; an empty partition yields no predictions
    pub fn predict(&self, model: &AnyModel, split: &SplitResult) -> Result<Vec<u32>> {
        if split.test_rows() == 0 {
            warn!("no test rows; skipping prediction");
            return Ok(Vec::new());
        }
        model.predict(&split.test_features)
    }

    /// Score the predictions and assemble the run result
    pub fn outcome(
        &self,
        rows_loaded: usize,
        split: &SplitResult,
        model: &AnyModel,
        predictions: Vec<u32>,
        timings: StepTimings,
    ) -> Result<RunOutcome> {
        let y_test = labels_to_vec(&split.test_labels)?;
        let classes = split.label_encoder.classes().to_vec();
        let metrics = evaluate(&y_test, &predictions, &classes);

        info!(
            predictions = predictions.len(),
            accuracy = metrics.accuracy,
            total_secs = timings.total().as_secs_f64(),
            "pipeline finished"
        );

        Ok(RunOutcome {
            config: self.config.clone(),
            rows_loaded,
            train_shape: shape(&split.train_features),
            test_shape: shape(&split.test_features),
            predictions,
            y_test,
            classes,
            model: model.describe(),
            metrics,
            timings,
        })
    }
}

fn shape(df: &DataFrame) -> (usize, usize) {
    (df.height(), df.width())
}

/// Run the pipeline described by the config file at `config_path`
pub fn run_pipeline(config_path: &Path, target_override: Option<&str>) -> Result<RunOutcome> {
    Pipeline::from_path(config_path, target_override)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, PipelineError};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_csv(dir: &TempDir, rows: usize) -> PathBuf {
        let mut contents = String::from("pm25,no2,Air Quality\n");
        for i in 0..rows {
            let label = if i % 2 == 0 { "Good" } else { "Poor" };
            let base = if i % 2 == 0 { 10.0 } else { 80.0 };
            contents.push_str(&format!(
                "{},{},{}\n",
                base + (i % 7) as f64,
                base / 2.0 + (i % 5) as f64,
                label
            ));
        }
        let path = dir.path().join("air.csv");
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn config_for(path: &Path, model: &str) -> PipelineConfig {
        PipelineConfig::parse(&serde_json::json!({
            "data_loader": { "file_path": path.to_string_lossy(), "file_type": "csv" },
            "transformation": { "normalize": true, "scaling_method": "minmax" },
            "model": { "type": model },
            "splitting": { "test_size": 0.2, "random_state": 42 }
        }))
        .unwrap()
    }

    #[test]
    fn test_run_end_to_end() {
        let dir = TempDir::new().unwrap();
        let csv = write_csv(&dir, 50);

        for model in ["logistic", "decisiontree"] {
            let outcome = Pipeline::from_config(config_for(&csv, model)).run().unwrap();

            assert_eq!(outcome.rows_loaded, 50);
            assert_eq!(outcome.train_shape, (40, 2));
            assert_eq!(outcome.test_shape, (10, 2));
            assert_eq!(outcome.predictions.len(), 10);
            assert_eq!(outcome.classes, vec!["Good", "Poor"]);
            assert!(outcome.metrics.accuracy > 0.9);
            assert!(outcome
                .predicted_labels()
                .iter()
                .all(|l| *l == "Good" || *l == "Poor"));
        }
    }

    #[test]
    fn test_stages_match_full_run() {
        let dir = TempDir::new().unwrap();
        let csv = write_csv(&dir, 40);
        let pipeline = Pipeline::from_config(config_for(&csv, "decisiontree"));

        let df = pipeline.load().unwrap();
        let mut model = pipeline.build_model().unwrap();
        let split = pipeline.preprocess(&df).unwrap();
        pipeline.train(&mut model, &split).unwrap();
        let predictions = pipeline.predict(&model, &split).unwrap();
        let staged = pipeline
            .outcome(df.height(), &split, &model, predictions, StepTimings::default())
            .unwrap();

        let full = pipeline.run().unwrap();
        assert_eq!(staged.predictions, full.predictions);
        assert_eq!(staged.y_test, full.y_test);
        assert_eq!(staged.test_shape, full.test_shape);
        assert_eq!(staged.model, full.model);
    }

    #[test]
    fn test_unknown_hyperparameter_rejected_by_build_model() {
        let config = PipelineConfig::parse(&serde_json::json!({
            "data_loader": { "file_path": "/definitely/not/here.csv", "file_type": "csv" },
            "transformation": { "normalize": true, "scaling_method": "minmax" },
            "model": { "type": "decisiontree", "params": { "depth": 3 } },
            "splitting": { "test_size": 0.2, "random_state": 42 }
        }))
        .unwrap();

        let err = Pipeline::from_config(config).build_model().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigValidation);
    }

    #[test]
    fn test_missing_data_file() {
        let config = config_for(Path::new("/definitely/not/here.csv"), "logistic");
        let err = Pipeline::from_config(config).run().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataAccess);
    }

    #[test]
    fn test_missing_target_column() {
        let dir = TempDir::new().unwrap();
        let csv = write_csv(&dir, 10);
        let config = config_for(&csv, "logistic")
            .with_target_column("Label")
            .unwrap();

        let err = Pipeline::from_config(config).run().unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn(ref c) if c == "Label"));
    }
}
