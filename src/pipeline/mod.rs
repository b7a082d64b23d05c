//! Pipeline module - loading, preprocessing and the end-to-end run

pub mod json;
pub mod loader;
pub mod orchestrator;
pub mod preprocess;
pub mod registry;
pub mod scaler;
pub mod target;

pub use json::{normalize_json, JsonLoader};
pub use loader::*;
pub use orchestrator::{run_pipeline, Pipeline, RunOutcome, StepTimings};
pub use preprocess::{shuffle_split_indices, Preprocessor, SplitResult};
pub use registry::{loader_for_name, model_for_name, resolve_loader, resolve_model};
pub use scaler::{ScaleParams, Scaler};
pub use target::LabelEncoder;
