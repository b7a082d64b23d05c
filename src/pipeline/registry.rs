//! Name -> implementation lookup for loaders and models
//!
//! Both capability sets are closed enums, so every configured kind has an
//! implementation. The `*_for_name` entry points accept raw strings and
//! report unknown names as `UnsupportedKind`.

use tracing::debug;

use super::json::JsonLoader;
use super::loader::{AnyLoader, CsvLoader};
use crate::config::{FileType, Hyperparameters, ModelKind};
use crate::error::Result;
use crate::model::{AnyModel, DecisionTreeModel, LogisticModel, LogisticParams, TreeParams};

/// Loader for a configured file type
pub fn resolve_loader(file_type: FileType) -> AnyLoader {
    match file_type {
        FileType::Csv => AnyLoader::Csv(CsvLoader::default()),
        FileType::Json => AnyLoader::Json(JsonLoader),
    }
}

/// Loader for a raw file type name such as `"csv"`
pub fn loader_for_name(name: &str) -> Result<AnyLoader> {
    Ok(resolve_loader(name.parse()?))
}

/// Fresh, untrained model for a configured kind.
///
/// Hyperparameters are validated here; an unknown key or bad value fails
/// with `InvalidHyperparameter`.
pub fn resolve_model(kind: ModelKind, params: &Hyperparameters) -> Result<AnyModel> {
    let model = match kind {
        ModelKind::Logistic => AnyModel::Logistic(LogisticModel::new(LogisticParams::from_params(params)?)),
        ModelKind::DecisionTree => {
            AnyModel::DecisionTree(DecisionTreeModel::new(TreeParams::from_params(params)?))
        }
    };
    debug!(kind = %kind, "resolved model");
    Ok(model)
}

/// Model for a raw model name such as `"logistic"`
pub fn model_for_name(name: &str, params: &Hyperparameters) -> Result<AnyModel> {
    resolve_model(name.parse()?, params)
}
