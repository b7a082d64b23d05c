//! Tests for config file loading and schema validation

use aqpipe::config::*;
use aqpipe::error::{ErrorKind, PipelineError, Violation};
use serde_json::json;
use tempfile::TempDir;

#[path = "common/mod.rs"]
mod common;

use common::*;

fn valid_document() -> serde_json::Value {
    json!({
        "data_loader": { "file_path": "data/air.csv", "file_type": "csv" },
        "transformation": { "normalize": true, "scaling_method": "minmax" },
        "model": { "type": "logistic", "params": { "max_iter": 200 } },
        "splitting": { "test_size": 0.2, "random_state": 42 }
    })
}

#[test]
fn test_defaults_applied() {
    let cfg = PipelineConfig::parse(&valid_document()).unwrap();

    assert_eq!(cfg.data_loader().target_column(), DEFAULT_TARGET_COLUMN);
    assert_eq!(cfg.transformation().non_numeric(), NonNumericPolicy::Reject);
    assert_eq!(cfg.transformation().scaling_method(), ScalingMethod::MinMax);
    assert_eq!(cfg.model().params().get("max_iter"), Some(&ParamValue::Int(200)));
}

#[test]
fn test_every_violation_reported_at_once() {
    let doc = json!({
        "data_loader": { "file_type": "xml" },
        "transformation": { "normalize": "yes", "scaling_method": "standard" },
        "model": { "type": "svm" },
        "splitting": { "test_size": 1.0, "random_state": -3 }
    });

    let err = PipelineConfig::parse(&doc).unwrap_err();

    for field in [
        "data_loader.file_path",
        "data_loader.file_type",
        "transformation.normalize",
        "model.type",
        "splitting.test_size",
        "splitting.random_state",
    ] {
        assert!(err.has_field(field), "expected a violation for {}: {}", field, err);
    }
    assert_eq!(err.violations.len(), 6);
    assert!(err
        .violations
        .iter()
        .any(|v| matches!(v, Violation::InvalidEnum { value, .. } if value == "svm")));
}

#[test]
fn test_round_trip_through_value() {
    let cfg = PipelineConfig::parse(&valid_document()).unwrap();
    let reparsed = PipelineConfig::parse(&cfg.to_value()).unwrap();
    assert_eq!(cfg, reparsed);
}

#[test]
fn test_yaml_file_with_target_override() {
    let dir = TempDir::new().unwrap();
    let yaml = pipeline_yaml(&dir.path().join("air.csv"), "csv", "decisiontree", "standard");
    let path = write_config(dir.path(), &yaml);

    let cfg = load_config(&path).unwrap().with_target_column("Label").unwrap();

    assert_eq!(cfg.model().kind(), ModelKind::DecisionTree);
    assert_eq!(cfg.data_loader().target_column(), "Label");
}

#[test]
fn test_invalid_yaml_reports_malformed_input() {
    let dir = TempDir::new().unwrap();
    let path = write_config(dir.path(), "data_loader: [unclosed\n");

    let err = load_config(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
}

#[test]
fn test_schema_errors_surface_as_config_validation() {
    let dir = TempDir::new().unwrap();
    let path = write_json(dir.path(), "pipeline.json", &json!({ "model": { "type": "logistic" } }));

    let err = load_config(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigValidation);
    match err {
        PipelineError::Config(cfg_err) => {
            assert!(cfg_err.has_field("data_loader"));
            assert!(cfg_err.has_field("splitting"));
        }
        other => panic!("expected a config error, got {:?}", other),
    }
}

#[test]
fn test_enum_parsing_is_exact() {
    assert_eq!("csv".parse::<FileType>().unwrap(), FileType::Csv);
    let err = "CSV".parse::<FileType>().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedKind);
}
