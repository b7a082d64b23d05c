//! Validated pipeline configuration.
//!
//! [`PipelineConfig::parse`] is the only way to obtain a config: it walks the
//! raw mapping once, collects every violation, and only builds the config
//! when none were found. All fields are private so a constructed value can
//! never hold an out-of-range value.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ConfigValidationError, PipelineError, Violation};

/// Target column used when the configuration does not name one
pub const DEFAULT_TARGET_COLUMN: &str = "Air Quality";

macro_rules! config_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $family:literal { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            /// Every accepted spelling, in declaration order
            pub const ALLOWED: &'static [&'static str] = &[$($text),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = PipelineError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(PipelineError::UnsupportedKind {
                        family: $family,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

config_enum!(
    /// Dataset file format
    FileType, "file type" { Csv => "csv", Json => "json" }
);

config_enum!(
    /// Feature scaling policy applied when `normalize` is set
    ScalingMethod, "scaling method" { Standard => "standard", MinMax => "minmax" }
);

config_enum!(
    /// Model family
    ModelKind, "model type" { Logistic => "logistic", DecisionTree => "decisiontree" }
);

config_enum!(
    /// What scaling does with feature columns that are not numeric.
    ///
    /// `Reject` fails the run with `NonNumericFeature`; `Passthrough` leaves
    /// the column untouched (the model will still refuse it at training).
    NonNumericPolicy, "non-numeric policy" { Reject => "reject", Passthrough => "passthrough" }
);

/// A single scalar hyperparameter value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(x) => write!(f, "{}", x),
            ParamValue::Str(s) => write!(f, "'{}'", s),
        }
    }
}

/// Open hyperparameter mapping, interpreted by the chosen model
pub type Hyperparameters = BTreeMap<String, ParamValue>;

/// Where the dataset comes from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSourceConfig {
    file_path: String,
    file_type: FileType,
    target_column: String,
}

impl DataSourceConfig {
    pub fn file_path(&self) -> &Path {
        Path::new(&self.file_path)
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    pub fn target_column(&self) -> &str {
        &self.target_column
    }
}

/// Feature transformation settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformConfig {
    normalize: bool,
    scaling_method: ScalingMethod,
    non_numeric: NonNumericPolicy,
}

impl TransformConfig {
    pub fn normalize(&self) -> bool {
        self.normalize
    }

    pub fn scaling_method(&self) -> ScalingMethod {
        self.scaling_method
    }

    pub fn non_numeric(&self) -> NonNumericPolicy {
        self.non_numeric
    }
}

/// Model choice plus its raw hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelConfig {
    #[serde(rename = "type")]
    kind: ModelKind,
    params: Hyperparameters,
}

impl ModelConfig {
    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn params(&self) -> &Hyperparameters {
        &self.params
    }
}

/// Train/test split settings. `test_size` is strictly inside (0, 1).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitConfig {
    test_size: f64,
    random_state: u64,
}

impl SplitConfig {
    pub fn test_size(&self) -> f64 {
        self.test_size
    }

    pub fn random_state(&self) -> u64 {
        self.random_state
    }
}

/// Root configuration of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineConfig {
    data_loader: DataSourceConfig,
    transformation: TransformConfig,
    model: ModelConfig,
    splitting: SplitConfig,
}

impl PipelineConfig {
    /// Validate a raw configuration mapping.
    ///
    /// Every field is checked independently and all violations are returned
    /// together; a config is produced only when the list is empty.
    pub fn parse(raw: &Value) -> Result<Self, ConfigValidationError> {
        let mut v = Validator::default();

        let root = v.root(raw);
        let loader = root.and_then(|r| v.section(r, "data_loader"));
        let transform = root.and_then(|r| v.section(r, "transformation"));
        let model = root.and_then(|r| v.section(r, "model"));
        let split = root.and_then(|r| v.section(r, "splitting"));

        let file_path = loader.and_then(|s| v.string(s, "data_loader", "file_path"));
        let file_type = loader.and_then(|s| v.enumeration::<FileType>(s, "data_loader", "file_type"));
        let target_column = match loader {
            Some(s) if s.contains_key("target_column") => {
                v.string(s, "data_loader", "target_column")
            }
            _ => Some(DEFAULT_TARGET_COLUMN.to_string()),
        };

        let normalize = transform.and_then(|s| v.boolean(s, "transformation", "normalize"));
        let scaling_method = transform
            .and_then(|s| v.enumeration::<ScalingMethod>(s, "transformation", "scaling_method"));
        let non_numeric = match transform {
            Some(s) if s.contains_key("non_numeric") => {
                v.enumeration::<NonNumericPolicy>(s, "transformation", "non_numeric")
            }
            _ => Some(NonNumericPolicy::Reject),
        };

        let kind = model.and_then(|s| v.enumeration::<ModelKind>(s, "model", "type"));
        let params = match model {
            Some(s) if s.contains_key("params") => v.params(s),
            _ => Some(Hyperparameters::new()),
        };

        let test_size = split.and_then(|s| v.fraction(s, "splitting", "test_size"));
        let random_state = split.and_then(|s| v.seed(s, "splitting", "random_state"));

        if !v.violations.is_empty() {
            return Err(ConfigValidationError {
                violations: v.violations,
            });
        }

        // Every field is Some once no violation was recorded
        match (
            file_path,
            file_type,
            target_column,
            normalize,
            scaling_method,
            non_numeric,
            kind,
            params,
            test_size,
            random_state,
        ) {
            (
                Some(file_path),
                Some(file_type),
                Some(target_column),
                Some(normalize),
                Some(scaling_method),
                Some(non_numeric),
                Some(kind),
                Some(params),
                Some(test_size),
                Some(random_state),
            ) => Ok(Self {
                data_loader: DataSourceConfig {
                    file_path,
                    file_type,
                    target_column,
                },
                transformation: TransformConfig {
                    normalize,
                    scaling_method,
                    non_numeric,
                },
                model: ModelConfig { kind, params },
                splitting: SplitConfig {
                    test_size,
                    random_state,
                },
            }),
            _ => Err(ConfigValidationError {
                violations: vec![Violation::Missing {
                    field: "<root>".to_string(),
                }],
            }),
        }
    }

    /// Serialize back into the raw mapping layout accepted by [`parse`](Self::parse)
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Replace the target column (e.g. from a CLI override)
    pub fn with_target_column(mut self, target: impl Into<String>) -> Result<Self, ConfigValidationError> {
        let target = target.into();
        if target.trim().is_empty() {
            return Err(ConfigValidationError {
                violations: vec![Violation::WrongType {
                    field: "data_loader.target_column".to_string(),
                    expected: "a non-empty string",
                }],
            });
        }
        self.data_loader.target_column = target;
        Ok(self)
    }

    pub fn data_loader(&self) -> &DataSourceConfig {
        &self.data_loader
    }

    pub fn transformation(&self) -> &TransformConfig {
        &self.transformation
    }

    pub fn model(&self) -> &ModelConfig {
        &self.model
    }

    pub fn splitting(&self) -> &SplitConfig {
        &self.splitting
    }
}

/// Accumulates violations while reading fields out of the raw mapping
#[derive(Default)]
struct Validator {
    violations: Vec<Violation>,
}

impl Validator {
    fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    fn root<'a>(&mut self, raw: &'a Value) -> Option<&'a Map<String, Value>> {
        match raw.as_object() {
            Some(map) => Some(map),
            None => {
                self.push(Violation::WrongType {
                    field: "<root>".to_string(),
                    expected: "a mapping",
                });
                None
            }
        }
    }

    fn section<'a>(
        &mut self,
        root: &'a Map<String, Value>,
        name: &str,
    ) -> Option<&'a Map<String, Value>> {
        match root.get(name) {
            None | Some(Value::Null) => {
                self.push(Violation::Missing {
                    field: name.to_string(),
                });
                None
            }
            Some(Value::Object(map)) => Some(map),
            Some(_) => {
                self.push(Violation::WrongType {
                    field: name.to_string(),
                    expected: "a mapping",
                });
                None
            }
        }
    }

    fn field<'a>(
        &mut self,
        section: &'a Map<String, Value>,
        prefix: &str,
        key: &str,
    ) -> Option<&'a Value> {
        match section.get(key) {
            None | Some(Value::Null) => {
                self.push(Violation::Missing {
                    field: format!("{}.{}", prefix, key),
                });
                None
            }
            Some(value) => Some(value),
        }
    }

    fn string(&mut self, section: &Map<String, Value>, prefix: &str, key: &str) -> Option<String> {
        let value = self.field(section, prefix, key)?;
        match value.as_str() {
            Some(s) if !s.trim().is_empty() => Some(s.to_string()),
            _ => {
                self.push(Violation::WrongType {
                    field: format!("{}.{}", prefix, key),
                    expected: "a non-empty string",
                });
                None
            }
        }
    }

    fn boolean(&mut self, section: &Map<String, Value>, prefix: &str, key: &str) -> Option<bool> {
        let value = self.field(section, prefix, key)?;
        match value.as_bool() {
            Some(b) => Some(b),
            None => {
                self.push(Violation::WrongType {
                    field: format!("{}.{}", prefix, key),
                    expected: "a boolean",
                });
                None
            }
        }
    }

    fn enumeration<T>(&mut self, section: &Map<String, Value>, prefix: &str, key: &str) -> Option<T>
    where
        T: FromStr + EnumField,
    {
        let value = self.field(section, prefix, key)?;
        let field = format!("{}.{}", prefix, key);
        let Some(text) = value.as_str() else {
            self.push(Violation::WrongType {
                field,
                expected: "a string",
            });
            return None;
        };
        match text.parse::<T>() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                self.push(Violation::InvalidEnum {
                    field,
                    value: text.to_string(),
                    allowed: T::allowed(),
                });
                None
            }
        }
    }

    fn fraction(&mut self, section: &Map<String, Value>, prefix: &str, key: &str) -> Option<f64> {
        let value = self.field(section, prefix, key)?;
        let field = format!("{}.{}", prefix, key);
        let Some(x) = value.as_f64() else {
            self.push(Violation::WrongType {
                field,
                expected: "a number",
            });
            return None;
        };
        if x > 0.0 && x < 1.0 {
            Some(x)
        } else {
            self.push(Violation::OutOfRange {
                field,
                value: x.to_string(),
                range: "(0.0, 1.0) exclusive",
            });
            None
        }
    }

    fn seed(&mut self, section: &Map<String, Value>, prefix: &str, key: &str) -> Option<u64> {
        let value = self.field(section, prefix, key)?;
        let field = format!("{}.{}", prefix, key);
        if let Some(seed) = value.as_u64() {
            return Some(seed);
        }
        if let Some(negative) = value.as_i64() {
            self.push(Violation::OutOfRange {
                field,
                value: negative.to_string(),
                range: "[0, 2^64)",
            });
        } else {
            self.push(Violation::WrongType {
                field,
                expected: "an integer",
            });
        }
        None
    }

    fn params(&mut self, section: &Map<String, Value>) -> Option<Hyperparameters> {
        let map = match section.get("params") {
            None | Some(Value::Null) => return Some(Hyperparameters::new()),
            Some(Value::Object(map)) => map,
            Some(_) => {
                self.push(Violation::WrongType {
                    field: "model.params".to_string(),
                    expected: "a mapping",
                });
                return None;
            }
        };

        let mut params = Hyperparameters::new();
        let mut ok = true;
        for (name, value) in map {
            let parsed = match value {
                Value::Bool(b) => Some(ParamValue::Bool(*b)),
                Value::Number(n) => match n.as_i64() {
                    Some(i) => Some(ParamValue::Int(i)),
                    None => n.as_f64().map(ParamValue::Float),
                },
                Value::String(s) => Some(ParamValue::Str(s.clone())),
                _ => None,
            };
            match parsed {
                Some(p) => {
                    params.insert(name.clone(), p);
                }
                None => {
                    ok = false;
                    self.push(Violation::WrongType {
                        field: format!("model.params.{}", name),
                        expected: "a scalar (bool, number or string)",
                    });
                }
            }
        }
        ok.then_some(params)
    }
}

/// Enums that can report their accepted values to the validator
trait EnumField {
    fn allowed() -> &'static [&'static str];
}

impl EnumField for FileType {
    fn allowed() -> &'static [&'static str] {
        Self::ALLOWED
    }
}

impl EnumField for ScalingMethod {
    fn allowed() -> &'static [&'static str] {
        Self::ALLOWED
    }
}

impl EnumField for ModelKind {
    fn allowed() -> &'static [&'static str] {
        Self::ALLOWED
    }
}

impl EnumField for NonNumericPolicy {
    fn allowed() -> &'static [&'static str] {
        Self::ALLOWED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_raw() -> Value {
        json!({
            "data_loader": { "file_path": "data/air.csv", "file_type": "csv" },
            "transformation": { "normalize": true, "scaling_method": "minmax" },
            "model": { "type": "logistic" },
            "splitting": { "test_size": 0.2, "random_state": 42 }
        })
    }

    #[test]
    fn test_parse_valid_config() {
        let cfg = PipelineConfig::parse(&valid_raw()).unwrap();

        assert_eq!(cfg.data_loader().file_path(), Path::new("data/air.csv"));
        assert_eq!(cfg.data_loader().file_type(), FileType::Csv);
        assert_eq!(cfg.data_loader().target_column(), DEFAULT_TARGET_COLUMN);
        assert!(cfg.transformation().normalize());
        assert_eq!(cfg.transformation().scaling_method(), ScalingMethod::MinMax);
        assert_eq!(cfg.transformation().non_numeric(), NonNumericPolicy::Reject);
        assert_eq!(cfg.model().kind(), ModelKind::Logistic);
        assert!(cfg.model().params().is_empty());
        assert_eq!(cfg.splitting().test_size(), 0.2);
        assert_eq!(cfg.splitting().random_state(), 42);
    }

    #[test]
    fn test_parse_collects_all_violations() {
        let raw = json!({
            "data_loader": { "file_path": "data/air.csv", "file_type": "xml" },
            "transformation": { "normalize": "yes", "scaling_method": "robust" },
            "model": { "type": "svm" },
            "splitting": { "test_size": 1.0 }
        });

        let err = PipelineConfig::parse(&raw).unwrap_err();

        assert_eq!(err.violations.len(), 6);
        assert!(err.has_field("data_loader.file_type"));
        assert!(err.has_field("transformation.normalize"));
        assert!(err.has_field("transformation.scaling_method"));
        assert!(err.has_field("model.type"));
        assert!(err.has_field("splitting.test_size"));
        assert!(err.has_field("splitting.random_state"));
    }

    #[test]
    fn test_parse_missing_sections() {
        let err = PipelineConfig::parse(&json!({ "model": { "type": "logistic" } })).unwrap_err();

        assert!(err.has_field("data_loader"));
        assert!(err.has_field("transformation"));
        assert!(err.has_field("splitting"));
        assert!(!err.has_field("model.type"));
    }

    #[test]
    fn test_parse_rejects_non_mapping_root() {
        let err = PipelineConfig::parse(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert!(err.has_field("<root>"));
    }

    #[test]
    fn test_enum_matching_is_case_sensitive() {
        let mut raw = valid_raw();
        raw["data_loader"]["file_type"] = json!("CSV");

        let err = PipelineConfig::parse(&raw).unwrap_err();
        assert!(matches!(
            &err.violations[0],
            Violation::InvalidEnum { value, .. } if value == "CSV"
        ));
    }

    #[test]
    fn test_test_size_bounds_are_exclusive() {
        for bad in [0.0, 1.0, -0.1, 1.5] {
            let mut raw = valid_raw();
            raw["splitting"]["test_size"] = json!(bad);
            let err = PipelineConfig::parse(&raw).unwrap_err();
            assert!(err.has_field("splitting.test_size"), "{} should be rejected", bad);
        }
        for good in [0.001, 0.5, 0.999] {
            let mut raw = valid_raw();
            raw["splitting"]["test_size"] = json!(good);
            assert!(PipelineConfig::parse(&raw).is_ok(), "{} should be accepted", good);
        }
    }

    #[test]
    fn test_negative_seed_is_out_of_range() {
        let mut raw = valid_raw();
        raw["splitting"]["random_state"] = json!(-3);

        let err = PipelineConfig::parse(&raw).unwrap_err();
        assert!(matches!(err.violations[0], Violation::OutOfRange { .. }));
    }

    #[test]
    fn test_params_must_be_scalars() {
        let mut raw = valid_raw();
        raw["model"]["params"] = json!({ "max_iter": 50, "layers": [1, 2] });

        let err = PipelineConfig::parse(&raw).unwrap_err();
        assert!(err.has_field("model.params.layers"));
    }

    #[test]
    fn test_round_trip() {
        let mut raw = valid_raw();
        raw["data_loader"]["target_column"] = json!("label");
        raw["transformation"]["non_numeric"] = json!("passthrough");
        raw["model"]["params"] = json!({ "max_iter": 50, "learning_rate": 0.05, "fit_intercept": false });

        let cfg = PipelineConfig::parse(&raw).unwrap();
        let again = PipelineConfig::parse(&cfg.to_value()).unwrap();

        assert_eq!(cfg, again);
    }

    #[test]
    fn test_with_target_column_override() {
        let cfg = PipelineConfig::parse(&valid_raw()).unwrap();

        let cfg = cfg.with_target_column("label").unwrap();
        assert_eq!(cfg.data_loader().target_column(), "label");
        assert!(cfg.with_target_column("  ").is_err());
    }

    #[test]
    fn test_from_str_reports_unsupported_kind() {
        let err = "xml".parse::<FileType>().unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedKind { family: "file type", .. }));
        assert_eq!("decisiontree".parse::<ModelKind>().unwrap(), ModelKind::DecisionTree);
    }
}
