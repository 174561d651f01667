//! Runtime namespace snapshots
//!
//! A snapshot is the read-only `name -> value` view of the host namespace
//! taken after an execution. Values expose capabilities through traits
//! instead of being inspected for attributes.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

/// A fitted object that can produce predictions.
pub trait ModelLike: std::fmt::Debug + Send + Sync {
    fn type_name(&self) -> &str;

    fn params(&self) -> Option<&Map<String, Value>> {
        None
    }
}

/// `ModelLike` adapter for models described in a JSON snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct DescribedModel {
    type_name: String,
    params: Map<String, Value>,
}

impl DescribedModel {
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            params: Map::new(),
        }
    }

    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }
}

impl ModelLike for DescribedModel {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn params(&self) -> Option<&Map<String, Value>> {
        Some(&self.params)
    }
}

#[derive(Debug)]
pub enum RuntimeValue {
    Model(Box<dyn ModelLike>),
    /// A type object. Never model-like, even when it defines `predict`.
    Class { name: String, has_predict: bool },
    Scalar(f64),
    Mapping(IndexMap<String, f64>),
    Other { type_name: String },
}

impl RuntimeValue {
    pub fn model(model: impl ModelLike + 'static) -> Self {
        Self::Model(Box::new(model))
    }

    pub fn as_model(&self) -> Option<&dyn ModelLike> {
        match self {
            Self::Model(model) => Some(model.as_ref()),
            _ => None,
        }
    }

    pub fn is_type_object(&self) -> bool {
        matches!(self, Self::Class { .. })
    }

    pub fn type_name(&self) -> &str {
        match self {
            Self::Model(model) => model.type_name(),
            Self::Class { .. } => "type",
            Self::Scalar(_) => "float",
            Self::Mapping(_) => "dict",
            Self::Other { type_name } => type_name,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Failed to read snapshot '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid snapshot JSON: {0}")]
    ParseError(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum SnapshotEntry {
    Model {
        #[serde(rename = "type")]
        type_name: String,
        #[serde(default)]
        params: Map<String, Value>,
    },
    Class {
        name: String,
        #[serde(default)]
        has_predict: bool,
    },
    Scalar {
        value: f64,
    },
    Mapping {
        values: IndexMap<String, f64>,
    },
    Other {
        #[serde(rename = "type")]
        type_name: String,
    },
}

impl From<SnapshotEntry> for RuntimeValue {
    fn from(entry: SnapshotEntry) -> Self {
        match entry {
            SnapshotEntry::Model { type_name, params } => {
                RuntimeValue::model(DescribedModel::new(&type_name).with_params(params))
            }
            SnapshotEntry::Class { name, has_predict } => {
                RuntimeValue::Class { name, has_predict }
            }
            SnapshotEntry::Scalar { value } => RuntimeValue::Scalar(value),
            SnapshotEntry::Mapping { values } => RuntimeValue::Mapping(values),
            SnapshotEntry::Other { type_name } => RuntimeValue::Other { type_name },
        }
    }
}

#[derive(Debug, Default)]
pub struct Snapshot {
    values: IndexMap<String, RuntimeValue>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: RuntimeValue) {
        self.values.insert(name.to_string(), value);
    }

    pub fn with(mut self, name: &str, value: RuntimeValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&RuntimeValue> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuntimeValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn from_json_str(json: &str) -> Result<Self, SnapshotError> {
        let entries: IndexMap<String, SnapshotEntry> = serde_json::from_str(json)?;
        Ok(Self {
            values: entries
                .into_iter()
                .map(|(name, entry)| (name, entry.into()))
                .collect(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let content = std::fs::read_to_string(path).map_err(|e| SnapshotError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_json_preserves_order_and_kinds() {
        let json = r#"{
            "clf": {"kind": "model", "type": "LogisticRegression", "params": {"C": 1.0}},
            "LogisticRegression": {"kind": "class", "name": "LogisticRegression", "has_predict": true},
            "n_epochs": {"kind": "scalar", "value": 10},
            "scores": {"kind": "mapping", "values": {"acc": 0.9, "f1": 0.8}},
            "df": {"kind": "other", "type": "DataFrame"}
        }"#;

        let snapshot = Snapshot::from_json_str(json).unwrap();

        assert_eq!(
            snapshot.names().collect::<Vec<_>>(),
            vec!["clf", "LogisticRegression", "n_epochs", "scores", "df"]
        );
        let clf = snapshot.get("clf").unwrap().as_model().unwrap();
        assert_eq!(clf.type_name(), "LogisticRegression");
        assert_eq!(clf.params().unwrap()["C"], 1.0);
        assert!(snapshot.get("LogisticRegression").unwrap().is_type_object());
        assert!(snapshot.get("LogisticRegression").unwrap().as_model().is_none());
        assert!(matches!(
            snapshot.get("n_epochs"),
            Some(RuntimeValue::Scalar(v)) if *v == 10.0
        ));
        assert_eq!(snapshot.get("df").unwrap().type_name(), "DataFrame");
    }

    #[test]
    fn from_json_rejects_unknown_kind() {
        let result = Snapshot::from_json_str(r#"{"x": {"kind": "tensor"}}"#);

        assert!(matches!(result, Err(SnapshotError::ParseError(_))));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();

        let result = Snapshot::load(&dir.path().join("missing.json"));

        assert!(matches!(result, Err(SnapshotError::ReadError { .. })));
    }

    #[test]
    fn builder_style_construction() {
        let snapshot = Snapshot::new()
            .with("model", RuntimeValue::model(DescribedModel::new("SVC")))
            .with("n", RuntimeValue::Scalar(3.0));

        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.get("model").unwrap().as_model().is_some());
    }
}
