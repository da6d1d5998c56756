//! Feature schemas
//!
//! A schema is the fixed, ordered list of named feature slots a predictor
//! was trained on. Records are always assembled by walking the schema, never
//! by the order of the caller's input.

mod presets;

pub use presets::{AppKind, AppPreset};

use crate::error::{AdapterError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Numeric type of a feature slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Integer,
    Float,
}

/// A single named slot in a schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSlot {
    pub name: String,
    pub kind: FeatureKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Human-readable form label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Initial value shown in forms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

impl FeatureSlot {
    pub fn new(name: impl Into<String>, kind: FeatureKind) -> Self {
        Self {
            name: name.into(),
            kind,
            min: None,
            max: None,
            label: None,
            default: None,
            step: None,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FeatureKind::Integer)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FeatureKind::Float)
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn default_value(mut self, value: f64) -> Self {
        self.default = Some(value);
        self
    }

    /// Label to show in forms, falling back to the column name
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Whether `value` satisfies the declared bounds
    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AdapterError::InvalidSchema(
                "feature names must not be empty".to_string(),
            ));
        }
        for (which, bound) in [("min", self.min), ("max", self.max)] {
            if let Some(b) = bound {
                if !b.is_finite() {
                    return Err(AdapterError::InvalidSchema(format!(
                        "'{}' has a non-finite {} bound",
                        self.name, which
                    )));
                }
            }
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(AdapterError::InvalidSchema(format!(
                    "'{}' has min {} greater than max {}",
                    self.name, min, max
                )));
            }
        }
        if let Some(default) = self.default {
            if !self.contains(default) {
                return Err(AdapterError::InvalidSchema(format!(
                    "'{}' default {} is outside its bounds",
                    self.name, default
                )));
            }
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct SchemaDef {
    features: Vec<FeatureSlot>,
}

impl TryFrom<SchemaDef> for FeatureSchema {
    type Error = AdapterError;

    fn try_from(def: SchemaDef) -> Result<Self> {
        FeatureSchema::new(def.features)
    }
}

/// Ordered set of named, typed feature slots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SchemaDef")]
pub struct FeatureSchema {
    features: Vec<FeatureSlot>,
}

impl FeatureSchema {
    /// Create a schema, enforcing non-empty, unique names and sane bounds
    pub fn new(features: Vec<FeatureSlot>) -> Result<Self> {
        if features.is_empty() {
            return Err(AdapterError::InvalidSchema(
                "schema must declare at least one feature".to_string(),
            ));
        }
        let mut seen = HashSet::with_capacity(features.len());
        for slot in &features {
            slot.validate()?;
            if !seen.insert(slot.name.as_str()) {
                return Err(AdapterError::InvalidSchema(format!(
                    "duplicate feature '{}'",
                    slot.name
                )));
            }
        }
        Ok(Self { features })
    }

    /// Load a schema from a JSON file of the form `{"features": [...]}`
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AdapterError::InvalidSchema(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            AdapterError::InvalidSchema(format!("cannot parse {}: {}", path.display(), e))
        })
    }

    pub fn slots(&self) -> &[FeatureSlot] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|s| s.name.as_str())
    }

    pub fn slot(&self, name: &str) -> Option<&FeatureSlot> {
        self.features.iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slot(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_rejects_empty_schema() {
        assert!(matches!(
            FeatureSchema::new(vec![]),
            Err(AdapterError::InvalidSchema(_))
        ));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let err = FeatureSchema::new(vec![FeatureSlot::float("a"), FeatureSlot::integer("a")])
            .unwrap_err();
        assert!(err.to_string().contains("duplicate feature 'a'"));
    }

    #[test]
    fn test_rejects_inverted_range() {
        let err = FeatureSchema::new(vec![FeatureSlot::integer("q").range(10.0, 1.0)]).unwrap_err();
        assert!(matches!(err, AdapterError::InvalidSchema(_)));
    }

    #[test]
    fn test_rejects_default_outside_bounds() {
        let err = FeatureSchema::new(vec![FeatureSlot::integer("q")
            .range(1.0, 10.0)
            .default_value(11.0)])
        .unwrap_err();
        assert!(err.to_string().contains("default"));
    }

    #[test]
    fn test_preserves_declared_order() {
        let schema = FeatureSchema::new(vec![
            FeatureSlot::float("C"),
            FeatureSlot::float("A"),
            FeatureSlot::float("B"),
        ])
        .unwrap();
        let names: Vec<_> = schema.names().collect();
        assert_eq!(names, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_open_bounds() {
        let slot = FeatureSlot::float("GrLivArea").min(200.0);
        assert!(slot.contains(200.0));
        assert!(slot.contains(1e9));
        assert!(!slot.contains(199.9));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"features": [
                {{"name": "rooms", "kind": "integer", "min": 1, "max": 12, "default": 3}},
                {{"name": "area", "kind": "float", "label": "Floor area"}}
            ]}}"#
        )
        .unwrap();

        let schema = FeatureSchema::from_json_file(file.path()).unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.slots()[0].kind, FeatureKind::Integer);
        assert_eq!(schema.slots()[0].max, Some(12.0));
        assert_eq!(schema.slots()[1].display_label(), "Floor area");
    }

    #[test]
    fn test_from_json_file_validates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"features": [{{"name": "x", "kind": "float"}}, {{"name": "x", "kind": "float"}}]}}"#
        )
        .unwrap();
        assert!(matches!(
            FeatureSchema::from_json_file(file.path()),
            Err(AdapterError::InvalidSchema(_))
        ));
    }
}
