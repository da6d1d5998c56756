//! Core data models for single-row inference

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of problem a predictor was trained for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    Regression,
    Classification,
}

/// Class identifier produced by a classifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassLabel {
    Index(i64),
    Name(String),
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassLabel::Index(i) => write!(f, "{}", i),
            ClassLabel::Name(name) => f.write_str(name),
        }
    }
}

/// Predicted label: a number for regression, a class for classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Label {
    Value(f64),
    Class(ClassLabel),
}

impl Label {
    pub fn task(&self) -> Task {
        match self {
            Label::Value(_) => Task::Regression,
            Label::Class(_) => Task::Classification,
        }
    }

    pub fn as_value(&self) -> Option<f64> {
        match self {
            Label::Value(v) => Some(*v),
            Label::Class(_) => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassLabel> {
        match self {
            Label::Class(c) => Some(c),
            Label::Value(_) => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Value(v) => write!(f, "{}", v),
            Label::Class(c) => write!(f, "{}", c),
        }
    }
}

/// One entry of a class probability distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassProbability {
    pub class: ClassLabel,
    pub probability: f64,
}

impl ClassProbability {
    pub fn new(class: ClassLabel, probability: f64) -> Self {
        Self { class, probability }
    }
}

/// Wire shape of a [`FeatureRecord`], checked before it becomes one
#[derive(Deserialize)]
struct RecordDef {
    columns: Vec<String>,
    values: Vec<f64>,
}

impl TryFrom<RecordDef> for FeatureRecord {
    type Error = String;

    fn try_from(def: RecordDef) -> Result<Self, Self::Error> {
        if def.columns.len() != def.values.len() {
            return Err(format!(
                "record has {} columns but {} values",
                def.columns.len(),
                def.values.len()
            ));
        }
        Ok(Self {
            columns: def.columns,
            values: def.values,
        })
    }
}

/// One assignment of values to a schema's slots, in schema order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RecordDef")]
pub struct FeatureRecord {
    columns: Vec<String>,
    values: Vec<f64>,
}

impl FeatureRecord {
    /// Only the record builder assembles records so column order always
    /// follows a schema.
    pub(crate) fn from_parts(columns: Vec<String>, values: Vec<f64>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|idx| self.values.get(idx).copied())
    }

    /// Iterate `(column, value)` pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Structured output of a single prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub task: Task,
    pub label: Label,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub probabilities: Option<Vec<ClassProbability>>,
    /// The record the prediction was made from
    pub record: FeatureRecord,
    pub model_version: String,
    pub latency_us: u64,
    pub generated_at: i64,
}

impl PredictionResult {
    /// Probability of the predicted class, when a distribution is present
    pub fn confidence(&self) -> Option<f64> {
        let class = self.label.as_class()?;
        self.probabilities
            .as_ref()?
            .iter()
            .find(|p| &p.class == class)
            .map(|p| p.probability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_serialization_is_tagged() {
        let value = serde_json::to_value(Label::Value(250000.0)).unwrap();
        assert_eq!(value["kind"], "value");
        assert_eq!(value["value"], 250000.0);

        let class = serde_json::to_value(Label::Class(ClassLabel::Index(1))).unwrap();
        assert_eq!(class["kind"], "class");
        assert_eq!(class["value"], 1);

        let back: Label = serde_json::from_value(class).unwrap();
        assert_eq!(back, Label::Class(ClassLabel::Index(1)));
    }

    #[test]
    fn test_label_task() {
        assert_eq!(Label::Value(1.0).task(), Task::Regression);
        assert_eq!(
            Label::Class(ClassLabel::Name("barolo".to_string())).task(),
            Task::Classification
        );
    }

    #[test]
    fn test_record_lookup() {
        let record = FeatureRecord::from_parts(
            vec!["A".to_string(), "B".to_string()],
            vec![1.0, 2.0],
        );
        assert_eq!(record.get("B"), Some(2.0));
        assert_eq!(record.get("C"), None);
        let pairs: Vec<_> = record.iter().collect();
        assert_eq!(pairs, vec![("A", 1.0), ("B", 2.0)]);
    }

    #[test]
    fn test_record_deserialization_checks_lengths() {
        let ragged = serde_json::from_str::<FeatureRecord>(r#"{"columns": ["A", "B"], "values": [1.0]}"#);
        let err = ragged.unwrap_err().to_string();
        assert!(err.contains("2 columns but 1 values"));

        let record: FeatureRecord =
            serde_json::from_str(r#"{"columns": ["A", "B"], "values": [1.0, 2.0]}"#).unwrap();
        assert_eq!(record.get("B"), Some(2.0));
    }

    #[test]
    fn test_ragged_prediction_payload_is_rejected() {
        let body = r#"{
            "task": "regression",
            "label": {"kind": "value", "value": 1.0},
            "record": {"columns": ["A", "B"], "values": [1.0]},
            "model_version": "m",
            "latency_us": 1,
            "generated_at": 0
        }"#;
        assert!(serde_json::from_str::<PredictionResult>(body).is_err());
    }

    #[test]
    fn test_confidence_picks_predicted_class() {
        let result = PredictionResult {
            task: Task::Classification,
            label: Label::Class(ClassLabel::Index(1)),
            probabilities: Some(vec![
                ClassProbability::new(ClassLabel::Index(0), 0.1),
                ClassProbability::new(ClassLabel::Index(1), 0.7),
                ClassProbability::new(ClassLabel::Index(2), 0.2),
            ]),
            record: FeatureRecord::from_parts(vec![], vec![]),
            model_version: "test".to_string(),
            latency_us: 0,
            generated_at: 0,
        };
        assert_eq!(result.confidence(), Some(0.7));
    }
}
