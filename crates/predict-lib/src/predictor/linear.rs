//! Linear models stored as JSON artifacts
//!
//! A small, dependency-free artifact format for linear regressors and
//! multinomial (softmax) classifiers. The artifact records the feature
//! names it was fitted on, so column order can be checked against a schema.

use super::features::FeatureFrame;
use super::Predictor;
use crate::error::{AdapterError, Result};
use crate::models::{ClassLabel, ClassProbability, Label, Task};
use serde::{Deserialize, Serialize};

/// Serialized form of a linear model artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinearArtifact {
    LinearRegressor {
        feature_names: Vec<String>,
        coefficients: Vec<f64>,
        intercept: f64,
    },
    SoftmaxClassifier {
        feature_names: Vec<String>,
        classes: Vec<ClassLabel>,
        /// One coefficient row per class
        coefficients: Vec<Vec<f64>>,
        intercepts: Vec<f64>,
    },
}

impl LinearArtifact {
    fn feature_names(&self) -> &[String] {
        match self {
            LinearArtifact::LinearRegressor { feature_names, .. }
            | LinearArtifact::SoftmaxClassifier { feature_names, .. } => feature_names,
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        let width = self.feature_names().len();
        if width == 0 {
            return Err("model declares no features".to_string());
        }
        match self {
            LinearArtifact::LinearRegressor {
                coefficients,
                intercept,
                ..
            } => {
                if coefficients.len() != width {
                    return Err(format!(
                        "{} coefficients for {} features",
                        coefficients.len(),
                        width
                    ));
                }
                if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
                    return Err("non-finite parameter".to_string());
                }
            }
            LinearArtifact::SoftmaxClassifier {
                classes,
                coefficients,
                intercepts,
                ..
            } => {
                if classes.len() < 2 {
                    return Err("classifier needs at least two classes".to_string());
                }
                if coefficients.len() != classes.len() || intercepts.len() != classes.len() {
                    return Err(format!(
                        "{} classes but {} coefficient rows and {} intercepts",
                        classes.len(),
                        coefficients.len(),
                        intercepts.len()
                    ));
                }
                if let Some(row) = coefficients.iter().find(|row| row.len() != width) {
                    return Err(format!("coefficient row of {} for {} features", row.len(), width));
                }
                if intercepts.iter().chain(coefficients.iter().flatten()).any(|v| !v.is_finite()) {
                    return Err("non-finite parameter".to_string());
                }
            }
        }
        Ok(())
    }
}

/// Predictor backed by a [`LinearArtifact`]
#[derive(Debug, Clone)]
pub struct LinearModel {
    artifact: LinearArtifact,
    model_version: String,
}

impl LinearModel {
    pub fn new(artifact: LinearArtifact, model_version: impl Into<String>) -> std::result::Result<Self, String> {
        artifact.validate()?;
        Ok(Self {
            artifact,
            model_version: model_version.into(),
        })
    }

    /// Deserialize and validate a JSON artifact
    pub fn from_json(bytes: &[u8], model_version: impl Into<String>) -> std::result::Result<Self, String> {
        let artifact: LinearArtifact = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        Self::new(artifact, model_version)
    }

    fn check_width(&self, frame: &FeatureFrame<'_>) -> Result<()> {
        let expected = self.artifact.feature_names().len();
        if frame.width() != expected {
            return Err(AdapterError::SchemaMismatch(format!(
                "model expects {} columns, frame has {}",
                expected,
                frame.width()
            )));
        }
        Ok(())
    }

    fn softmax(&self, row: &[f64]) -> Option<Vec<f64>> {
        let LinearArtifact::SoftmaxClassifier {
            coefficients,
            intercepts,
            ..
        } = &self.artifact
        else {
            return None;
        };
        let logits: Vec<f64> = coefficients
            .iter()
            .zip(intercepts)
            .map(|(w, b)| dot(w, row) + b)
            .collect();
        // Shift by the max logit for numerical stability
        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
        let sum: f64 = exps.iter().sum();
        Some(exps.into_iter().map(|e| e / sum).collect())
    }
}

fn dot(weights: &[f64], row: &[f64]) -> f64 {
    weights.iter().zip(row).map(|(w, x)| w * x).sum()
}

impl Predictor for LinearModel {
    fn task(&self) -> Task {
        match self.artifact {
            LinearArtifact::LinearRegressor { .. } => Task::Regression,
            LinearArtifact::SoftmaxClassifier { .. } => Task::Classification,
        }
    }

    fn predict(&self, frame: &FeatureFrame<'_>) -> Result<Label> {
        self.check_width(frame)?;
        match &self.artifact {
            LinearArtifact::LinearRegressor {
                coefficients,
                intercept,
                ..
            } => Ok(Label::Value(dot(coefficients, frame.row()) + intercept)),
            LinearArtifact::SoftmaxClassifier { classes, .. } => {
                let probs = self
                    .softmax(frame.row())
                    .ok_or_else(|| AdapterError::Inference("not a classifier".to_string()))?;
                let best = probs
                    .iter()
                    .enumerate()
                    .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
                    .map(|(idx, _)| idx)
                    .unwrap_or(0);
                Ok(Label::Class(classes[best].clone()))
            }
        }
    }

    fn predict_probabilities(&self, frame: &FeatureFrame<'_>) -> Result<Option<Vec<ClassProbability>>> {
        self.check_width(frame)?;
        let LinearArtifact::SoftmaxClassifier { classes, .. } = &self.artifact else {
            return Ok(None);
        };
        let probs = self.softmax(frame.row()).unwrap_or_default();
        Ok(Some(
            classes
                .iter()
                .cloned()
                .zip(probs)
                .map(|(class, p)| ClassProbability::new(class, p))
                .collect(),
        ))
    }

    fn input_width(&self) -> Option<usize> {
        Some(self.artifact.feature_names().len())
    }

    fn feature_names(&self) -> Option<&[String]> {
        Some(self.artifact.feature_names())
    }

    fn classes(&self) -> Option<&[ClassLabel]> {
        match &self.artifact {
            LinearArtifact::SoftmaxClassifier { classes, .. } => Some(classes),
            LinearArtifact::LinearRegressor { .. } => None,
        }
    }

    fn model_version(&self) -> &str {
        &self.model_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::features::{build_record, RawValues};
    use crate::schema::{FeatureSchema, FeatureSlot};

    fn xy_schema() -> FeatureSchema {
        FeatureSchema::new(vec![FeatureSlot::float("x"), FeatureSlot::float("y")]).unwrap()
    }

    fn values(x: f64, y: f64) -> RawValues {
        [("x".to_string(), x), ("y".to_string(), y)].into_iter().collect()
    }

    #[test]
    fn test_regressor_prediction() {
        let model = LinearModel::from_json(
            br#"{"kind": "linear_regressor", "feature_names": ["x", "y"], "coefficients": [2.0, -1.0], "intercept": 10.0}"#,
            "v1",
        )
        .unwrap();
        let record = build_record(&xy_schema(), &values(3.0, 4.0)).unwrap();
        let frame = FeatureFrame::from_record(&record);
        assert_eq!(model.task(), Task::Regression);
        assert_eq!(model.predict(&frame).unwrap(), Label::Value(12.0));
        assert!(model.predict_probabilities(&frame).unwrap().is_none());
    }

    #[test]
    fn test_classifier_softmax() {
        let model = LinearModel::from_json(
            br#"{
                "kind": "softmax_classifier",
                "feature_names": ["x", "y"],
                "classes": [0, 1, 2],
                "coefficients": [[1.0, 0.0], [0.0, 1.0], [0.0, 0.0]],
                "intercepts": [0.0, 0.0, 0.0]
            }"#,
            "v1",
        )
        .unwrap();
        let record = build_record(&xy_schema(), &values(0.5, 3.0)).unwrap();
        let frame = FeatureFrame::from_record(&record);

        assert_eq!(model.predict(&frame).unwrap(), Label::Class(ClassLabel::Index(1)));
        let dist = model.predict_probabilities(&frame).unwrap().unwrap();
        assert_eq!(dist.len(), 3);
        let sum: f64 = dist.iter().map(|p| p.probability).sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(dist.iter().all(|p| p.probability >= 0.0));
    }

    #[test]
    fn test_rejects_inconsistent_artifact() {
        let err = LinearModel::from_json(
            br#"{"kind": "linear_regressor", "feature_names": ["x", "y"], "coefficients": [2.0], "intercept": 0.0}"#,
            "v1",
        )
        .unwrap_err();
        assert!(err.contains("coefficients"));

        assert!(LinearModel::from_json(br#"{"kind": "tree"}"#, "v1").is_err());
        assert!(LinearModel::from_json(b"{", "v1").is_err());
    }

    #[test]
    fn test_width_mismatch() {
        let model = LinearModel::from_json(
            br#"{"kind": "linear_regressor", "feature_names": ["x"], "coefficients": [1.0], "intercept": 0.0}"#,
            "v1",
        )
        .unwrap();
        let record = build_record(&xy_schema(), &values(1.0, 2.0)).unwrap();
        assert!(matches!(
            model.predict(&FeatureFrame::from_record(&record)),
            Err(AdapterError::SchemaMismatch(_))
        ));
    }
}
