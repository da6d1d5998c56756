//! Error taxonomy for artifact loading, record assembly and inference

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, AdapterError>;

/// Errors raised by the inference adapter
#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    /// The model artifact path does not resolve to a file
    #[error("model artifact not found at {}", path.display())]
    ArtifactNotFound { path: PathBuf },

    /// The artifact exists but could not be deserialized
    #[error("model artifact at {} is corrupt: {reason}", path.display())]
    ArtifactCorrupt { path: PathBuf, reason: String },

    /// A schema slot has no value in the raw input
    #[error("missing value for feature '{name}'")]
    MissingFeature { name: String },

    /// A value falls outside the slot's declared bounds
    #[error("value {value} for feature '{name}' is outside [{}, {}]", fmt_bound(*min, "-inf"), fmt_bound(*max, "inf"))]
    OutOfRange {
        name: String,
        value: f64,
        min: Option<f64>,
        max: Option<f64>,
    },

    /// An integer slot received a value with a fractional part
    #[error("feature '{name}' expects an integer, got {value}")]
    NotIntegral { name: String, value: f64 },

    /// The value is not a finite number (or could not be parsed as one)
    #[error("invalid value for feature '{name}': {reason}")]
    InvalidValue { name: String, reason: String },

    /// The raw input names a feature the schema does not know
    #[error("unexpected feature '{name}'")]
    UnexpectedFeature { name: String },

    /// The schema definition itself violates an invariant
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// Schema and predictor (or record) disagree on columns
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// The predictor failed or produced unusable output
    #[error("inference failed: {0}")]
    Inference(String),
}

fn fmt_bound(bound: Option<f64>, open: &str) -> String {
    bound.map(|b| b.to_string()).unwrap_or_else(|| open.to_string())
}

impl AdapterError {
    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ArtifactCorrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for errors caused by a single malformed request.
    ///
    /// These block only the offending request; everything else is a setup
    /// or model problem that blocks all predictions.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingFeature { .. }
                | Self::OutOfRange { .. }
                | Self::NotIntegral { .. }
                | Self::InvalidValue { .. }
                | Self::UnexpectedFeature { .. }
        )
    }

    /// True for errors raised while loading the model artifact
    pub fn is_artifact(&self) -> bool {
        matches!(self, Self::ArtifactNotFound { .. } | Self::ArtifactCorrupt { .. })
    }

    /// Operator-facing setup hint for artifact errors
    pub fn remediation(&self) -> Option<String> {
        match self {
            Self::ArtifactNotFound { path } => Some(format!(
                "Model not found at {}. Train the model first and put the file there.",
                path.display()
            )),
            Self::ArtifactCorrupt { path, .. } => Some(format!(
                "Model at {} could not be loaded. Re-export the trained model and replace the file.",
                path.display()
            )),
            _ => None,
        }
    }
}
