//! ML prediction engine

mod adapter;
mod artifact;
mod features;
mod inference;
mod linear;
mod output;

pub use adapter::{predict, InferenceAdapter};
pub use artifact::{compute_checksum, load, load_model, sidecar_path, ArtifactFormat, LoadedModel};
pub use features::{build_record, default_values, parse_raw_values, FeatureFrame, RawValues};
pub use inference::OnnxPredictor;
pub use linear::{LinearArtifact, LinearModel};
pub use output::{
    format_thousands, normalize_distribution, OutputConfig, OutputFormatter, DISTRIBUTION_TOLERANCE,
};

use crate::error::Result;
use crate::models::{ClassLabel, ClassProbability, Label, Task};

/// Trait for prediction implementations
///
/// A predictor is loaded once and then shared read-only; every method
/// takes `&self`.
pub trait Predictor: Send + Sync {
    /// Whether this predictor regresses a value or picks a class
    fn task(&self) -> Task;

    /// Predict the label for a one-row frame
    fn predict(&self, frame: &FeatureFrame<'_>) -> Result<Label>;

    /// Class distribution for a one-row frame, if the model can estimate one
    fn predict_probabilities(&self, _frame: &FeatureFrame<'_>) -> Result<Option<Vec<ClassProbability>>> {
        Ok(None)
    }

    /// Label and class distribution for one row.
    ///
    /// Override when both come out of a single model evaluation.
    fn predict_with_probabilities(
        &self,
        frame: &FeatureFrame<'_>,
    ) -> Result<(Label, Option<Vec<ClassProbability>>)> {
        let label = self.predict(frame)?;
        let probabilities = self.predict_probabilities(frame)?;
        Ok((label, probabilities))
    }

    /// Number of input columns the model was trained on, if known
    fn input_width(&self) -> Option<usize> {
        None
    }

    /// Column names the model was fitted on, if the artifact records them
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Classes known to a classifier, in distribution order
    fn classes(&self) -> Option<&[ClassLabel]> {
        None
    }

    /// Get current model version
    fn model_version(&self) -> &str;
}
