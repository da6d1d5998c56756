//! Schema-bound inference adapter
//!
//! Guarantees a predictor only ever sees a row whose columns match the
//! schema it was trained on, in training order, with every value inside its
//! declared domain, and normalizes regressor and classifier output into one
//! [`PredictionResult`] shape.

use super::features::{build_record, FeatureFrame, RawValues};
use super::output::normalize_distribution;
use super::Predictor;
use crate::error::{AdapterError, Result};
use crate::models::{FeatureRecord, PredictionResult};
use crate::schema::FeatureSchema;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Run one prediction for a record already assembled against a schema.
///
/// Serializes the record to a one-row frame in schema order, calls
/// `predict`, and merges the class distribution when the predictor offers
/// one. Does not mutate the predictor.
pub fn predict(predictor: &dyn Predictor, record: &FeatureRecord) -> Result<PredictionResult> {
    let start = Instant::now();
    let frame = FeatureFrame::from_record(record);

    let (label, probabilities) = predictor.predict_with_probabilities(&frame)?;
    if label.task() != predictor.task() {
        return Err(AdapterError::Inference(format!(
            "{:?} predictor returned a {:?} label",
            predictor.task(),
            label.task()
        )));
    }

    let probabilities = probabilities
        .map(|probs| normalize_distribution(probs, predictor.classes().map(<[_]>::len)))
        .transpose()?;

    let latency_us = start.elapsed().as_micros() as u64;
    debug!(latency_us, label = %label, "Prediction completed");

    Ok(PredictionResult {
        task: predictor.task(),
        label,
        probabilities,
        record: record.clone(),
        model_version: predictor.model_version().to_string(),
        latency_us,
        generated_at: chrono::Utc::now().timestamp(),
    })
}

/// Binds a fixed feature schema to a loaded predictor
#[derive(Clone)]
pub struct InferenceAdapter {
    schema: Arc<FeatureSchema>,
    predictor: Arc<dyn Predictor>,
}

impl std::fmt::Debug for InferenceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceAdapter")
            .field("schema", &self.schema)
            .field("task", &self.predictor.task())
            .field("model_version", &self.predictor.model_version())
            .finish()
    }
}

impl InferenceAdapter {
    /// Bind `schema` to `predictor`, rejecting pairs whose columns disagree
    pub fn new(schema: FeatureSchema, predictor: Arc<dyn Predictor>) -> Result<Self> {
        if let Some(width) = predictor.input_width() {
            if width != schema.len() {
                return Err(AdapterError::SchemaMismatch(format!(
                    "model expects {} features, schema declares {}",
                    width,
                    schema.len()
                )));
            }
        }
        if let Some(names) = predictor.feature_names() {
            let matches = names.len() == schema.len() && names.iter().map(String::as_str).eq(schema.names());
            if !matches {
                return Err(AdapterError::SchemaMismatch(format!(
                    "model was fitted on [{}], schema declares [{}]",
                    names.join(", "),
                    schema.names().collect::<Vec<_>>().join(", ")
                )));
            }
        }
        Ok(Self {
            schema: Arc::new(schema),
            predictor,
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn predictor(&self) -> &Arc<dyn Predictor> {
        &self.predictor
    }

    /// Assemble a record for this adapter's schema
    pub fn build_record(&self, raw: &RawValues) -> Result<FeatureRecord> {
        build_record(&self.schema, raw)
    }

    /// Predict from a record, which must have been built for this schema
    pub fn predict(&self, record: &FeatureRecord) -> Result<PredictionResult> {
        let columns_match = record.len() == self.schema.len()
            && record.columns().iter().map(String::as_str).eq(self.schema.names());
        if !columns_match {
            return Err(AdapterError::SchemaMismatch(format!(
                "record columns [{}] do not match the schema",
                record.columns().join(", ")
            )));
        }
        predict(self.predictor.as_ref(), record)
    }

    /// Build a record from raw values and predict in one step
    pub fn predict_raw(&self, raw: &RawValues) -> Result<PredictionResult> {
        let record = self.build_record(raw)?;
        self.predict(&record)
    }
}
