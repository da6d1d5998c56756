//! ONNX inference using tract
//!
//! Provides lightweight single-row inference for models exported to ONNX
//! (e.g. scikit-learn pipelines converted with skl2onnx). A graph with one
//! output is treated as a regressor; a graph with two outputs as a
//! classifier emitting `(label, probabilities)` with zipmap disabled.

use super::features::FeatureFrame;
use super::Predictor;
use crate::error::{AdapterError, Result};
use crate::models::{ClassLabel, ClassProbability, Label, Task};
use anyhow::Context;
use std::time::Instant;
use tract_onnx::prelude::*;
use tract_onnx::tract_core::internal::DimLike;
use tracing::{debug, warn};

/// Maximum inference latency before warning (5ms target)
const MAX_INFERENCE_MS: u128 = 5;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX-based predictor using tract for lightweight inference
pub struct OnnxPredictor {
    model: TractModel,
    input_width: usize,
    task: Task,
    classes: Vec<ClassLabel>,
    model_version: String,
}

impl std::fmt::Debug for OnnxPredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxPredictor")
            .field("input_width", &self.input_width)
            .field("task", &self.task)
            .field("classes", &self.classes)
            .field("model_version", &self.model_version)
            .finish()
    }
}

impl OnnxPredictor {
    /// Parse, optimize and probe an ONNX model from bytes
    pub fn from_bytes(model_bytes: &[u8], model_version: impl Into<String>) -> anyhow::Result<Self> {
        let proto = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?;

        let task = match proto.outputs.len() {
            1 => Task::Regression,
            2 => Task::Classification,
            n => anyhow::bail!("Model has {} outputs, expected 1 (regressor) or 2 (classifier)", n),
        };
        let input_width = declared_input_width(&proto)?;

        let model = proto
            .with_input_fact(0, f32::fact([1, input_width]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;

        let mut predictor = Self {
            model,
            input_width,
            task,
            classes: Vec::new(),
            model_version: model_version.into(),
        };

        // A probe run catches graphs that parse but cannot execute, and
        // tells us how many classes a classifier knows.
        let probe = predictor
            .run(&vec![0.0f32; input_width])
            .context("Probe inference failed")?;
        if task == Task::Classification {
            let k = probabilities_from(&probe)?.len();
            anyhow::ensure!(k > 0, "Classifier reported no classes");
            predictor.classes = (0..k as i64).map(ClassLabel::Index).collect();
        } else {
            value_from(&probe)?;
        }

        Ok(predictor)
    }

    fn run(&self, row: &[f32]) -> anyhow::Result<TVec<TValue>> {
        let start = Instant::now();
        let input: Tensor = tract_ndarray::Array2::from_shape_vec((1, self.input_width), row.to_vec())
            .context("Row does not match model input width")?
            .into();
        let outputs = self.model.run(tvec!(input.into()))?;

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }
        Ok(outputs)
    }

    fn run_frame(&self, frame: &FeatureFrame<'_>) -> Result<TVec<TValue>> {
        if frame.width() != self.input_width {
            return Err(AdapterError::SchemaMismatch(format!(
                "model expects {} columns, frame has {}",
                self.input_width,
                frame.width()
            )));
        }
        self.run(&frame.row_f32())
            .map_err(|e| AdapterError::Inference(format!("{:#}", e)))
    }

    fn label_of(&self, outputs: &TVec<TValue>) -> Result<Label> {
        match self.task {
            Task::Regression => value_from(outputs)
                .map(Label::Value)
                .map_err(|e| AdapterError::Inference(format!("{:#}", e))),
            Task::Classification => {
                let raw = label_from(outputs).map_err(|e| AdapterError::Inference(format!("{:#}", e)))?;
                usize::try_from(raw)
                    .ok()
                    .and_then(|idx| self.classes.get(idx).cloned())
                    .map(Label::Class)
                    .ok_or_else(|| {
                        AdapterError::Inference(format!(
                            "model returned class index {} but knows {} classes",
                            raw,
                            self.classes.len()
                        ))
                    })
            }
        }
    }

    fn distribution_of(&self, outputs: &TVec<TValue>) -> Result<Option<Vec<ClassProbability>>> {
        if self.task != Task::Classification {
            return Ok(None);
        }
        let probs = probabilities_from(outputs).map_err(|e| AdapterError::Inference(format!("{:#}", e)))?;
        if probs.len() != self.classes.len() {
            return Err(AdapterError::Inference(format!(
                "model returned {} probabilities for {} classes",
                probs.len(),
                self.classes.len()
            )));
        }
        Ok(Some(
            self.classes
                .iter()
                .cloned()
                .zip(probs)
                .map(|(class, p)| ClassProbability::new(class, p))
                .collect(),
        ))
    }
}

impl Predictor for OnnxPredictor {
    fn task(&self) -> Task {
        self.task
    }

    fn predict(&self, frame: &FeatureFrame<'_>) -> Result<Label> {
        let outputs = self.run_frame(frame)?;
        self.label_of(&outputs)
    }

    fn predict_probabilities(&self, frame: &FeatureFrame<'_>) -> Result<Option<Vec<ClassProbability>>> {
        if self.task != Task::Classification {
            return Ok(None);
        }
        let outputs = self.run_frame(frame)?;
        self.distribution_of(&outputs)
    }

    /// Label and distribution both come out of one graph run
    fn predict_with_probabilities(
        &self,
        frame: &FeatureFrame<'_>,
    ) -> Result<(Label, Option<Vec<ClassProbability>>)> {
        let outputs = self.run_frame(frame)?;
        Ok((self.label_of(&outputs)?, self.distribution_of(&outputs)?))
    }

    fn input_width(&self) -> Option<usize> {
        Some(self.input_width)
    }

    fn classes(&self) -> Option<&[ClassLabel]> {
        match self.task {
            Task::Classification => Some(&self.classes),
            Task::Regression => None,
        }
    }

    fn model_version(&self) -> &str {
        &self.model_version
    }
}

/// Feature count of the graph's first input, which must be `[batch, features]`
fn declared_input_width(proto: &InferenceModel) -> anyhow::Result<usize> {
    let typed = proto
        .clone()
        .into_typed()
        .context("Failed to analyse ONNX model")?;
    let fact = typed.input_fact(0).context("Model declares no input")?;
    let dims: &[TDim] = &fact.shape;
    if dims.len() != 2 {
        anyhow::bail!("Model input has rank {}, expected [batch, features]", dims.len());
    }
    dims[1]
        .to_usize()
        .context("Model input does not declare a fixed feature count")
}

fn value_from(outputs: &TVec<TValue>) -> anyhow::Result<f64> {
    let output = outputs.first().context("No output from model")?;
    let values = output.cast_to::<f64>()?;
    values
        .as_slice::<f64>()?
        .first()
        .copied()
        .context("Model output is empty")
}

fn label_from(outputs: &TVec<TValue>) -> anyhow::Result<i64> {
    let output = outputs.first().context("No label output from model")?;
    let labels = output.cast_to::<i64>()?;
    labels
        .as_slice::<i64>()?
        .first()
        .copied()
        .context("Label output is empty")
}

fn probabilities_from(outputs: &TVec<TValue>) -> anyhow::Result<Vec<f64>> {
    let output = outputs.get(1).context("No probability output from model")?;
    let probs = output.cast_to::<f64>()?;
    Ok(probs.as_slice::<f64>()?.to_vec())
}
