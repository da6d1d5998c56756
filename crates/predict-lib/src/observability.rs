//! Observability infrastructure for the prediction app
//!
//! Provides:
//! - Prometheus metrics (prediction latency, outcome counters, model info)
//! - Structured JSON logging with tracing

use crate::error::AdapterError;
use crate::models::PredictionResult;
use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    GaugeVec, Histogram, IntCounter, IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00005, 0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<PredictMetricsInner> = OnceLock::new();

struct PredictMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounter,
    rejected_requests: IntCounterVec,
    prediction_errors: IntCounter,
    model_info: GaugeVec,
}

impl PredictMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "tabpredict_prediction_latency_seconds",
                "Time spent assembling the record and running inference",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter!(
                "tabpredict_predictions_total",
                "Total number of successful predictions"
            )
            .expect("Failed to register predictions_total"),

            rejected_requests: register_int_counter_vec!(
                "tabpredict_rejected_requests_total",
                "Requests rejected by input validation",
                &["reason"]
            )
            .expect("Failed to register rejected_requests_total"),

            prediction_errors: register_int_counter!(
                "tabpredict_prediction_errors_total",
                "Predictions that failed inside the model or adapter"
            )
            .expect("Failed to register prediction_errors_total"),

            model_info: register_gauge_vec!(
                "tabpredict_model_info",
                "Information about the currently loaded model",
                &["version", "format", "task"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Handle to the process-wide prediction metrics; clones share one registry
#[derive(Clone)]
pub struct PredictMetrics {
    _private: (),
}

impl Default for PredictMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(PredictMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &PredictMetricsInner {
        GLOBAL_METRICS.get_or_init(PredictMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self) {
        self.inner().predictions_total.inc();
    }

    /// Count a failed request under validation or error counters
    pub fn record_failure(&self, err: &AdapterError) {
        if err.is_validation() {
            self.inner()
                .rejected_requests
                .with_label_values(&[rejection_reason(err)])
                .inc();
        } else {
            self.inner().prediction_errors.inc();
        }
    }

    pub fn set_model_info(&self, version: &str, format: &str, task: &str) {
        self.inner().model_info.reset();
        self.inner()
            .model_info
            .with_label_values(&[version, format, task])
            .set(1.0);
    }

    pub fn predictions_total(&self) -> u64 {
        self.inner().predictions_total.get()
    }
}

fn rejection_reason(err: &AdapterError) -> &'static str {
    match err {
        AdapterError::MissingFeature { .. } => "missing_feature",
        AdapterError::OutOfRange { .. } => "out_of_range",
        AdapterError::NotIntegral { .. } => "not_integral",
        AdapterError::InvalidValue { .. } => "invalid_value",
        AdapterError::UnexpectedFeature { .. } => "unexpected_feature",
        _ => "other",
    }
}

/// Structured logger for app events
#[derive(Clone)]
pub struct StructuredLogger {
    app: String,
}

impl StructuredLogger {
    pub fn new(app: impl Into<String>) -> Self {
        Self { app: app.into() }
    }

    pub fn log_startup(&self, version: &str, model_path: &str) {
        info!(
            event = "app_started",
            app = %self.app,
            app_version = %version,
            model_path = %model_path,
            "Prediction app started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "app_shutdown",
            app = %self.app,
            reason = %reason,
            "Prediction app shutting down"
        );
    }

    pub fn log_model_loaded(&self, model_version: &str, format: &str, checksum: &str) {
        info!(
            event = "model_loaded",
            app = %self.app,
            model_version = %model_version,
            format = %format,
            checksum = %checksum,
            "Model loaded"
        );
    }

    /// Artifact problems block all predictions, so they log at warn with the hint
    pub fn log_model_load_failed(&self, err: &AdapterError) {
        warn!(
            event = "model_load_failed",
            app = %self.app,
            error = %err,
            remediation = ?err.remediation(),
            "Model could not be loaded, predictions disabled"
        );
    }

    pub fn log_prediction(&self, result: &PredictionResult) {
        info!(
            event = "prediction_generated",
            app = %self.app,
            task = ?result.task,
            label = %result.label,
            confidence = ?result.confidence(),
            latency_us = result.latency_us,
            model_version = %result.model_version,
            "Generated prediction"
        );
    }

    pub fn log_rejection(&self, err: &AdapterError) {
        if err.is_validation() {
            info!(
                event = "prediction_rejected",
                app = %self.app,
                reason = rejection_reason(err),
                error = %err,
                "Rejected invalid input"
            );
        } else {
            warn!(
                event = "prediction_failed",
                app = %self.app,
                error = %err,
                "Prediction failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_handles_share_registry() {
        let metrics = PredictMetrics::new();
        let before = metrics.predictions_total();
        metrics.clone().inc_predictions();
        assert!(metrics.predictions_total() > before);

        metrics.observe_prediction_latency(0.0002);
        metrics.set_model_info("house@abc", "onnx", "regression");
        metrics.record_failure(&AdapterError::MissingFeature {
            name: "proline".to_string(),
        });
        metrics.record_failure(&AdapterError::Inference("boom".to_string()));
    }

    #[test]
    fn test_rejection_reasons() {
        assert_eq!(
            rejection_reason(&AdapterError::UnexpectedFeature {
                name: "x".to_string()
            }),
            "unexpected_feature"
        );
        assert_eq!(rejection_reason(&AdapterError::Inference("x".to_string())), "other");
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("house");
        assert_eq!(logger.app, "house");
    }
}
