//! Shared application state: the app preset and its (possibly missing) model

use crate::config::AppConfig;
use crate::form::PageRenderer;
use anyhow::{Context, Result};
use predict_lib::health::components;
use predict_lib::predictor::{self, OutputFormatter, RawValues};
use predict_lib::{
    AdapterError, AppPreset, FeatureSchema, HealthRegistry, InferenceAdapter, PredictMetrics,
    PredictionResult, Predictor, StructuredLogger,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Whether predictions can be served
pub enum ModelState {
    Ready(InferenceAdapter),
    /// Load or binding failed; every prediction reports this error
    Unavailable(AdapterError),
}

/// Shared application state
pub struct AppState {
    pub app_name: String,
    pub preset: AppPreset,
    pub model_path: PathBuf,
    pub model: ModelState,
    pub formatter: OutputFormatter,
    pub renderer: PageRenderer,
    pub health_registry: HealthRegistry,
    pub metrics: PredictMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    /// Resolve the preset and load the model named by `config`
    pub async fn initialize(config: &AppConfig, health_registry: HealthRegistry) -> Result<Self> {
        let mut preset = AppPreset::for_kind(config.app);
        if let Some(path) = &config.schema_path {
            let schema = FeatureSchema::from_json_file(path)
                .with_context(|| format!("Failed to load schema from {}", path.display()))?;
            preset = preset.with_schema(schema);
        }
        let model_path = config
            .model_path
            .clone()
            .unwrap_or_else(|| preset.default_model_path.clone());

        let metrics = PredictMetrics::new();
        let logger = StructuredLogger::new(config.app.to_string());

        let loaded = predictor::load_model(&model_path).map(|model| {
            logger.log_model_loaded(model.predictor.model_version(), model.format.as_str(), &model.checksum);
            metrics.set_model_info(
                model.predictor.model_version(),
                model.format.as_str(),
                &format!("{:?}", model.predictor.task()).to_lowercase(),
            );
            model.predictor
        });

        Self::assemble(
            config.app.to_string(),
            preset,
            model_path,
            loaded,
            health_registry,
            metrics,
            logger,
        )
        .await
    }

    /// Assemble state around an already attempted model load
    pub async fn build(
        app_name: String,
        preset: AppPreset,
        model_path: PathBuf,
        loaded: predict_lib::Result<Arc<dyn Predictor>>,
        health_registry: HealthRegistry,
    ) -> Result<Self> {
        let metrics = PredictMetrics::new();
        let logger = StructuredLogger::new(app_name.clone());
        Self::assemble(app_name, preset, model_path, loaded, health_registry, metrics, logger).await
    }

    async fn assemble(
        app_name: String,
        preset: AppPreset,
        model_path: PathBuf,
        loaded: predict_lib::Result<Arc<dyn Predictor>>,
        health_registry: HealthRegistry,
        metrics: PredictMetrics,
        logger: StructuredLogger,
    ) -> Result<Self> {
        health_registry.register(components::MODEL).await;
        health_registry.register(components::ADAPTER).await;

        let model = match loaded.and_then(|p| InferenceAdapter::new(preset.schema.clone(), p)) {
            Ok(adapter) => ModelState::Ready(adapter),
            Err(err) => {
                logger.log_model_load_failed(&err);
                health_registry.record_setup_error(&err).await;
                ModelState::Unavailable(err)
            }
        };

        let formatter = OutputFormatter::for_preset(&preset);

        Ok(Self {
            app_name,
            preset,
            model_path,
            model,
            formatter,
            renderer: PageRenderer::new()?,
            health_registry,
            metrics,
            logger,
        })
    }

    pub fn adapter(&self) -> Result<&InferenceAdapter, AdapterError> {
        match &self.model {
            ModelState::Ready(adapter) => Ok(adapter),
            ModelState::Unavailable(err) => Err(err.clone()),
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.preset.schema
    }

    /// One submission: build the record, predict, record metrics and logs.
    ///
    /// Model failures (not bad input) mark the adapter degraded until the
    /// next successful prediction.
    pub async fn predict(&self, raw: &RawValues) -> Result<PredictionResult, AdapterError> {
        let adapter = self.adapter()?;
        let start = Instant::now();
        match adapter.predict_raw(raw) {
            Ok(result) => {
                self.metrics.observe_prediction_latency(start.elapsed().as_secs_f64());
                self.metrics.inc_predictions();
                self.logger.log_prediction(&result);
                self.health_registry.set_healthy(components::ADAPTER).await;
                Ok(result)
            }
            Err(err) => {
                self.metrics.record_failure(&err);
                self.logger.log_rejection(&err);
                if !err.is_validation() {
                    self.health_registry
                        .set_degraded(components::ADAPTER, format!("last prediction failed: {}", err))
                        .await;
                }
                Err(err)
            }
        }
    }
}
