//! Tabular single-row inference
//!
//! This crate provides the core functionality for:
//! - Feature schemas and the built-in house/wine apps
//! - Schema-driven record assembly and validation
//! - Model artifact loading (ONNX via tract, JSON linear models)
//! - The inference adapter and result formatting
//! - Health checks and observability

pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod schema;

pub use error::{AdapterError, Result};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{PredictMetrics, StructuredLogger};
pub use predictor::{InferenceAdapter, Predictor};
pub use schema::{AppKind, AppPreset, FeatureKind, FeatureSchema, FeatureSlot};
