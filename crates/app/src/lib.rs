//! Form-to-prediction web app
//!
//! Serves one of the built-in tabular apps (house prices, wine cultivars):
//! an HTML form generated from the feature schema, a JSON prediction API,
//! health checks and Prometheus metrics.

pub mod api;
pub mod config;
pub mod form;
pub mod state;
