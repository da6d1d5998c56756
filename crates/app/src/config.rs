//! App configuration

use anyhow::{Context, Result};
use predict_lib::AppKind;
use serde::Deserialize;
use std::path::PathBuf;

/// Prefix of environment variables, e.g. `PREDICT_APP_MODEL_PATH`
pub const ENV_PREFIX: &str = "PREDICT_APP";

/// Optional config file in the working directory (any format `config` reads)
pub const CONFIG_FILE: &str = "predict-app";

/// App configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Which built-in form to serve
    #[serde(default)]
    pub app: AppKind,

    /// Model artifact; defaults to the app's conventional path under `model/`
    #[serde(default)]
    pub model_path: Option<PathBuf>,

    /// JSON schema file replacing the built-in schema
    #[serde(default)]
    pub schema_path: Option<PathBuf>,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8501
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppKind::default(),
            model_path: None,
            schema_path: None,
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional config file and the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
