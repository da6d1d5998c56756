//! Predict App - serves a tabular model behind a generated HTML form

use anyhow::Result;
use predict_app::{api, config::AppConfig, state::AppState};
use predict_lib::HealthRegistry;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = AppConfig::load()?;
    info!(app = %config.app, "App configured");

    let health_registry = HealthRegistry::new();

    // A missing or broken model does not stop the app; the page shows the setup hint
    let state = AppState::initialize(&config, health_registry.clone()).await?;
    state
        .logger
        .log_startup(APP_VERSION, &state.model_path.display().to_string());
    let state = Arc::new(state);

    health_registry.set_ready(true).await;

    let server = tokio::spawn(api::serve(config.listen_addr(), state.clone()));

    tokio::select! {
        res = server => {
            match res {
                Ok(Err(e)) => error!(error = %e, "HTTP server failed"),
                Err(e) => error!(error = %e, "HTTP server task panicked"),
                Ok(Ok(())) => {}
            }
            state.logger.log_shutdown("server stopped");
        }
        _ = tokio::signal::ctrl_c() => {
            state.logger.log_shutdown("SIGINT received");
            info!("Shutting down");
        }
    }

    Ok(())
}
