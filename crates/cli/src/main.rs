//! Tabular Predict CLI
//!
//! A command-line tool for listing app schemas, running one-shot local
//! predictions against a model artifact, and querying a running app.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{local, remote};
use predict_lib::AppKind;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_API_URL: &str = "http://localhost:8501";

/// Tabular Predict CLI
#[derive(Parser)]
#[command(name = "tabpredict")]
#[command(author, version, about = "CLI for Tabular Predict apps", long_about = None)]
pub struct Cli {
    /// App endpoint URL (can also be set via TABPREDICT_API_URL env var)
    #[arg(long, env = "TABPREDICT_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the input features of an app
    Schema {
        /// Built-in app (house, wine)
        #[arg(long)]
        app: Option<AppKind>,

        /// JSON schema file replacing the built-in schema
        #[arg(long)]
        schema: Option<PathBuf>,
    },

    /// Run a prediction locally against a model artifact
    Predict {
        /// Built-in app (house, wine)
        #[arg(long)]
        app: Option<AppKind>,

        /// Model artifact (.onnx or .json); defaults to the app's model path
        #[arg(long, short)]
        model: Option<PathBuf>,

        /// JSON schema file replacing the built-in schema
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Feature value, repeatable (e.g. --set GrLivArea=1500)
        #[arg(long = "set", value_name = "NAME=VALUE", value_parser = local::parse_assignment)]
        set: Vec<(String, String)>,

        /// Fill features not given with --set from the schema defaults
        #[arg(long)]
        use_defaults: bool,
    },

    /// Commands against a running app
    #[command(subcommand)]
    Remote(RemoteCommands),
}

#[derive(Subcommand)]
pub enum RemoteCommands {
    /// Request a prediction from the app
    Predict {
        /// Feature value, repeatable (e.g. --set proline=1050)
        #[arg(long = "set", value_name = "NAME=VALUE", value_parser = local::parse_assignment)]
        set: Vec<(String, String)>,
    },

    /// Show the app's schema and model status
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }

    let config = config::Config::load()?;
    let format = cli.format.or(config.default_format).unwrap_or_default();
    let default_app = config.default_app.unwrap_or_default();

    match cli.command {
        Commands::Schema { app, schema } => {
            let preset = local::resolve_preset(app.unwrap_or(default_app), schema.as_deref())?;
            local::show_schema(&preset, format)?;
        }
        Commands::Predict {
            app,
            model,
            schema,
            set,
            use_defaults,
        } => {
            let preset = local::resolve_preset(app.unwrap_or(default_app), schema.as_deref())?;
            local::predict(&preset, model, &set, use_defaults, format)?;
        }
        Commands::Remote(remote_cmd) => {
            let api_url = cli
                .api_url
                .or(config.api_url)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string());
            let client = client::ApiClient::new(&api_url)?;
            match remote_cmd {
                RemoteCommands::Predict { set } => {
                    remote::predict(&client, &set, format).await?;
                }
                RemoteCommands::Schema => {
                    remote::show_schema(&client, format).await?;
                }
            }
        }
    }

    Ok(())
}
