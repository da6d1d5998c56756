//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use predict_lib::predictor::OutputFormatter;
use predict_lib::PredictionResult;
use serde::{Deserialize, Serialize};
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Rows as a rounded table, or as a JSON array
pub fn print_table<T: Tabled + Serialize>(rows: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(rows),
        OutputFormat::Table if rows.is_empty() => println!("{}", "(none)".dimmed()),
        OutputFormat::Table => println!("{}", Table::new(rows).with(Style::rounded())),
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("{} cannot encode output: {}", "✗".red().bold(), e),
    }
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.bold());
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

#[derive(Tabled, Serialize)]
struct ProbabilityRow {
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "Probability")]
    probability: String,
}

#[derive(Tabled, Serialize)]
struct InputRow {
    #[tabled(rename = "Feature")]
    feature: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Print a prediction: headline, class distribution, then the input row
pub fn print_prediction(result: &PredictionResult, headline: &str, format: OutputFormat) {
    if let OutputFormat::Json = format {
        print_json(result);
        return;
    }

    print_success(headline);
    if let Some(confidence) = result.confidence() {
        println!("  Confidence: {}", color_confidence(confidence));
    }

    let rows: Vec<ProbabilityRow> = OutputFormatter::new()
        .distribution_rows(result)
        .into_iter()
        .map(|(class, probability)| ProbabilityRow { class, probability })
        .collect();
    if !rows.is_empty() {
        print_table(&rows, format);
    }

    let inputs: Vec<InputRow> = result
        .record
        .iter()
        .map(|(feature, value)| InputRow {
            feature: feature.to_string(),
            value: value.to_string(),
        })
        .collect();
    println!("\nInput data:");
    print_table(&inputs, format);
    println!(
        "{}",
        format!("model {} ({} µs)", result.model_version, result.latency_us).dimmed()
    );
}

/// Color confidence based on value
pub fn color_confidence(confidence: f64) -> String {
    let formatted = format!("{:.1}%", confidence * 100.0);
    if confidence >= 0.8 {
        formatted.green().to_string()
    } else if confidence >= 0.6 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

/// Color a model status word
pub fn color_status(status: &str) -> String {
    match status {
        "ready" => status.green().to_string(),
        "unavailable" => status.red().to_string(),
        _ => status.to_string(),
    }
}
