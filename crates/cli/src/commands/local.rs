//! Commands that run against a local model artifact

use anyhow::{Context, Result};
use predict_lib::predictor::{self, default_values, parse_raw_values, OutputFormatter};
use predict_lib::{AdapterError, AppKind, AppPreset, FeatureKind, FeatureSchema, InferenceAdapter};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::Tabled;

use crate::output::{print_prediction, print_table, OutputFormat};

/// Row for the schema table
#[derive(Tabled, Serialize)]
pub struct SlotRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Label")]
    pub label: String,
    #[tabled(rename = "Type")]
    pub kind: String,
    #[tabled(rename = "Min")]
    pub min: String,
    #[tabled(rename = "Max")]
    pub max: String,
    #[tabled(rename = "Default")]
    pub default: String,
}

/// Parse a `NAME=VALUE` argument
pub fn parse_assignment(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{}'", arg)),
    }
}

/// Built-in preset, optionally with its schema replaced from a file
pub fn resolve_preset(app: AppKind, schema: Option<&Path>) -> Result<AppPreset> {
    let preset = AppPreset::for_kind(app);
    match schema {
        Some(path) => {
            let schema = FeatureSchema::from_json_file(path)
                .with_context(|| format!("Failed to load schema from {}", path.display()))?;
            Ok(preset.with_schema(schema))
        }
        None => Ok(preset),
    }
}

pub fn slot_rows(schema: &FeatureSchema) -> Vec<SlotRow> {
    let fmt = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
    schema
        .slots()
        .iter()
        .map(|slot| SlotRow {
            name: slot.name.clone(),
            label: slot.display_label().to_string(),
            kind: match slot.kind {
                FeatureKind::Integer => "integer".to_string(),
                FeatureKind::Float => "float".to_string(),
            },
            min: fmt(slot.min),
            max: fmt(slot.max),
            default: fmt(slot.default),
        })
        .collect()
}

/// List the slots of an app's schema
pub fn show_schema(preset: &AppPreset, format: OutputFormat) -> Result<()> {
    if let OutputFormat::Table = format {
        println!("{}", preset.title);
    }
    print_table(&slot_rows(&preset.schema), format);
    Ok(())
}

/// Collect `--set` values, filling the rest from slot defaults when asked
pub fn collect_values(
    schema: &FeatureSchema,
    assignments: &[(String, String)],
    use_defaults: bool,
) -> Result<predictor::RawValues, AdapterError> {
    let given = parse_raw_values(assignments.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
    if !use_defaults {
        return Ok(given);
    }
    let mut raw = default_values(schema);
    raw.extend(given);
    Ok(raw)
}

/// One-shot local prediction
pub fn predict(
    preset: &AppPreset,
    model: Option<PathBuf>,
    assignments: &[(String, String)],
    use_defaults: bool,
    format: OutputFormat,
) -> Result<()> {
    let model_path = model.unwrap_or_else(|| preset.default_model_path.clone());
    tracing::debug!(model = %model_path.display(), "Loading model");

    let predictor = predictor::load(&model_path).map_err(with_hint)?;
    let adapter = InferenceAdapter::new(preset.schema.clone(), predictor)?;

    let raw = collect_values(&preset.schema, assignments, use_defaults)?;
    let result = adapter.predict_raw(&raw)?;

    let headline = OutputFormatter::for_preset(preset).headline(&result);
    print_prediction(&result, &headline, format);
    Ok(())
}

/// Put the operator hint of an artifact error on top of the error chain
fn with_hint(err: AdapterError) -> anyhow::Error {
    match err.remediation() {
        Some(hint) => anyhow::Error::new(err).context(hint),
        None => err.into(),
    }
}
