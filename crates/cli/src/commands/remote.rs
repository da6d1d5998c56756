//! Commands that talk to a running app

use anyhow::Result;
use predict_lib::predictor::parse_raw_values;

use super::local::slot_rows;
use crate::client::ApiClient;
use crate::output::{color_status, print_json, print_prediction, print_table, print_warning, OutputFormat};

/// Request a prediction from the app's JSON API
pub async fn predict(client: &ApiClient, assignments: &[(String, String)], format: OutputFormat) -> Result<()> {
    // The app owns the schema and validates; values are only parsed here
    let features = parse_raw_values(assignments.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
    let prediction = client.predict(features).await?;

    match format {
        OutputFormat::Json => print_json(&prediction),
        OutputFormat::Table => print_prediction(&prediction.result, &prediction.headline, format),
    }
    Ok(())
}

/// Show the app's schema and whether its model is loaded
pub async fn show_schema(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let info = client.schema().await?;

    match format {
        OutputFormat::Json => print_json(&info),
        OutputFormat::Table => {
            println!("{} ({})", info.title, info.app);
            if info.model_ready {
                println!("Model: {}", color_status("ready"));
            } else {
                print_warning(&format!("Model: {}", color_status("unavailable")));
            }
            print_table(&slot_rows(&info.schema), format);
        }
    }
    Ok(())
}
