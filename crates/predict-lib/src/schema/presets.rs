//! Built-in form apps: house price regression and wine cultivar classification

use super::{FeatureSchema, FeatureSlot};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Which built-in app to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppKind {
    #[default]
    House,
    Wine,
}

impl FromStr for AppKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "house" => Ok(AppKind::House),
            "wine" => Ok(AppKind::Wine),
            other => Err(format!("unknown app '{}', expected 'house' or 'wine'", other)),
        }
    }
}

impl fmt::Display for AppKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppKind::House => f.write_str("house"),
            AppKind::Wine => f.write_str("wine"),
        }
    }
}

/// Page text, default artifact location and schema for one app
#[derive(Debug, Clone)]
pub struct AppPreset {
    pub title: String,
    pub form_header: String,
    /// Prefix of the result line, e.g. "Predicted Sale Price"
    pub headline: String,
    pub submit_label: String,
    /// Currency symbol for regression output, if the target is money
    pub currency: Option<String>,
    pub default_model_path: PathBuf,
    pub schema: FeatureSchema,
}

impl AppPreset {
    pub fn for_kind(kind: AppKind) -> Self {
        match kind {
            AppKind::House => Self::house(),
            AppKind::Wine => Self::wine(),
        }
    }

    pub fn house() -> Self {
        let schema = FeatureSchema::new(vec![
            FeatureSlot::integer("OverallQual")
                .range(1.0, 10.0)
                .label("Overall Quality (OverallQual)")
                .default_value(6.0),
            FeatureSlot::float("GrLivArea")
                .min(200.0)
                .label("Above grade (ground) living area square feet (GrLivArea)")
                .default_value(1500.0),
            FeatureSlot::float("TotalBsmtSF")
                .min(0.0)
                .label("Total basement square feet (TotalBsmtSF)")
                .default_value(800.0),
            FeatureSlot::integer("GarageCars")
                .range(0.0, 4.0)
                .label("Garage capacity (GarageCars)")
                .default_value(1.0),
            FeatureSlot::integer("FullBath")
                .range(0.0, 4.0)
                .label("Full bathrooms (FullBath)")
                .default_value(2.0),
            FeatureSlot::integer("YearBuilt")
                .range(1850.0, 2026.0)
                .label("Year built (YearBuilt)")
                .default_value(1980.0),
        ])
        .expect("built-in house schema is valid");

        Self {
            title: "House Price Prediction".to_string(),
            form_header: "Enter house features".to_string(),
            headline: "Predicted Sale Price".to_string(),
            submit_label: "Predict House Price".to_string(),
            currency: Some("$".to_string()),
            default_model_path: PathBuf::from("model").join("house_price_model.onnx"),
            schema,
        }
    }

    pub fn wine() -> Self {
        // Measurements are reported at arbitrary precision, so no input step
        let slot = |name: &str, label: &str, default: f64| {
            FeatureSlot::float(name)
                .label(format!("{} ({})", label, name))
                .default_value(default)
        };
        let schema = FeatureSchema::new(vec![
            slot("alcohol", "Alcohol", 13.0),
            slot("malic_acid", "Malic acid", 2.0),
            slot("alcalinity_of_ash", "Alcalinity of ash", 17.0),
            slot("flavanoids", "Flavanoids", 2.0),
            slot("color_intensity", "Color intensity", 5.0),
            slot("proline", "Proline", 750.0),
        ])
        .expect("built-in wine schema is valid");

        Self {
            title: "Wine Cultivar Prediction".to_string(),
            form_header: "Enter wine chemical features".to_string(),
            headline: "Predicted cultivar".to_string(),
            submit_label: "Predict Cultivar".to_string(),
            currency: None,
            default_model_path: PathBuf::from("model").join("wine_model.onnx"),
            schema,
        }
    }

    /// Replace the schema, keeping the page text of this preset
    pub fn with_schema(mut self, schema: FeatureSchema) -> Self {
        self.schema = schema;
        self
    }
}
