//! HTML form page generated from the app schema

use crate::state::AppState;
use anyhow::{Context, Result};
use minijinja::Environment;
use predict_lib::{AdapterError, FeatureKind, FeatureSlot, PredictionResult};
use serde::Serialize;

const PAGE_TEMPLATE: &str = include_str!("../templates/page.html");

/// Renders the single form page; `.html` templates are auto-escaped
pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("page.html", PAGE_TEMPLATE)
            .context("Invalid page template")?;
        Ok(Self { env })
    }

    pub fn render(&self, view: &PageView) -> Result<String> {
        self.env
            .get_template("page.html")
            .and_then(|tmpl| tmpl.render(view))
            .context("Failed to render page")
    }
}

#[derive(Debug, Serialize)]
pub struct PageView {
    pub title: String,
    pub header: String,
    pub submit_label: String,
    pub unavailable: Option<UnavailableView>,
    pub fields: Vec<FieldView>,
    pub error: Option<String>,
    pub result: Option<ResultView>,
}

#[derive(Debug, Serialize)]
pub struct UnavailableView {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FieldView {
    pub name: String,
    pub label: String,
    pub value: String,
    pub step: String,
    pub min: Option<String>,
    pub max: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResultView {
    pub headline: String,
    pub probabilities: Vec<ProbabilityView>,
    pub inputs: Vec<InputView>,
}

#[derive(Debug, Serialize)]
pub struct ProbabilityView {
    pub class: String,
    pub percent: String,
}

#[derive(Debug, Serialize)]
pub struct InputView {
    pub name: String,
    pub value: String,
}

impl PageView {
    /// Blank form pre-filled with slot defaults, or the setup hint when no model
    pub fn initial(state: &AppState) -> Self {
        let fields = state
            .schema()
            .slots()
            .iter()
            .map(|slot| field(slot, slot.default.map(|d| d.to_string()).unwrap_or_default()))
            .collect();
        Self::base(state, fields)
    }

    /// Form echoing what the user submitted
    pub fn submitted(state: &AppState, submitted: &[(String, String)]) -> Self {
        let fields = state
            .schema()
            .slots()
            .iter()
            .map(|slot| {
                let value = submitted
                    .iter()
                    .find(|(name, _)| name == &slot.name)
                    .map(|(_, v)| v.clone())
                    .unwrap_or_default();
                field(slot, value)
            })
            .collect();
        Self::base(state, fields)
    }

    pub fn with_result(mut self, state: &AppState, result: &PredictionResult) -> Self {
        self.result = Some(ResultView {
            headline: state.formatter.headline(result),
            probabilities: state
                .formatter
                .distribution_rows(result)
                .into_iter()
                .map(|(class, percent)| ProbabilityView { class, percent })
                .collect(),
            inputs: result
                .record
                .iter()
                .map(|(name, value)| InputView {
                    name: name.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        });
        self
    }

    pub fn with_error(mut self, err: &AdapterError) -> Self {
        self.error = Some(err.to_string());
        self
    }

    fn base(state: &AppState, fields: Vec<FieldView>) -> Self {
        let unavailable = state.adapter().err().map(|err| UnavailableView {
            message: err.to_string(),
            hint: err.remediation(),
        });
        Self {
            title: state.preset.title.clone(),
            header: state.preset.form_header.clone(),
            submit_label: state.preset.submit_label.clone(),
            unavailable,
            fields,
            error: None,
            result: None,
        }
    }
}

fn field(slot: &FeatureSlot, value: String) -> FieldView {
    let step = match (slot.step, slot.kind) {
        (Some(step), _) => step.to_string(),
        (None, FeatureKind::Integer) => "1".to_string(),
        (None, FeatureKind::Float) => "any".to_string(),
    };
    FieldView {
        name: slot.name.clone(),
        label: slot.display_label().to_string(),
        value,
        step,
        min: slot.min.map(|m| m.to_string()),
        max: slot.max.map(|m| m.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use predict_lib::AppPreset;

    #[test]
    fn test_template_parses() {
        assert!(PageRenderer::new().is_ok());
    }

    #[test]
    fn test_escapes_user_text() {
        let renderer = PageRenderer::new().unwrap();
        let view = PageView {
            title: "House Price Prediction".to_string(),
            header: "Enter house features".to_string(),
            submit_label: "Predict House Price".to_string(),
            unavailable: None,
            fields: vec![],
            error: Some("'<script>' is not a number".to_string()),
            result: None,
        };
        let html = renderer.render(&view).unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_integer_fields_step_by_one() {
        let slot = FeatureSlot::integer("GarageCars").range(0.0, 4.0);
        let view = field(&slot, "1".to_string());
        assert_eq!(view.step, "1");
        assert_eq!(view.min.as_deref(), Some("0"));
        assert_eq!(view.max.as_deref(), Some("4"));

        let view = field(&FeatureSlot::float("proline"), String::new());
        assert_eq!(view.step, "any");
        assert!(view.min.is_none());
    }

    #[test]
    fn test_wine_fields_accept_any_precision() {
        let preset = AppPreset::wine();
        let fields: Vec<FieldView> = preset
            .schema
            .slots()
            .iter()
            .map(|slot| field(slot, "1.71".to_string()))
            .collect();
        assert!(fields.iter().all(|f| f.step == "any"));

        let view = PageView {
            title: preset.title.clone(),
            header: preset.form_header.clone(),
            submit_label: preset.submit_label.clone(),
            unavailable: None,
            fields,
            error: None,
            result: None,
        };
        let html = PageRenderer::new().unwrap().render(&view).unwrap();
        assert_eq!(html.matches(r#"step="any""#).count(), 6);
        assert!(!html.contains(r#"step="0.1""#));
    }
}
