//! Prediction output post-processing and presentation
//!
//! Normalizes class distributions coming out of predictors and formats
//! results for display (headline, currency, percentages).

use crate::error::{AdapterError, Result};
use crate::models::{ClassProbability, Label, PredictionResult};
use crate::schema::AppPreset;

/// Largest drift from 1.0 a raw distribution may have before it is rejected
pub const DISTRIBUTION_TOLERANCE: f64 = 1e-3;

/// Check a raw distribution and rescale it to sum to exactly 1.0.
///
/// `expected_classes` is the predictor's class count, when it declares one.
pub fn normalize_distribution(
    mut probs: Vec<ClassProbability>,
    expected_classes: Option<usize>,
) -> Result<Vec<ClassProbability>> {
    if probs.is_empty() {
        return Err(AdapterError::Inference("empty probability distribution".to_string()));
    }
    if let Some(expected) = expected_classes {
        if probs.len() != expected {
            return Err(AdapterError::Inference(format!(
                "distribution has {} entries for {} classes",
                probs.len(),
                expected
            )));
        }
    }
    if let Some(bad) = probs.iter().find(|p| !p.probability.is_finite() || p.probability < 0.0) {
        return Err(AdapterError::Inference(format!(
            "invalid probability {} for class {}",
            bad.probability, bad.class
        )));
    }
    let sum: f64 = probs.iter().map(|p| p.probability).sum();
    if (sum - 1.0).abs() > DISTRIBUTION_TOLERANCE {
        return Err(AdapterError::Inference(format!(
            "probabilities sum to {}, expected 1.0",
            sum
        )));
    }
    for p in &mut probs {
        p.probability /= sum;
    }
    Ok(probs)
}

/// Configuration for output formatting
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Prefix of the result line
    pub headline: String,
    /// Currency symbol for regression values; `None` prints a plain number
    pub currency: Option<String>,
    /// Decimal places for regression values
    pub decimals: usize,
    /// Decimal places for probability percentages
    pub percent_decimals: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            headline: "Prediction".to_string(),
            currency: None,
            decimals: 2,
            percent_decimals: 1,
        }
    }
}

/// Formats prediction results for people
#[derive(Debug, Clone, Default)]
pub struct OutputFormatter {
    config: OutputConfig,
}

impl OutputFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Headline and currency of an app preset
    pub fn for_preset(preset: &AppPreset) -> Self {
        Self::with_config(OutputConfig {
            headline: preset.headline.clone(),
            currency: preset.currency.clone(),
            ..OutputConfig::default()
        })
    }

    /// Result line, e.g. "Predicted Sale Price: $250,000.00"
    pub fn headline(&self, result: &PredictionResult) -> String {
        format!("{}: {}", self.config.headline, self.format_label(&result.label))
    }

    pub fn format_label(&self, label: &Label) -> String {
        match label {
            Label::Value(v) => self.format_value(*v),
            Label::Class(c) => c.to_string(),
        }
    }

    pub fn format_value(&self, value: f64) -> String {
        let number = format_thousands(value, self.config.decimals);
        match &self.config.currency {
            Some(symbol) if number.starts_with('-') => format!("-{}{}", symbol, &number[1..]),
            Some(symbol) => format!("{}{}", symbol, number),
            None => number,
        }
    }

    pub fn format_probability(&self, probability: f64) -> String {
        format!("{:.*}%", self.config.percent_decimals, probability * 100.0)
    }

    /// `(class, percentage)` rows in predictor order
    pub fn distribution_rows(&self, result: &PredictionResult) -> Vec<(String, String)> {
        result
            .probabilities
            .iter()
            .flatten()
            .map(|p| (p.class.to_string(), self.format_probability(p.probability)))
            .collect()
    }
}

/// Fixed-point formatting with comma thousands separators
pub fn format_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && formatted.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassLabel, FeatureRecord, Task};

    fn dist(values: &[f64]) -> Vec<ClassProbability> {
        values
            .iter()
            .enumerate()
            .map(|(i, p)| ClassProbability::new(ClassLabel::Index(i as i64), *p))
            .collect()
    }

    fn result(label: Label, probabilities: Option<Vec<ClassProbability>>) -> PredictionResult {
        PredictionResult {
            task: label.task(),
            label,
            probabilities,
            record: FeatureRecord::from_parts(vec![], vec![]),
            model_version: "v1".to_string(),
            latency_us: 10,
            generated_at: 0,
        }
    }

    #[test]
    fn test_normalize_rescales_small_drift() {
        let normalized = normalize_distribution(dist(&[0.1, 0.7, 0.2000004]), Some(3)).unwrap();
        let sum: f64 = normalized.iter().map(|p| p.probability).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_rejects_bad_distributions() {
        assert!(normalize_distribution(dist(&[0.5, 0.6]), None).is_err());
        assert!(normalize_distribution(dist(&[1.2, -0.2]), None).is_err());
        assert!(normalize_distribution(dist(&[0.5, 0.5]), Some(3)).is_err());
        assert!(normalize_distribution(vec![], None).is_err());
        assert!(normalize_distribution(dist(&[f64::NAN, 1.0]), None).is_err());
    }

    #[test]
    fn test_thousands_grouping() {
        assert_eq!(format_thousands(250000.0, 2), "250,000.00");
        assert_eq!(format_thousands(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_thousands(999.0, 0), "999");
        assert_eq!(format_thousands(-1500.5, 1), "-1,500.5");
        assert_eq!(format_thousands(-0.001, 2), "0.00");
    }

    #[test]
    fn test_house_headline() {
        let formatter = OutputFormatter::for_preset(&AppPreset::house());
        let r = result(Label::Value(250000.0), None);
        assert_eq!(formatter.headline(&r), "Predicted Sale Price: $250,000.00");
        assert_eq!(formatter.format_value(-12.5), "-$12.50");
        assert!(formatter.distribution_rows(&r).is_empty());
    }

    #[test]
    fn test_classification_rows() {
        let formatter = OutputFormatter::new();
        let r = result(
            Label::Class(ClassLabel::Index(1)),
            Some(dist(&[0.1, 0.7, 0.2])),
        );
        assert_eq!(r.task, Task::Classification);
        assert_eq!(formatter.headline(&r), "Prediction: 1");
        assert_eq!(
            formatter.distribution_rows(&r),
            vec![
                ("0".to_string(), "10.0%".to_string()),
                ("1".to_string(), "70.0%".to_string()),
                ("2".to_string(), "20.0%".to_string()),
            ]
        );
    }
}
