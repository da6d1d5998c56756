//! Record assembly for single-row inference
//!
//! Turns raw user input keyed by feature name into a [`FeatureRecord`] whose
//! columns follow the schema, then exposes it to predictors as a one-row
//! [`FeatureFrame`].

use crate::error::{AdapterError, Result};
use crate::models::FeatureRecord;
use crate::schema::{FeatureKind, FeatureSchema, FeatureSlot};
use std::collections::HashMap;

/// Raw numeric inputs keyed by feature name
pub type RawValues = HashMap<String, f64>;

/// Build a record by walking the schema in order.
///
/// Every slot must have a finite value; integer slots reject fractional
/// values; declared bounds are enforced; names unknown to the schema are
/// rejected. The iteration order of `raw` never influences the output.
pub fn build_record(schema: &FeatureSchema, raw: &RawValues) -> Result<FeatureRecord> {
    let mut columns = Vec::with_capacity(schema.len());
    let mut values = Vec::with_capacity(schema.len());

    for slot in schema.slots() {
        let value = *raw.get(&slot.name).ok_or_else(|| AdapterError::MissingFeature {
            name: slot.name.clone(),
        })?;
        check_value(slot, value)?;
        columns.push(slot.name.clone());
        values.push(value);
    }

    // Smallest unknown name first so the error does not depend on hash order
    if let Some(name) = raw.keys().filter(|k| !schema.contains(k)).min() {
        return Err(AdapterError::UnexpectedFeature { name: name.clone() });
    }

    Ok(FeatureRecord::from_parts(columns, values))
}

fn check_value(slot: &FeatureSlot, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(AdapterError::InvalidValue {
            name: slot.name.clone(),
            reason: format!("{} is not a finite number", value),
        });
    }
    if slot.kind == FeatureKind::Integer && value.fract() != 0.0 {
        return Err(AdapterError::NotIntegral {
            name: slot.name.clone(),
            value,
        });
    }
    if !slot.contains(value) {
        return Err(AdapterError::OutOfRange {
            name: slot.name.clone(),
            value,
            min: slot.min,
            max: slot.max,
        });
    }
    Ok(())
}

/// Parse textual form fields into raw values.
///
/// Blank fields are treated as absent so they surface as
/// [`AdapterError::MissingFeature`] instead of a silently substituted value.
pub fn parse_raw_values<'a, I>(fields: I) -> Result<RawValues>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut raw = RawValues::new();
    for (name, text) in fields {
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        let value = text.parse::<f64>().map_err(|e| AdapterError::InvalidValue {
            name: name.to_string(),
            reason: format!("'{}' is not a number ({})", text, e),
        })?;
        raw.insert(name.to_string(), value);
    }
    Ok(raw)
}

/// Raw values made of each slot's declared default
pub fn default_values(schema: &FeatureSchema) -> RawValues {
    schema
        .slots()
        .iter()
        .filter_map(|slot| slot.default.map(|d| (slot.name.clone(), d)))
        .collect()
}

/// Single-row tabular view of a record: named columns and one row of values
#[derive(Debug, Clone, Copy)]
pub struct FeatureFrame<'a> {
    columns: &'a [String],
    row: &'a [f64],
}

impl<'a> FeatureFrame<'a> {
    pub fn from_record(record: &'a FeatureRecord) -> Self {
        Self {
            columns: record.columns(),
            row: record.values(),
        }
    }

    pub fn columns(&self) -> &'a [String] {
        self.columns
    }

    pub fn row(&self) -> &'a [f64] {
        self.row
    }

    pub fn width(&self) -> usize {
        self.row.len()
    }

    /// Row values narrowed to f32 for tensor input
    pub fn row_f32(&self) -> Vec<f32> {
        self.row.iter().map(|v| *v as f32).collect()
    }
}
