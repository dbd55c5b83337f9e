//! Category -> field -> value tables parsed from model output

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::errors::{BuddyError, Result};
use crate::extract::figures::parse_amount;

/// Text shown for a field the model could not fill
pub const PLACEHOLDER: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Amount(f64),
    Placeholder,
}

impl FieldValue {
    /// Interpret one JSON leaf. Numbers are taken as-is, strings go through
    /// the figure parser, everything else is a placeholder.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Number(n) => n.as_f64().map_or(FieldValue::Placeholder, FieldValue::Amount),
            Value::String(s) => parse_amount(s).map_or(FieldValue::Placeholder, FieldValue::Amount),
            _ => FieldValue::Placeholder,
        }
    }

    pub fn amount(&self) -> Option<f64> {
        match self {
            FieldValue::Amount(v) => Some(*v),
            FieldValue::Placeholder => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Amount(v) => f.write_str(&format_amount(*v)),
            FieldValue::Placeholder => f.write_str(PLACEHOLDER),
        }
    }
}

pub type Category = BTreeMap<String, FieldValue>;

/// Structured result of a document analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialReport {
    pub categories: BTreeMap<String, Category>,
}

impl FinancialReport {
    /// Build from a JSON object of objects.
    ///
    /// A top level that is not an object, or a category that is not an
    /// object, is malformed output.
    pub fn from_json(value: &Value) -> Result<Self> {
        let top = value.as_object().ok_or_else(|| {
            BuddyError::MalformedOutput("expected a JSON object of categories".to_string())
        })?;

        let mut categories = BTreeMap::new();
        for (name, fields) in top {
            let fields = fields.as_object().ok_or_else(|| {
                BuddyError::MalformedOutput(format!("category '{}' is not an object", name))
            })?;
            let category: Category = fields
                .iter()
                .map(|(field, leaf)| (field.clone(), FieldValue::from_json(leaf)))
                .collect();
            categories.insert(name.clone(), category);
        }

        Ok(Self { categories })
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.get(name)
    }

    pub fn get(&self, category: &str, field: &str) -> Option<&FieldValue> {
        self.categories.get(category)?.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.values().all(|c| c.is_empty())
    }

    pub fn field_count(&self) -> usize {
        self.categories.values().map(|c| c.len()).sum()
    }

    /// Fields that came back as placeholders, as `(category, field)`
    pub fn missing_fields(&self) -> Vec<(&str, &str)> {
        self.categories
            .iter()
            .flat_map(|(name, fields)| {
                fields
                    .iter()
                    .filter(|(_, v)| **v == FieldValue::Placeholder)
                    .map(move |(field, _)| (name.as_str(), field.as_str()))
            })
            .collect()
    }

    /// Plain key/value table, one block per category
    pub fn render_table(&self) -> String {
        let width = self
            .categories
            .values()
            .flat_map(|c| c.keys())
            .map(|k| k.chars().count())
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        for (name, fields) in &self.categories {
            out.push_str(name);
            out.push('\n');
            for (field, value) in fields {
                out.push_str(&format!("  {:<width$}  {}\n", field, value, width = width));
            }
        }
        out
    }
}

/// Whole numbers print without decimals, the rest with two. Thousands are
/// comma separated.
pub fn format_amount(value: f64) -> String {
    let negative = value < 0.0;
    let rounded = (value.abs() * 100.0).round() / 100.0;
    let whole = rounded.trunc() as u64;
    let cents = ((rounded - rounded.trunc()) * 100.0).round() as u64;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if negative && rounded > 0.0 { "-" } else { "" };
    if cents == 0 {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{:02}", sign, grouped, cents)
    }
}
