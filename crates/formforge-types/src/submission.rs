//! Submitted (raw) and cleaned (typed) form data.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::form::FormId;

/// A single submitted value, as carried by a JSON body or an HTML form post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
}

impl RawValue {
    /// Whether the value counts as "no input" for required-field checks.
    pub fn is_empty(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Text(s) => s.trim().is_empty(),
            RawValue::List(items) => items.iter().all(|s| s.trim().is_empty()),
            _ => false,
        }
    }

    /// Single-value text form. Lists yield their last element, as an HTML
    /// form does for a non-multiple input.
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawValue::Null => None,
            RawValue::Bool(b) => Some(b.to_string()),
            RawValue::Int(i) => Some(i.to_string()),
            RawValue::Float(f) => Some(f.to_string()),
            RawValue::Text(s) => Some(s.trim().to_string()),
            RawValue::List(items) => items.last().map(|s| s.trim().to_string()),
        }
    }

    /// Multi-value form: a scalar becomes a one-element list.
    pub fn as_list(&self) -> Vec<String> {
        match self {
            RawValue::Null => Vec::new(),
            RawValue::List(items) => items
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            other => other.as_text().into_iter().filter(|s| !s.is_empty()).collect(),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Bool(b)
    }
}

impl From<i64> for RawValue {
    fn from(i: i64) -> Self {
        RawValue::Int(i)
    }
}

impl From<Vec<String>> for RawValue {
    fn from(items: Vec<String>) -> Self {
        RawValue::List(items)
    }
}

/// Input data for binding a form, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmittedData(BTreeMap<String, RawValue>);

impl SubmittedData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<RawValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse from a JSON object. Non-object input is rejected.
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

/// A validated, typed field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Decimal(Decimal),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(b) => write!(f, "{}", if *b { "yes" } else { "no" }),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Float(x) => write!(f, "{x}"),
            FieldValue::Decimal(d) => write!(f, "{d}"),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            FieldValue::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::List(items) => f.write_str(&items.join(", ")),
        }
    }
}

/// Validated data keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CleanedData(BTreeMap<String, FieldValue>);

impl CleanedData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// What a handler receives: the bound, validated submission.
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub form_id: FormId,
    pub form_title: String,
    /// The form's target model, when it is model-bound.
    pub target_model: Option<String>,
    pub data: CleanedData,
    pub submitted_at: DateTime<Utc>,
}

/// Result of a successful save: which handlers ran, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub form_id: FormId,
    pub handlers_run: Vec<String>,
    pub submitted_at: DateTime<Utc>,
}

/// A row written by the save-instance handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredInstance {
    pub id: uuid::Uuid,
    pub model: String,
    pub form_id: FormId,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
