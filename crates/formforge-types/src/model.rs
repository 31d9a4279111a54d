//! Target data models exposed to model-bound forms.
//!
//! A model-bound form picks a subset of a model's attributes; each picked
//! attribute becomes one stored field whose subtype is resolved from the
//! attribute's semantic type.

use serde::{Deserialize, Serialize};

use std::fmt;

use crate::field::Choice;

/// Semantic type of a data-model attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    Text,
    LongText,
    Boolean,
    Date,
    #[serde(rename = "datetime")]
    DateTime,
    Time,
    Decimal,
    Float,
    Integer,
    Email,
    Url,
    Relation,
    Binary,
    Json,
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AttributeType::Text => "text",
            AttributeType::LongText => "long_text",
            AttributeType::Boolean => "boolean",
            AttributeType::Date => "date",
            AttributeType::DateTime => "datetime",
            AttributeType::Time => "time",
            AttributeType::Decimal => "decimal",
            AttributeType::Float => "float",
            AttributeType::Integer => "integer",
            AttributeType::Email => "email",
            AttributeType::Url => "url",
            AttributeType::Relation => "relation",
            AttributeType::Binary => "binary",
            AttributeType::Json => "json",
        };
        f.write_str(s)
    }
}

/// One attribute of a target data model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub max_digits: Option<u32>,
    #[serde(default)]
    pub decimal_places: Option<u32>,
    /// Target model for relation attributes.
    #[serde(default)]
    pub related_model: Option<String>,
    /// To-many relation when true.
    #[serde(default)]
    pub many: bool,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

fn default_true() -> bool {
    true
}

impl AttributeSpec {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            label: None,
            required: true,
            max_length: None,
            max_digits: None,
            decimal_places: None,
            related_model: None,
            many: false,
            choices: Vec::new(),
        }
    }
}

/// A target data model: a name and its attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<AttributeSpec>,
}

impl ModelSpec {
    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| a.name == name)
    }
}
