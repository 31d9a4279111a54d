//! Field definitions: the typed inputs attached to a form.
//!
//! A stored field is two-faced: the common columns (`name`, `label`,
//! `widget`, `order`, ...) live on [`FieldDef`], while everything specific
//! to the concrete subtype lives in the [`FieldKind`] tagged union. The
//! [`FieldType`] discriminator is the tag of that union.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::form::FormId;

/// Unique identifier for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldId(pub Uuid);

impl FieldId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for FieldId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FieldId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Discriminator identifying the concrete field subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Char,
    Text,
    Boolean,
    NullBoolean,
    Date,
    #[serde(rename = "datetime")]
    DateTime,
    Time,
    Decimal,
    Email,
    Float,
    Integer,
    Url,
    Choice,
    MultipleChoice,
    ForeignKey,
    ManyToMany,
}

impl FieldType {
    /// Every registered field type, in "choose a type" display order.
    pub const ALL: [FieldType; 16] = [
        FieldType::Char,
        FieldType::Text,
        FieldType::Boolean,
        FieldType::NullBoolean,
        FieldType::Date,
        FieldType::DateTime,
        FieldType::Time,
        FieldType::Decimal,
        FieldType::Email,
        FieldType::Float,
        FieldType::Integer,
        FieldType::Url,
        FieldType::Choice,
        FieldType::MultipleChoice,
        FieldType::ForeignKey,
        FieldType::ManyToMany,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Char => "char",
            FieldType::Text => "text",
            FieldType::Boolean => "boolean",
            FieldType::NullBoolean => "null_boolean",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
            FieldType::Time => "time",
            FieldType::Decimal => "decimal",
            FieldType::Email => "email",
            FieldType::Float => "float",
            FieldType::Integer => "integer",
            FieldType::Url => "url",
            FieldType::Choice => "choice",
            FieldType::MultipleChoice => "multiple_choice",
            FieldType::ForeignKey => "foreign_key",
            FieldType::ManyToMany => "many_to_many",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown field type: '{s}'"))
    }
}

/// Input-rendering strategy for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Widget {
    TextInput,
    Textarea,
    PasswordInput,
    HiddenInput,
    CheckboxInput,
    NullBooleanSelect,
    Select,
    RadioSelect,
    SelectMultiple,
    CheckboxSelectMultiple,
    DateInput,
    DateTimeInput,
    SplitDateTime,
    TimeInput,
    NumberInput,
    EmailInput,
    UrlInput,
}

impl Widget {
    pub const ALL: [Widget; 17] = [
        Widget::TextInput,
        Widget::Textarea,
        Widget::PasswordInput,
        Widget::HiddenInput,
        Widget::CheckboxInput,
        Widget::NullBooleanSelect,
        Widget::Select,
        Widget::RadioSelect,
        Widget::SelectMultiple,
        Widget::CheckboxSelectMultiple,
        Widget::DateInput,
        Widget::DateTimeInput,
        Widget::SplitDateTime,
        Widget::TimeInput,
        Widget::NumberInput,
        Widget::EmailInput,
        Widget::UrlInput,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Widget::TextInput => "text_input",
            Widget::Textarea => "textarea",
            Widget::PasswordInput => "password_input",
            Widget::HiddenInput => "hidden_input",
            Widget::CheckboxInput => "checkbox_input",
            Widget::NullBooleanSelect => "null_boolean_select",
            Widget::Select => "select",
            Widget::RadioSelect => "radio_select",
            Widget::SelectMultiple => "select_multiple",
            Widget::CheckboxSelectMultiple => "checkbox_select_multiple",
            Widget::DateInput => "date_input",
            Widget::DateTimeInput => "datetime_input",
            Widget::SplitDateTime => "split_datetime",
            Widget::TimeInput => "time_input",
            Widget::NumberInput => "number_input",
            Widget::EmailInput => "email_input",
            Widget::UrlInput => "url_input",
        }
    }

    /// Whether this widget submits a list of values rather than one.
    pub fn is_multiple(&self) -> bool {
        matches!(self, Widget::SelectMultiple | Widget::CheckboxSelectMultiple)
    }
}

impl fmt::Display for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Widget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Widget::ALL
            .into_iter()
            .find(|w| w.as_str() == s)
            .ok_or_else(|| format!("'{s}' is not a known widget"))
    }
}

/// One selectable option for choice and relation fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl Choice {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Subtype-specific configuration of a field.
///
/// Internally tagged by `type`, which is always the [`FieldType`] string:
/// ```json
/// { "type": "char", "max_length": 120, "min_length": null, "initial": null }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Char {
        #[serde(default)]
        max_length: Option<u32>,
        #[serde(default)]
        min_length: Option<u32>,
        #[serde(default)]
        initial: Option<String>,
    },
    Text {
        #[serde(default)]
        max_length: Option<u32>,
        #[serde(default)]
        min_length: Option<u32>,
        #[serde(default)]
        initial: Option<String>,
    },
    Boolean {
        #[serde(default)]
        initial: Option<bool>,
    },
    NullBoolean {
        #[serde(default)]
        initial: Option<bool>,
    },
    Date {
        #[serde(default)]
        initial: Option<NaiveDate>,
    },
    #[serde(rename = "datetime")]
    DateTime {
        #[serde(default)]
        initial: Option<NaiveDateTime>,
    },
    Time {
        #[serde(default)]
        initial: Option<NaiveTime>,
    },
    Decimal {
        #[serde(default)]
        max_digits: Option<u32>,
        #[serde(default)]
        decimal_places: Option<u32>,
        #[serde(default)]
        min_value: Option<Decimal>,
        #[serde(default)]
        max_value: Option<Decimal>,
        #[serde(default)]
        initial: Option<Decimal>,
    },
    Email {
        #[serde(default)]
        max_length: Option<u32>,
        #[serde(default)]
        initial: Option<String>,
    },
    Float {
        #[serde(default)]
        min_value: Option<f64>,
        #[serde(default)]
        max_value: Option<f64>,
        #[serde(default)]
        initial: Option<f64>,
    },
    Integer {
        #[serde(default)]
        min_value: Option<i64>,
        #[serde(default)]
        max_value: Option<i64>,
        #[serde(default)]
        initial: Option<i64>,
    },
    Url {
        #[serde(default)]
        max_length: Option<u32>,
        #[serde(default)]
        initial: Option<String>,
    },
    Choice {
        choices: Vec<Choice>,
        #[serde(default)]
        initial: Option<String>,
    },
    MultipleChoice {
        choices: Vec<Choice>,
        #[serde(default)]
        initial: Vec<String>,
    },
    ForeignKey {
        related_model: String,
        #[serde(default)]
        choices: Vec<Choice>,
        #[serde(default)]
        initial: Option<String>,
    },
    ManyToMany {
        related_model: String,
        #[serde(default)]
        choices: Vec<Choice>,
        #[serde(default)]
        initial: Vec<String>,
    },
}

impl FieldKind {
    /// The discriminator for this subtype.
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldKind::Char { .. } => FieldType::Char,
            FieldKind::Text { .. } => FieldType::Text,
            FieldKind::Boolean { .. } => FieldType::Boolean,
            FieldKind::NullBoolean { .. } => FieldType::NullBoolean,
            FieldKind::Date { .. } => FieldType::Date,
            FieldKind::DateTime { .. } => FieldType::DateTime,
            FieldKind::Time { .. } => FieldType::Time,
            FieldKind::Decimal { .. } => FieldType::Decimal,
            FieldKind::Email { .. } => FieldType::Email,
            FieldKind::Float { .. } => FieldType::Float,
            FieldKind::Integer { .. } => FieldType::Integer,
            FieldKind::Url { .. } => FieldType::Url,
            FieldKind::Choice { .. } => FieldType::Choice,
            FieldKind::MultipleChoice { .. } => FieldType::MultipleChoice,
            FieldKind::ForeignKey { .. } => FieldType::ForeignKey,
            FieldKind::ManyToMany { .. } => FieldType::ManyToMany,
        }
    }

    /// Selectable options, for choice and relation subtypes.
    pub fn choices(&self) -> Option<&[Choice]> {
        match self {
            FieldKind::Choice { choices, .. }
            | FieldKind::MultipleChoice { choices, .. }
            | FieldKind::ForeignKey { choices, .. }
            | FieldKind::ManyToMany { choices, .. } => Some(choices),
            _ => None,
        }
    }

    /// Name of the related data model, for relation subtypes.
    pub fn related_model(&self) -> Option<&str> {
        match self {
            FieldKind::ForeignKey { related_model, .. }
            | FieldKind::ManyToMany { related_model, .. } => Some(related_model),
            _ => None,
        }
    }

    /// A default-configured kind for the given type (no constraints, no initial).
    ///
    /// Relation kinds get an empty `related_model`; callers fill it in.
    pub fn empty(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Char => FieldKind::Char {
                max_length: None,
                min_length: None,
                initial: None,
            },
            FieldType::Text => FieldKind::Text {
                max_length: None,
                min_length: None,
                initial: None,
            },
            FieldType::Boolean => FieldKind::Boolean { initial: None },
            FieldType::NullBoolean => FieldKind::NullBoolean { initial: None },
            FieldType::Date => FieldKind::Date { initial: None },
            FieldType::DateTime => FieldKind::DateTime { initial: None },
            FieldType::Time => FieldKind::Time { initial: None },
            FieldType::Decimal => FieldKind::Decimal {
                max_digits: None,
                decimal_places: None,
                min_value: None,
                max_value: None,
                initial: None,
            },
            FieldType::Email => FieldKind::Email {
                max_length: None,
                initial: None,
            },
            FieldType::Float => FieldKind::Float {
                min_value: None,
                max_value: None,
                initial: None,
            },
            FieldType::Integer => FieldKind::Integer {
                min_value: None,
                max_value: None,
                initial: None,
            },
            FieldType::Url => FieldKind::Url {
                max_length: None,
                initial: None,
            },
            FieldType::Choice => FieldKind::Choice {
                choices: Vec::new(),
                initial: None,
            },
            FieldType::MultipleChoice => FieldKind::MultipleChoice {
                choices: Vec::new(),
                initial: Vec::new(),
            },
            FieldType::ForeignKey => FieldKind::ForeignKey {
                related_model: String::new(),
                choices: Vec::new(),
                initial: None,
            },
            FieldType::ManyToMany => FieldKind::ManyToMany {
                related_model: String::new(),
                choices: Vec::new(),
                initial: Vec::new(),
            },
        }
    }
}

/// A field attached to a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub id: FieldId,
    pub form_id: FormId,
    /// Attribute name; unique within the owning form.
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub help_text: String,
    pub required: bool,
    pub widget: Widget,
    /// Render/tab order, ascending. Need not be contiguous.
    pub order: i32,
    pub kind: FieldKind,
    pub created_at: DateTime<Utc>,
}

impl FieldDef {
    pub fn field_type(&self) -> FieldType {
        self.kind.field_type()
    }
}

/// Request to attach a new field to a form.
///
/// Only `name` and `kind` are required. The label defaults to a humanized
/// name, the widget to the subtype's default, and the order to the end of
/// the form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewField {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub help_text: Option<String>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub widget: Option<Widget>,
    #[serde(default)]
    pub order: Option<i32>,
    pub kind: FieldKind,
}

impl NewField {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: None,
            help_text: None,
            required: None,
            widget: None,
            order: None,
            kind,
        }
    }
}

/// Request to change an attached field. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateField {
    pub name: Option<String>,
    pub label: Option<String>,
    pub help_text: Option<String>,
    pub required: Option<bool>,
    pub widget: Option<Widget>,
    pub order: Option<i32>,
    pub kind: Option<FieldKind>,
}

/// Turn an attribute name into a display label: `first_name` -> `First name`.
pub fn humanize(name: &str) -> String {
    let spaced = name.trim().replace(['_', '-'], " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
