use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::field::{FieldDef, FieldId};
use crate::handler::HandlerDef;

/// Unique identifier for a form, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FormId(pub Uuid);

impl FormId {
    /// Create a new FormId using UUID v7.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for FormId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FormId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A stored form schema header.
///
/// Fields and handlers are stored separately and owned exclusively by the
/// form: deleting the form deletes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    pub id: FormId,
    pub title: String,
    /// Name of the target data model for model-bound forms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_model: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a new form. Only `title` is required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFormRequest {
    pub title: String,
    #[serde(default)]
    pub target_model: Option<String>,
}

/// Request to update a form header. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateFormRequest {
    pub title: Option<String>,
}

/// Request to clone a form under a new title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloneFormRequest {
    pub title: String,
}

/// A form together with all of its attached fields and handlers.
///
/// Fields and handlers are kept in storage order (ascending `order`, ties in
/// insertion order). Use [`FormSchema::sort`] after building one by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    pub form: Form,
    pub fields: Vec<FieldDef>,
    pub handlers: Vec<HandlerDef>,
}

impl FormSchema {
    /// Stable-sort fields and handlers by their `order` value.
    ///
    /// Equal `order` values keep their relative (insertion) position.
    pub fn sort(&mut self) {
        self.fields.sort_by_key(|f| f.order);
        self.handlers.sort_by_key(|h| h.order);
    }

    pub fn field(&self, id: &FieldId) -> Option<&FieldDef> {
        self.fields.iter().find(|f| &f.id == id)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Next free field order value (max + 1, or 0 for an empty form).
    pub fn next_field_order(&self) -> i32 {
        self.fields.iter().map(|f| f.order).max().map_or(0, |m| m + 1)
    }

    /// Next free handler order value (max + 1, or 0 when none are attached).
    pub fn next_handler_order(&self) -> i32 {
        self.handlers.iter().map(|h| h.order).max().map_or(0, |m| m + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldKind, Widget};

    fn field(form_id: FormId, name: &str, order: i32) -> FieldDef {
        FieldDef {
            id: FieldId::new(),
            form_id,
            name: name.to_string(),
            label: name.to_string(),
            help_text: String::new(),
            required: true,
            widget: Widget::TextInput,
            order,
            kind: FieldKind::Char {
                max_length: None,
                min_length: None,
                initial: None,
            },
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_form_id_display_parse() {
        let id = FormId::new();
        let parsed: FormId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        let now = Utc::now();
        let form = Form {
            id: FormId::new(),
            title: "Contact".to_string(),
            target_model: None,
            created_at: now,
            updated_at: now,
        };
        let mut schema = FormSchema {
            fields: vec![
                field(form.id, "c", 5),
                field(form.id, "a", 1),
                field(form.id, "b", 1),
            ],
            handlers: Vec::new(),
            form,
        };
        schema.sort();

        let names: Vec<&str> = schema.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(schema.next_field_order(), 6);
        assert_eq!(schema.next_handler_order(), 0);
    }
}
