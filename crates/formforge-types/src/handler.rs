//! Handler definitions: post-submission actions attached to a form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::field::FieldId;
use crate::form::FormId;

/// Unique identifier for a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandlerId(pub Uuid);

impl HandlerId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for HandlerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for HandlerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Discriminator identifying the concrete handler subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerType {
    EmailNotification,
    SaveInstance,
    EmailConfirmation,
}

impl HandlerType {
    pub const ALL: [HandlerType; 3] = [
        HandlerType::EmailNotification,
        HandlerType::SaveInstance,
        HandlerType::EmailConfirmation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerType::EmailNotification => "email_notification",
            HandlerType::SaveInstance => "save_instance",
            HandlerType::EmailConfirmation => "email_confirmation",
        }
    }
}

impl fmt::Display for HandlerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HandlerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HandlerType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown handler type: '{s}'"))
    }
}

/// Subtype-specific configuration of a handler, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HandlerKind {
    /// Email the submitted data to a fixed recipient list.
    EmailNotification {
        recipients: Vec<String>,
        subject_template: String,
        body_template: String,
        #[serde(default)]
        from_address: Option<String>,
    },
    /// Persist the cleaned data as an instance of a data model.
    SaveInstance {
        /// Overrides the form's target model when set.
        #[serde(default)]
        model: Option<String>,
    },
    /// Email the submitter at the address entered in an email field.
    EmailConfirmation {
        email_field: FieldId,
        subject_template: String,
        body_template: String,
        #[serde(default)]
        from_address: Option<String>,
    },
}

impl HandlerKind {
    pub fn handler_type(&self) -> HandlerType {
        match self {
            HandlerKind::EmailNotification { .. } => HandlerType::EmailNotification,
            HandlerKind::SaveInstance { .. } => HandlerType::SaveInstance,
            HandlerKind::EmailConfirmation { .. } => HandlerType::EmailConfirmation,
        }
    }

    /// The field this handler points at, if any.
    pub fn referenced_field(&self) -> Option<&FieldId> {
        match self {
            HandlerKind::EmailConfirmation { email_field, .. } => Some(email_field),
            _ => None,
        }
    }
}

/// A handler attached to a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerDef {
    pub id: HandlerId,
    pub form_id: FormId,
    pub name: String,
    /// Invocation order, ascending.
    pub order: i32,
    pub kind: HandlerKind,
    pub created_at: DateTime<Utc>,
}

impl HandlerDef {
    pub fn handler_type(&self) -> HandlerType {
        self.kind.handler_type()
    }
}

/// Request to attach a handler to a form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHandler {
    pub name: String,
    #[serde(default)]
    pub order: Option<i32>,
    pub kind: HandlerKind,
}

/// Request to change an attached handler. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateHandler {
    pub name: Option<String>,
    pub order: Option<i32>,
    pub kind: Option<HandlerKind>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_type_roundtrip() {
        for t in HandlerType::ALL {
            let parsed: HandlerType = t.to_string().parse().unwrap();
            assert_eq!(t, parsed);
        }
    }

    #[test]
    fn test_handler_kind_serde_tag() {
        let kind = HandlerKind::SaveInstance { model: None };
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["type"], "save_instance");
        assert_eq!(kind.handler_type(), HandlerType::SaveInstance);
        assert!(kind.referenced_field().is_none());
    }

    #[test]
    fn test_confirmation_references_field() {
        let field = FieldId::new();
        let kind = HandlerKind::EmailConfirmation {
            email_field: field,
            subject_template: "Thanks".to_string(),
            body_template: "Hi {{ name }}".to_string(),
            from_address: None,
        };
        assert_eq!(kind.referenced_field(), Some(&field));
    }
}
