//! Actors and the admin actions the permission gate authorizes.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::field::FieldType;
use crate::form::FormId;
use crate::handler::HandlerType;

/// The administrator performing an action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub username: String,
    #[serde(default)]
    pub is_superuser: bool,
    /// Attribute-level permission codenames (e.g. `add_email_field`).
    #[serde(default)]
    pub permissions: HashSet<String>,
    /// Read-only actors are vetoed on every mutation.
    #[serde(default)]
    pub read_only: bool,
}

impl Actor {
    pub fn superuser(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            is_superuser: true,
            ..Default::default()
        }
    }

    pub fn with_permissions<I, S>(username: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            username: username.into(),
            permissions: permissions.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn has_permission(&self, codename: &str) -> bool {
        self.is_superuser || self.permissions.contains(codename)
    }
}

/// Create/change/delete verbs, matching the permission codename prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verb {
    Add,
    Change,
    Delete,
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verb::Add => "add",
            Verb::Change => "change",
            Verb::Delete => "delete",
        })
    }
}

/// An administrative mutation subject to the permission gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AdminAction {
    CreateForm,
    UpdateForm { form_id: FormId },
    DeleteForm { form_id: FormId },
    CloneForm { source: FormId },
    Field {
        verb: Verb,
        form_id: FormId,
        field_type: FieldType,
    },
    Handler {
        verb: Verb,
        form_id: FormId,
        handler_type: HandlerType,
    },
}

impl AdminAction {
    /// The attribute-level permission codename this action requires.
    ///
    /// Field and handler actions are scoped to the concrete subtype, so
    /// `add_email_field` does not imply `add_char_field`.
    pub fn codename(&self) -> String {
        match self {
            AdminAction::CreateForm => "add_form".to_string(),
            AdminAction::UpdateForm { .. } => "change_form".to_string(),
            AdminAction::DeleteForm { .. } => "delete_form".to_string(),
            AdminAction::CloneForm { .. } => "add_form".to_string(),
            AdminAction::Field {
                verb, field_type, ..
            } => format!("{verb}_{field_type}_field"),
            AdminAction::Handler {
                verb,
                handler_type,
                ..
            } => format!("{verb}_{handler_type}_handler"),
        }
    }

    /// The form this action touches, if it touches an existing one.
    pub fn form_id(&self) -> Option<&FormId> {
        match self {
            AdminAction::CreateForm => None,
            AdminAction::UpdateForm { form_id }
            | AdminAction::DeleteForm { form_id }
            | AdminAction::Field { form_id, .. }
            | AdminAction::Handler { form_id, .. } => Some(form_id),
            AdminAction::CloneForm { source } => Some(source),
        }
    }
}

impl fmt::Display for AdminAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.codename())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codenames() {
        let form_id = FormId::new();
        assert_eq!(AdminAction::CreateForm.codename(), "add_form");
        assert_eq!(AdminAction::UpdateForm { form_id }.codename(), "change_form");
        assert_eq!(
            AdminAction::Field {
                verb: Verb::Add,
                form_id,
                field_type: FieldType::Email,
            }
            .codename(),
            "add_email_field"
        );
        assert_eq!(
            AdminAction::Handler {
                verb: Verb::Delete,
                form_id,
                handler_type: HandlerType::EmailNotification,
            }
            .codename(),
            "delete_email_notification_handler"
        );
    }

    #[test]
    fn test_superuser_has_every_permission() {
        let actor = Actor::superuser("root");
        assert!(actor.has_permission("delete_form"));

        let limited = Actor::with_permissions("ed", ["add_form"]);
        assert!(limited.has_permission("add_form"));
        assert!(!limited.has_permission("delete_form"));
    }
}
