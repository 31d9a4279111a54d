use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Key under which form-wide (non field-scoped) messages are collected.
pub const NON_FIELD_ERRORS: &str = "__all__";

/// Errors surfaced by form composition, submission, and administration.
#[derive(Debug, Error)]
pub enum FormError {
    /// The referenced form/field/handler does not exist or does not belong
    /// to the expected parent.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Submitted data failed per-field or whole-form constraints.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// An authorization check vetoed the action.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Programmer/integration misuse; not something an end user can fix.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// An attribute type with no field mapping.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// A field name (attribute) already consumed on this form.
    #[error("name '{0}' is already used on this form")]
    DuplicateName(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl FormError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        FormError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// A single field-scoped validation failure.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        FormError::Validation(errors)
    }
}

impl From<RepositoryError> for FormError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Conflict(name) => FormError::DuplicateName(name),
            RepositoryError::Integrity(msg) => {
                FormError::Configuration(ConfigurationError::Integrity(msg))
            }
            other => FormError::Storage(other.to_string()),
        }
    }
}

/// Programmer-level misuse or broken stored data.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("save() called on an unbound form")]
    SaveOnUnboundForm,

    #[error("validate() called on an unbound form")]
    ValidateOnUnboundForm,

    #[error("handler '{handler}' (order {order}) failed: {message}")]
    HandlerFailed {
        handler: String,
        order: i32,
        message: String,
    },

    #[error("unregistered {kind} discriminator '{tag}'")]
    UnregisteredDiscriminator { kind: &'static str, tag: String },

    #[error("unknown target model '{0}'")]
    UnknownModel(String),

    #[error("handler '{handler}' references field {field} which is not an email field of this form")]
    DanglingFieldReference { handler: String, field: String },

    #[error("handler '{handler}' has an invalid template: {message}")]
    InvalidTemplate { handler: String, message: String },

    #[error("data integrity error: {0}")]
    Integrity(String),
}

/// Field-scoped validation messages, in the order they were recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    errors: Vec<FieldErrors>,
}

/// All messages for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors {
    pub field: String,
    pub messages: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let field = field.into();
        let message = message.into();
        match self.errors.iter_mut().find(|e| e.field == field) {
            Some(entry) => entry.messages.push(message),
            None => self.errors.push(FieldErrors {
                field,
                messages: vec![message],
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Messages for one field (empty slice when the field is clean).
    pub fn get(&self, field: &str) -> &[String] {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.messages.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldErrors> {
        self.errors.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.messages.join(" ")))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

/// Error returned by a submission handler's `handle`.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid template: {0}")]
    InvalidTemplate(#[from] handlebars::TemplateError),

    #[error("template error: {0}")]
    Template(#[from] handlebars::RenderError),

    #[error("{0}")]
    Other(String),
}

/// Errors from repository operations (used by trait definitions in formforge-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored row could not be mapped back to a domain value.
    #[error("integrity error: {0}")]
    Integrity(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_group_by_field() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "This field is required.");
        errors.add("email", "Enter a valid email address.");
        errors.add("title", "Ensure this value has at most 5 characters.");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("title").len(), 2);
        assert!(errors.get("missing").is_empty());

        let names: Vec<&str> = errors.fields().map(|e| e.field.as_str()).collect();
        assert_eq!(names, vec!["title", "email"]);
    }

    #[test]
    fn test_form_error_display() {
        let err = FormError::not_found("form", "abc");
        assert_eq!(err.to_string(), "form not found: abc");

        let err = FormError::from(ConfigurationError::SaveOnUnboundForm);
        assert!(err.to_string().contains("unbound"));
    }

    #[test]
    fn test_repository_conflict_maps_to_duplicate_name() {
        let err = FormError::from(RepositoryError::Conflict("email".to_string()));
        assert!(matches!(err, FormError::DuplicateName(ref n) if n == "email"));
    }

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }
}
