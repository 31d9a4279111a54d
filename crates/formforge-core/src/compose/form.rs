//! The composed, executable form.

use std::sync::{Arc, OnceLock};

use chrono::Utc;
use formforge_types::error::{ConfigurationError, FormError, ValidationErrors};
use formforge_types::field::{Choice, FieldKind, FieldType, Widget};
use formforge_types::form::FormId;
use formforge_types::handler::HandlerType;
use formforge_types::submission::{
    CleanedData, FieldValue, Submission, SubmissionReceipt, SubmittedData,
};
use serde::Serialize;
use tracing::{error, info, instrument};

use super::clean::clean_form;
use super::render::render_form;
use crate::handler::BoxSubmissionHandler;

/// One input of a composed form, derived from a stored field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormInput {
    pub name: String,
    pub label: String,
    pub help_text: String,
    pub required: bool,
    pub widget: Widget,
    pub field_type: FieldType,
    pub order: i32,
    /// Subtype configuration: constraints, initial value, choices.
    pub kind: FieldKind,
}

impl FormInput {
    /// Whether the input submits a list of values.
    pub fn is_multiple(&self) -> bool {
        matches!(
            self.field_type,
            FieldType::MultipleChoice | FieldType::ManyToMany
        )
    }

    pub fn choices(&self) -> &[Choice] {
        self.kind.choices().unwrap_or(&[])
    }

    /// The configured initial value, as a typed value.
    pub fn initial(&self) -> FieldValue {
        match &self.kind {
            FieldKind::Char { initial, .. }
            | FieldKind::Text { initial, .. }
            | FieldKind::Email { initial, .. }
            | FieldKind::Url { initial, .. }
            | FieldKind::Choice { initial, .. }
            | FieldKind::ForeignKey { initial, .. } => initial
                .clone()
                .map(FieldValue::Text)
                .unwrap_or(FieldValue::Null),
            FieldKind::Boolean { initial } | FieldKind::NullBoolean { initial } => {
                initial.map(FieldValue::Bool).unwrap_or(FieldValue::Null)
            }
            FieldKind::Date { initial } => initial.map(FieldValue::Date).unwrap_or(FieldValue::Null),
            FieldKind::DateTime { initial } => initial
                .map(FieldValue::DateTime)
                .unwrap_or(FieldValue::Null),
            FieldKind::Time { initial } => initial.map(FieldValue::Time).unwrap_or(FieldValue::Null),
            FieldKind::Decimal { initial, .. } => initial
                .map(FieldValue::Decimal)
                .unwrap_or(FieldValue::Null),
            FieldKind::Float { initial, .. } => {
                initial.map(FieldValue::Float).unwrap_or(FieldValue::Null)
            }
            FieldKind::Integer { initial, .. } => initial
                .map(FieldValue::Integer)
                .unwrap_or(FieldValue::Null),
            FieldKind::MultipleChoice { initial, .. } | FieldKind::ManyToMany { initial, .. } => {
                FieldValue::List(initial.clone())
            }
        }
    }
}

/// A handler in the composed chain, as shown to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerSummary {
    pub name: String,
    pub handler_type: HandlerType,
    pub order: i32,
}

/// Structural description of a composed form.
///
/// Composing the same stored schema twice yields equal descriptors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormDescriptor {
    pub form_id: FormId,
    pub title: String,
    pub target_model: Option<String>,
    pub inputs: Vec<FormInput>,
    pub handlers: Vec<HandlerSummary>,
}

enum Outcome {
    Valid(CleanedData),
    Invalid(ValidationErrors),
}

/// An executable form: inputs, validator, renderer, and handler chain.
///
/// Bound when it carries submitted data. Validation runs at most once per
/// bound form and is cached.
#[derive(Clone)]
pub struct ComposedForm {
    descriptor: FormDescriptor,
    handlers: Vec<Arc<BoxSubmissionHandler>>,
    data: Option<SubmittedData>,
    outcome: Arc<OnceLock<Outcome>>,
}

impl ComposedForm {
    pub(crate) fn new(
        descriptor: FormDescriptor,
        handlers: Vec<Arc<BoxSubmissionHandler>>,
        data: Option<SubmittedData>,
    ) -> Self {
        Self {
            descriptor,
            handlers,
            data,
            outcome: Arc::new(OnceLock::new()),
        }
    }

    pub fn form_id(&self) -> FormId {
        self.descriptor.form_id
    }

    pub fn title(&self) -> &str {
        &self.descriptor.title
    }

    pub fn descriptor(&self) -> &FormDescriptor {
        &self.descriptor
    }

    pub fn inputs(&self) -> &[FormInput] {
        &self.descriptor.inputs
    }

    pub fn input(&self, name: &str) -> Option<&FormInput> {
        self.descriptor.inputs.iter().find(|i| i.name == name)
    }

    pub fn is_bound(&self) -> bool {
        self.data.is_some()
    }

    pub fn data(&self) -> Option<&SubmittedData> {
        self.data.as_ref()
    }

    /// A bound copy of this form. The handler chain is shared.
    pub fn bind(&self, data: SubmittedData) -> ComposedForm {
        ComposedForm::new(self.descriptor.clone(), self.handlers.clone(), Some(data))
    }

    fn outcome(&self) -> Option<&Outcome> {
        let data = self.data.as_ref()?;
        Some(self.outcome.get_or_init(|| {
            match clean_form(&self.descriptor.inputs, data) {
                Ok(cleaned) => Outcome::Valid(cleaned),
                Err(errors) => Outcome::Invalid(errors),
            }
        }))
    }

    /// Validate the bound data, returning the cleaned values.
    pub fn validate(&self) -> Result<&CleanedData, FormError> {
        match self.outcome() {
            None => Err(ConfigurationError::ValidateOnUnboundForm.into()),
            Some(Outcome::Valid(cleaned)) => Ok(cleaned),
            Some(Outcome::Invalid(errors)) => Err(FormError::Validation(errors.clone())),
        }
    }

    /// False for an unbound form.
    pub fn is_valid(&self) -> bool {
        matches!(self.outcome(), Some(Outcome::Valid(_)))
    }

    /// Validation messages; `None` when unbound or valid.
    pub fn errors(&self) -> Option<&ValidationErrors> {
        match self.outcome() {
            Some(Outcome::Invalid(errors)) => Some(errors),
            _ => None,
        }
    }

    pub fn cleaned_data(&self) -> Option<&CleanedData> {
        match self.outcome() {
            Some(Outcome::Valid(cleaned)) => Some(cleaned),
            _ => None,
        }
    }

    pub fn render_html(&self) -> String {
        render_form(&self.descriptor, self.data.as_ref(), self.errors())
    }

    /// Validate, then run every handler in ascending order.
    ///
    /// The first handler failure stops the chain; later handlers are not
    /// invoked.
    #[instrument(skip(self), fields(form_id = %self.descriptor.form_id))]
    pub async fn save(&self) -> Result<SubmissionReceipt, FormError> {
        if !self.is_bound() {
            return Err(ConfigurationError::SaveOnUnboundForm.into());
        }
        let cleaned = self.validate()?.clone();

        let submission = Submission {
            form_id: self.descriptor.form_id,
            form_title: self.descriptor.title.clone(),
            target_model: self.descriptor.target_model.clone(),
            data: cleaned,
            submitted_at: Utc::now(),
        };

        let mut handlers_run = Vec::with_capacity(self.handlers.len());
        for (handler, summary) in self.handlers.iter().zip(&self.descriptor.handlers) {
            if let Err(e) = handler.handle(&submission).await {
                error!(
                    handler = %summary.name,
                    order = summary.order,
                    error = %e,
                    "submission handler failed, aborting chain"
                );
                return Err(ConfigurationError::HandlerFailed {
                    handler: summary.name.clone(),
                    order: summary.order,
                    message: e.to_string(),
                }
                .into());
            }
            handlers_run.push(summary.name.clone());
        }

        info!(handlers = handlers_run.len(), "submission saved");
        Ok(SubmissionReceipt {
            form_id: submission.form_id,
            handlers_run,
            submitted_at: submission.submitted_at,
        })
    }
}

impl std::fmt::Debug for ComposedForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposedForm")
            .field("form_id", &self.descriptor.form_id)
            .field("inputs", &self.descriptor.inputs.len())
            .field("handlers", &self.descriptor.handlers.len())
            .field("bound", &self.is_bound())
            .finish()
    }
}
