//! Turns stored handler rows into executable handlers.

use std::sync::Arc;

use formforge_types::error::{ConfigurationError, FormError, HandlerError};
use formforge_types::field::FieldType;
use formforge_types::form::FormSchema;
use formforge_types::handler::{HandlerDef, HandlerKind};

use super::box_handler::BoxSubmissionHandler;
use super::builtin::{EmailConfirmationHandler, EmailNotificationHandler, SaveInstanceHandler};
use crate::mail::Mailer;
use crate::repository::instance::InstanceStore;

/// Builds a boxed handler for one stored handler definition.
///
/// Object-safe so the composer can hold `Arc<dyn HandlerFactory>`.
pub trait HandlerFactory: Send + Sync {
    fn build(
        &self,
        def: &HandlerDef,
        schema: &FormSchema,
    ) -> Result<BoxSubmissionHandler, FormError>;
}

/// Wires the built-in handler subtypes to a mailer and an instance store.
pub struct StandardHandlerFactory<M: Mailer, S: InstanceStore> {
    mailer: Arc<M>,
    store: Arc<S>,
    default_from: String,
}

impl<M: Mailer, S: InstanceStore> StandardHandlerFactory<M, S> {
    pub fn new(mailer: Arc<M>, store: Arc<S>, default_from: impl Into<String>) -> Self {
        Self {
            mailer,
            store,
            default_from: default_from.into(),
        }
    }

    fn sender(&self, from_address: &Option<String>) -> String {
        from_address
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.default_from)
            .to_string()
    }
}

impl<M, S> HandlerFactory for StandardHandlerFactory<M, S>
where
    M: Mailer + 'static,
    S: InstanceStore + 'static,
{
    fn build(
        &self,
        def: &HandlerDef,
        schema: &FormSchema,
    ) -> Result<BoxSubmissionHandler, FormError> {
        let handler = match &def.kind {
            HandlerKind::EmailNotification {
                recipients,
                subject_template,
                body_template,
                from_address,
            } => BoxSubmissionHandler::new(
                EmailNotificationHandler::new(
                    def.name.clone(),
                    self.sender(from_address),
                    recipients.clone(),
                    subject_template,
                    body_template,
                    Arc::clone(&self.mailer),
                )
                .map_err(|e| invalid_template(def, e))?,
            ),
            HandlerKind::EmailConfirmation {
                email_field,
                subject_template,
                body_template,
                from_address,
            } => {
                let field = schema
                    .field(email_field)
                    .filter(|f| f.field_type() == FieldType::Email)
                    .ok_or_else(|| ConfigurationError::DanglingFieldReference {
                        handler: def.name.clone(),
                        field: email_field.to_string(),
                    })?;
                BoxSubmissionHandler::new(
                    EmailConfirmationHandler::new(
                        def.name.clone(),
                        self.sender(from_address),
                        field.name.clone(),
                        subject_template,
                        body_template,
                        Arc::clone(&self.mailer),
                    )
                    .map_err(|e| invalid_template(def, e))?,
                )
            }
            HandlerKind::SaveInstance { model } => {
                let model = model
                    .clone()
                    .or_else(|| schema.form.target_model.clone())
                    .ok_or_else(|| {
                        ConfigurationError::UnknownModel(format!(
                            "handler '{}' has no model and form '{}' is not model-bound",
                            def.name, schema.form.title
                        ))
                    })?;
                BoxSubmissionHandler::new(SaveInstanceHandler::new(
                    def.name.clone(),
                    model,
                    Arc::clone(&self.store),
                ))
            }
        };
        Ok(handler)
    }
}

fn invalid_template(def: &HandlerDef, error: HandlerError) -> ConfigurationError {
    ConfigurationError::InvalidTemplate {
        handler: def.name.clone(),
        message: error.to_string(),
    }
}
