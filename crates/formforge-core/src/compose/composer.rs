//! FormComposer: builds a [`ComposedForm`] from a stored schema.

use std::sync::Arc;

use formforge_types::error::FormError;
use formforge_types::form::FormId;
use formforge_types::submission::SubmittedData;
use tracing::{debug, instrument};

use super::form::{ComposedForm, FormDescriptor, FormInput, HandlerSummary};
use crate::handler::HandlerFactory;
use crate::repository::form::FormRepository;

/// Runtime entry point for rendering and processing forms.
///
/// Composition is read-only: it never writes to the repository.
pub struct FormComposer<R: FormRepository> {
    repo: R,
    factory: Arc<dyn HandlerFactory>,
}

impl<R: FormRepository> FormComposer<R> {
    pub fn new(repo: R, factory: Arc<dyn HandlerFactory>) -> Self {
        Self { repo, factory }
    }

    /// Compose the form `form_id`, bound to `data` when given.
    ///
    /// Fields and handlers are ordered by ascending `order`; equal values
    /// keep insertion order.
    #[instrument(skip(self, data), fields(form_id = %form_id, bound = data.is_some()))]
    pub async fn compose(
        &self,
        form_id: &FormId,
        data: Option<SubmittedData>,
    ) -> Result<ComposedForm, FormError> {
        let mut schema = self
            .repo
            .load_schema(form_id)
            .await?
            .ok_or_else(|| FormError::not_found("form", form_id))?;
        schema.sort();

        let inputs = schema
            .fields
            .iter()
            .map(|field| FormInput {
                name: field.name.clone(),
                label: field.label.clone(),
                help_text: field.help_text.clone(),
                required: field.required,
                widget: field.widget,
                field_type: field.field_type(),
                order: field.order,
                kind: field.kind.clone(),
            })
            .collect();

        let mut handlers = Vec::with_capacity(schema.handlers.len());
        let mut summaries = Vec::with_capacity(schema.handlers.len());
        for def in &schema.handlers {
            handlers.push(Arc::new(self.factory.build(def, &schema)?));
            summaries.push(HandlerSummary {
                name: def.name.clone(),
                handler_type: def.handler_type(),
                order: def.order,
            });
        }

        debug!(
            fields = schema.fields.len(),
            handlers = handlers.len(),
            "form composed"
        );

        let descriptor = FormDescriptor {
            form_id: schema.form.id,
            title: schema.form.title,
            target_model: schema.form.target_model,
            inputs,
            handlers: summaries,
        };
        Ok(ComposedForm::new(descriptor, handlers, data))
    }
}
