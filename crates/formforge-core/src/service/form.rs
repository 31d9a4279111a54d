//! Form administration service.
//!
//! Orchestrates the schema-editing operations behind the admin surface:
//! forms, fields (including fields derived from a target model's
//! attributes), handlers, and cloning. Every mutation passes the
//! permission gate before it writes.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::Utc;
use formforge_types::error::{ConfigurationError, FormError};
use formforge_types::field::{
    FieldDef, FieldId, FieldKind, FieldType, NewField, UpdateField, humanize,
};
use formforge_types::form::{
    CloneFormRequest, CreateFormRequest, Form, FormId, FormSchema, UpdateFormRequest,
};
use formforge_types::handler::{HandlerDef, HandlerId, HandlerKind, NewHandler, UpdateHandler};
use formforge_types::model::{AttributeSpec, ModelSpec};
use formforge_types::permission::{Actor, AdminAction, Verb};
use regex::Regex;
use tracing::{info, instrument};

use super::clone::clone_schema;
use crate::catalog::ModelCatalog;
use crate::compose::clean::is_valid_email;
use crate::permission::PermissionGate;
use crate::registry;
use crate::repository::form::{FormFilter, FormRepository};

const REQUIRED: &str = "This field is required.";

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// Service for editing stored form schemas.
///
/// Generic over the repository and model catalog so formforge-core never
/// depends on formforge-infra.
pub struct FormAdminService<R: FormRepository, C: ModelCatalog> {
    repo: R,
    catalog: C,
    gate: PermissionGate,
}

impl<R: FormRepository, C: ModelCatalog> FormAdminService<R, C> {
    pub fn new(repo: R, catalog: C, gate: PermissionGate) -> Self {
        Self {
            repo,
            catalog,
            gate,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    // -----------------------------------------------------------------------
    // Forms
    // -----------------------------------------------------------------------

    pub async fn create_form(
        &self,
        actor: &Actor,
        request: CreateFormRequest,
    ) -> Result<Form, FormError> {
        self.gate.authorize(actor, &AdminAction::CreateForm)?;

        let title = validate_title(&request.title)?;
        let target_model = request
            .target_model
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        if let Some(model) = &target_model {
            self.model(model)?;
        }

        let now = Utc::now();
        let form = Form {
            id: FormId::new(),
            title,
            target_model,
            created_at: now,
            updated_at: now,
        };
        let created = self.repo.create_form(&form).await?;
        info!(form_id = %created.id, user = %actor.username, "form created");
        Ok(created)
    }

    pub async fn get_form(&self, form_id: &FormId) -> Result<Form, FormError> {
        self.repo
            .get_form(form_id)
            .await?
            .ok_or_else(|| FormError::not_found("form", form_id))
    }

    pub async fn list_forms(&self, filter: Option<FormFilter>) -> Result<Vec<Form>, FormError> {
        Ok(self.repo.list_forms(filter).await?)
    }

    /// The form with its fields and handlers, in ascending order.
    pub async fn get_schema(&self, form_id: &FormId) -> Result<FormSchema, FormError> {
        let mut schema = self
            .repo
            .load_schema(form_id)
            .await?
            .ok_or_else(|| FormError::not_found("form", form_id))?;
        schema.sort();
        Ok(schema)
    }

    pub async fn update_form(
        &self,
        actor: &Actor,
        form_id: &FormId,
        request: UpdateFormRequest,
    ) -> Result<Form, FormError> {
        self.gate
            .authorize(actor, &AdminAction::UpdateForm { form_id: *form_id })?;

        let mut form = self.get_form(form_id).await?;
        if let Some(title) = request.title {
            form.title = validate_title(&title)?;
        }
        form.updated_at = Utc::now();
        Ok(self.repo.update_form(&form).await?)
    }

    pub async fn delete_form(&self, actor: &Actor, form_id: &FormId) -> Result<(), FormError> {
        self.gate
            .authorize(actor, &AdminAction::DeleteForm { form_id: *form_id })?;

        self.get_form(form_id).await?;
        self.repo.delete_form(form_id).await?;
        info!(form_id = %form_id, user = %actor.username, "form deleted");
        Ok(())
    }

    /// Copy a form with all of its fields and handlers under a new title.
    ///
    /// The copy is written in one transaction; a failure leaves nothing
    /// behind.
    #[instrument(skip(self, actor, request), fields(user = %actor.username))]
    pub async fn clone_form(
        &self,
        actor: &Actor,
        source_id: &FormId,
        request: CloneFormRequest,
    ) -> Result<FormSchema, FormError> {
        self.gate
            .authorize(actor, &AdminAction::CloneForm { source: *source_id })?;

        let source = self.get_schema(source_id).await?;
        let title = validate_title(&request.title)?;
        let copy = clone_schema(&source, &title)?;
        self.repo.insert_schema(&copy).await?;

        info!(
            source = %source_id,
            clone = %copy.form.id,
            fields = copy.fields.len(),
            handlers = copy.handlers.len(),
            "form cloned"
        );
        Ok(copy)
    }

    // -----------------------------------------------------------------------
    // Fields
    // -----------------------------------------------------------------------

    pub async fn add_field(
        &self,
        actor: &Actor,
        form_id: &FormId,
        request: NewField,
    ) -> Result<FieldDef, FormError> {
        let field_type = request.kind.field_type();
        self.authorize_field(actor, Verb::Add, form_id, field_type)?;

        let schema = self.get_schema(form_id).await?;
        let name = validate_name(&request.name)?;
        if schema.field_by_name(&name).is_some() {
            return Err(FormError::DuplicateName(name));
        }
        validate_kind(&request.kind)?;

        let widget = request
            .widget
            .unwrap_or_else(|| registry::default_widget(field_type));
        registry::validate_widget(field_type, widget)?;

        let field = FieldDef {
            id: FieldId::new(),
            form_id: *form_id,
            label: non_empty(request.label).unwrap_or_else(|| humanize(&name)),
            name,
            help_text: request.help_text.unwrap_or_default(),
            required: request.required.unwrap_or(true),
            widget,
            order: request.order.unwrap_or_else(|| schema.next_field_order()),
            kind: request.kind,
            created_at: Utc::now(),
        };
        let created = self.repo.add_field(&field).await?;
        info!(form_id = %form_id, field = %created.name, field_type = %field_type, "field added");
        Ok(created)
    }

    pub async fn update_field(
        &self,
        actor: &Actor,
        form_id: &FormId,
        field_id: &FieldId,
        request: UpdateField,
    ) -> Result<FieldDef, FormError> {
        let schema = self.get_schema(form_id).await?;
        let mut field = schema
            .field(field_id)
            .cloned()
            .ok_or_else(|| FormError::not_found("field", field_id))?;

        self.authorize_field(actor, Verb::Change, form_id, field.field_type())?;

        if let Some(kind) = request.kind {
            let new_type = kind.field_type();
            if new_type != field.field_type() {
                self.authorize_field(actor, Verb::Change, form_id, new_type)?;
                if new_type != FieldType::Email {
                    if let Some(handler) = referencing_handler(&schema, field_id) {
                        return Err(FormError::invalid(
                            "kind",
                            format!(
                                "Field '{}' is used by handler '{}' and must remain an email field.",
                                field.name, handler.name
                            ),
                        ));
                    }
                }
                // A widget the new type does not allow falls back to its default.
                if !registry::permitted_widgets(new_type).contains(&field.widget) {
                    field.widget = registry::default_widget(new_type);
                }
            }
            validate_kind(&kind)?;
            field.kind = kind;
        }

        if let Some(name) = request.name {
            let name = validate_name(&name)?;
            if schema
                .fields
                .iter()
                .any(|f| f.name == name && &f.id != field_id)
            {
                return Err(FormError::DuplicateName(name));
            }
            field.name = name;
        }
        if let Some(label) = non_empty(request.label) {
            field.label = label;
        }
        if let Some(help_text) = request.help_text {
            field.help_text = help_text;
        }
        if let Some(required) = request.required {
            field.required = required;
        }
        if let Some(order) = request.order {
            field.order = order;
        }
        if let Some(widget) = request.widget {
            field.widget = widget;
        }
        registry::validate_widget(field.field_type(), field.widget)?;

        Ok(self.repo.update_field(&field).await?)
    }

    /// Remove a field. Fields referenced by a confirmation handler are kept.
    pub async fn delete_field(
        &self,
        actor: &Actor,
        form_id: &FormId,
        field_id: &FieldId,
    ) -> Result<(), FormError> {
        let schema = self.get_schema(form_id).await?;
        let field = schema
            .field(field_id)
            .ok_or_else(|| FormError::not_found("field", field_id))?;

        self.authorize_field(actor, Verb::Delete, form_id, field.field_type())?;

        if let Some(handler) = referencing_handler(&schema, field_id) {
            return Err(FormError::invalid(
                "field",
                format!(
                    "Field '{}' is used by handler '{}'.",
                    field.name, handler.name
                ),
            ));
        }

        self.repo.delete_field(form_id, field_id).await?;
        info!(form_id = %form_id, field = %field.name, "field deleted");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Model-bound fields
    // -----------------------------------------------------------------------

    /// Attributes of the form's target model that no field has consumed yet
    /// and that map to a field type.
    pub async fn available_attributes(
        &self,
        form_id: &FormId,
    ) -> Result<Vec<AttributeSpec>, FormError> {
        let schema = self.get_schema(form_id).await?;
        let model = self.target_model(&schema)?;

        Ok(model
            .attributes
            .iter()
            .filter(|a| schema.field_by_name(&a.name).is_none())
            .filter(|a| registry::field_type_for(a).is_ok())
            .cloned()
            .collect())
    }

    /// Add one field per named attribute of the form's target model, in the
    /// given order, after the existing fields.
    ///
    /// Every attribute is resolved and authorized before anything is written,
    /// and the fields are stored as one batch: all of them or none.
    pub async fn add_model_fields(
        &self,
        actor: &Actor,
        form_id: &FormId,
        attribute_names: &[String],
    ) -> Result<Vec<FieldDef>, FormError> {
        let schema = self.get_schema(form_id).await?;
        let model = self.target_model(&schema)?;

        let mut consumed: HashSet<&str> = schema.fields.iter().map(|f| f.name.as_str()).collect();
        let mut order = schema.next_field_order();
        let now = Utc::now();
        let mut pending = Vec::with_capacity(attribute_names.len());

        for name in attribute_names {
            let attr = model
                .attribute(name)
                .ok_or_else(|| FormError::not_found("attribute", name))?;
            if !consumed.insert(attr.name.as_str()) {
                return Err(FormError::DuplicateName(attr.name.clone()));
            }

            let kind = registry::kind_from_attribute(attr)?;
            let field_type = kind.field_type();
            self.authorize_field(actor, Verb::Add, form_id, field_type)?;

            pending.push(FieldDef {
                id: FieldId::new(),
                form_id: *form_id,
                name: attr.name.clone(),
                label: attr.label.clone().unwrap_or_else(|| humanize(&attr.name)),
                help_text: String::new(),
                required: attr.required,
                widget: registry::default_widget(field_type),
                order,
                kind,
                created_at: now,
            });
            order += 1;
        }

        let created = self.repo.add_fields(&pending).await?;
        info!(form_id = %form_id, count = created.len(), "model fields added");
        Ok(created)
    }

    // -----------------------------------------------------------------------
    // Handlers
    // -----------------------------------------------------------------------

    pub async fn add_handler(
        &self,
        actor: &Actor,
        form_id: &FormId,
        request: NewHandler,
    ) -> Result<HandlerDef, FormError> {
        let handler_type = request.kind.handler_type();
        self.gate.authorize(
            actor,
            &AdminAction::Handler {
                verb: Verb::Add,
                form_id: *form_id,
                handler_type,
            },
        )?;

        let schema = self.get_schema(form_id).await?;
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(FormError::invalid("name", REQUIRED));
        }
        self.validate_handler_kind(&schema, &request.kind)?;

        let handler = HandlerDef {
            id: HandlerId::new(),
            form_id: *form_id,
            name,
            order: request.order.unwrap_or_else(|| schema.next_handler_order()),
            kind: request.kind,
            created_at: Utc::now(),
        };
        let created = self.repo.add_handler(&handler).await?;
        info!(form_id = %form_id, handler = %created.name, handler_type = %handler_type, "handler added");
        Ok(created)
    }

    pub async fn update_handler(
        &self,
        actor: &Actor,
        form_id: &FormId,
        handler_id: &HandlerId,
        request: UpdateHandler,
    ) -> Result<HandlerDef, FormError> {
        let schema = self.get_schema(form_id).await?;
        let mut handler = schema
            .handlers
            .iter()
            .find(|h| &h.id == handler_id)
            .cloned()
            .ok_or_else(|| FormError::not_found("handler", handler_id))?;

        self.authorize_handler(actor, Verb::Change, &handler)?;

        if let Some(kind) = request.kind {
            if kind.handler_type() != handler.handler_type() {
                self.gate.authorize(
                    actor,
                    &AdminAction::Handler {
                        verb: Verb::Change,
                        form_id: *form_id,
                        handler_type: kind.handler_type(),
                    },
                )?;
            }
            self.validate_handler_kind(&schema, &kind)?;
            handler.kind = kind;
        }
        if let Some(name) = request.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(FormError::invalid("name", REQUIRED));
            }
            handler.name = name;
        }
        if let Some(order) = request.order {
            handler.order = order;
        }

        Ok(self.repo.update_handler(&handler).await?)
    }

    pub async fn delete_handler(
        &self,
        actor: &Actor,
        form_id: &FormId,
        handler_id: &HandlerId,
    ) -> Result<(), FormError> {
        let schema = self.get_schema(form_id).await?;
        let handler = schema
            .handlers
            .iter()
            .find(|h| &h.id == handler_id)
            .ok_or_else(|| FormError::not_found("handler", handler_id))?;

        self.authorize_handler(actor, Verb::Delete, handler)?;

        self.repo.delete_handler(form_id, handler_id).await?;
        info!(form_id = %form_id, handler = %handler.name, "handler deleted");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn authorize_field(
        &self,
        actor: &Actor,
        verb: Verb,
        form_id: &FormId,
        field_type: FieldType,
    ) -> Result<(), FormError> {
        self.gate.authorize(
            actor,
            &AdminAction::Field {
                verb,
                form_id: *form_id,
                field_type,
            },
        )
    }

    fn authorize_handler(
        &self,
        actor: &Actor,
        verb: Verb,
        handler: &HandlerDef,
    ) -> Result<(), FormError> {
        self.gate.authorize(
            actor,
            &AdminAction::Handler {
                verb,
                form_id: handler.form_id,
                handler_type: handler.handler_type(),
            },
        )
    }

    fn model(&self, name: &str) -> Result<&ModelSpec, FormError> {
        self.catalog
            .get_model(name)
            .ok_or_else(|| ConfigurationError::UnknownModel(name.to_string()).into())
    }

    fn target_model(&self, schema: &FormSchema) -> Result<&ModelSpec, FormError> {
        let name = schema.form.target_model.as_deref().ok_or_else(|| {
            FormError::NotSupported(format!(
                "form '{}' is not bound to a data model",
                schema.form.title
            ))
        })?;
        self.model(name)
    }

    fn validate_handler_kind(
        &self,
        schema: &FormSchema,
        kind: &HandlerKind,
    ) -> Result<(), FormError> {
        match kind {
            HandlerKind::EmailNotification {
                recipients,
                from_address,
                ..
            } => {
                if recipients.is_empty() {
                    return Err(FormError::invalid("recipients", REQUIRED));
                }
                if let Some(bad) = recipients.iter().find(|r| !is_valid_email(r)) {
                    return Err(FormError::invalid(
                        "recipients",
                        format!("Enter a valid email address: {bad}"),
                    ));
                }
                validate_from(from_address)
            }
            HandlerKind::EmailConfirmation {
                email_field,
                from_address,
                ..
            } => {
                let is_email_field = schema
                    .field(email_field)
                    .is_some_and(|f| f.field_type() == FieldType::Email);
                if !is_email_field {
                    return Err(FormError::invalid(
                        "email_field",
                        "Select an email field of this form.",
                    ));
                }
                validate_from(from_address)
            }
            HandlerKind::SaveInstance { model } => {
                let name = model
                    .as_deref()
                    .or(schema.form.target_model.as_deref())
                    .ok_or_else(|| {
                        FormError::invalid(
                            "model",
                            "Choose a model; this form is not bound to one.",
                        )
                    })?;
                self.model(name).map(|_| ())
            }
        }
    }
}

fn validate_title(title: &str) -> Result<String, FormError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(FormError::invalid("title", REQUIRED));
    }
    Ok(title.to_string())
}

fn validate_name(name: &str) -> Result<String, FormError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(FormError::invalid("name", REQUIRED));
    }
    if !IDENTIFIER.is_match(name) {
        return Err(FormError::invalid(
            "name",
            "Enter a valid name consisting of letters, numbers and underscores, not starting with a number.",
        ));
    }
    Ok(name.to_string())
}

/// Subtype-level sanity checks on a field configuration.
fn validate_kind(kind: &FieldKind) -> Result<(), FormError> {
    match kind {
        FieldKind::Choice { choices, .. } | FieldKind::MultipleChoice { choices, .. }
            if choices.is_empty() =>
        {
            Err(FormError::invalid("choices", "At least one choice is required."))
        }
        FieldKind::ForeignKey { related_model, .. } | FieldKind::ManyToMany { related_model, .. }
            if related_model.trim().is_empty() =>
        {
            Err(FormError::invalid("related_model", REQUIRED))
        }
        FieldKind::Char {
            max_length: Some(max),
            min_length: Some(min),
            ..
        }
        | FieldKind::Text {
            max_length: Some(max),
            min_length: Some(min),
            ..
        } if min > max => Err(FormError::invalid(
            "min_length",
            "Minimum length cannot exceed maximum length.",
        )),
        FieldKind::Decimal {
            max_digits: Some(digits),
            decimal_places: Some(places),
            ..
        } if places > digits => Err(FormError::invalid(
            "decimal_places",
            "Decimal places cannot exceed the total number of digits.",
        )),
        _ => Ok(()),
    }
}

fn validate_from(from_address: &Option<String>) -> Result<(), FormError> {
    match from_address.as_deref().map(str::trim) {
        Some(addr) if !addr.is_empty() && !is_valid_email(addr) => Err(FormError::invalid(
            "from_address",
            "Enter a valid email address.",
        )),
        _ => Ok(()),
    }
}

fn referencing_handler<'a>(schema: &'a FormSchema, field_id: &FieldId) -> Option<&'a HandlerDef> {
    schema
        .handlers
        .iter()
        .find(|h| h.kind.referenced_field() == Some(field_id))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
