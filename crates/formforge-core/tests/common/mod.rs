//! In-memory port implementations shared by the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::Utc;
use formforge_core::catalog::ModelCatalog;
use formforge_core::handler::{BoxSubmissionHandler, HandlerFactory, SubmissionHandler};
use formforge_core::mail::Mailer;
use formforge_core::repository::form::{FormFilter, FormRepository};
use formforge_core::repository::instance::InstanceStore;
use formforge_types::error::{FormError, HandlerError, RepositoryError};
use formforge_types::field::{FieldDef, FieldId};
use formforge_types::form::{Form, FormId, FormSchema};
use formforge_types::handler::{HandlerDef, HandlerId};
use formforge_types::mail::OutgoingEmail;
use formforge_types::model::ModelSpec;
use formforge_types::submission::{StoredInstance, Submission};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Form repository
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Tables {
    forms: Vec<Form>,
    fields: Vec<FieldDef>,
    handlers: Vec<HandlerDef>,
}

/// Vec-backed repository. Cloning shares the same tables.
#[derive(Clone, Default)]
pub struct MemoryFormRepository {
    tables: Arc<Mutex<Tables>>,
    /// When set, `insert_schema` fails without writing anything.
    fail_inserts: Arc<Mutex<bool>>,
    /// When set, `add_fields` fails on the row at this index of a batch.
    fail_field_at: Arc<Mutex<Option<usize>>>,
}

impl MemoryFormRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_inserts(&self, fail: bool) {
        *self.fail_inserts.lock().unwrap() = fail;
    }

    pub fn fail_field_at(&self, index: Option<usize>) {
        *self.fail_field_at.lock().unwrap() = index;
    }

    pub fn field_count(&self, form_id: &FormId) -> usize {
        self.tables
            .lock()
            .unwrap()
            .fields
            .iter()
            .filter(|f| &f.form_id == form_id)
            .count()
    }

    pub fn form_count(&self) -> usize {
        self.tables.lock().unwrap().forms.len()
    }
}

impl FormRepository for MemoryFormRepository {
    async fn create_form(&self, form: &Form) -> Result<Form, RepositoryError> {
        self.tables.lock().unwrap().forms.push(form.clone());
        Ok(form.clone())
    }

    async fn get_form(&self, id: &FormId) -> Result<Option<Form>, RepositoryError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .forms
            .iter()
            .find(|f| &f.id == id)
            .cloned())
    }

    async fn list_forms(&self, filter: Option<FormFilter>) -> Result<Vec<Form>, RepositoryError> {
        let filter = filter.unwrap_or_default();
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .forms
            .iter()
            .filter(|f| {
                filter
                    .title_contains
                    .as_ref()
                    .is_none_or(|t| f.title.to_lowercase().contains(&t.to_lowercase()))
            })
            .cloned()
            .collect())
    }

    async fn update_form(&self, form: &Form) -> Result<Form, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let slot = tables
            .forms
            .iter_mut()
            .find(|f| f.id == form.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = form.clone();
        Ok(form.clone())
    }

    async fn delete_form(&self, id: &FormId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        tables.forms.retain(|f| &f.id != id);
        tables.fields.retain(|f| &f.form_id != id);
        tables.handlers.retain(|h| &h.form_id != id);
        Ok(())
    }

    async fn load_schema(&self, id: &FormId) -> Result<Option<FormSchema>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        let Some(form) = tables.forms.iter().find(|f| &f.id == id).cloned() else {
            return Ok(None);
        };
        let mut schema = FormSchema {
            form,
            fields: tables
                .fields
                .iter()
                .filter(|f| &f.form_id == id)
                .cloned()
                .collect(),
            handlers: tables
                .handlers
                .iter()
                .filter(|h| &h.form_id == id)
                .cloned()
                .collect(),
        };
        schema.sort();
        Ok(Some(schema))
    }

    async fn insert_schema(&self, schema: &FormSchema) -> Result<(), RepositoryError> {
        if *self.fail_inserts.lock().unwrap() {
            return Err(RepositoryError::Query("simulated failure".to_string()));
        }
        let mut tables = self.tables.lock().unwrap();
        tables.forms.push(schema.form.clone());
        tables.fields.extend(schema.fields.iter().cloned());
        tables.handlers.extend(schema.handlers.iter().cloned());
        Ok(())
    }

    async fn add_field(&self, field: &FieldDef) -> Result<FieldDef, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        if tables
            .fields
            .iter()
            .any(|f| f.form_id == field.form_id && f.name == field.name)
        {
            return Err(RepositoryError::Conflict(field.name.clone()));
        }
        tables.fields.push(field.clone());
        Ok(field.clone())
    }

    async fn add_fields(&self, fields: &[FieldDef]) -> Result<Vec<FieldDef>, RepositoryError> {
        let fail_at = *self.fail_field_at.lock().unwrap();
        let mut tables = self.tables.lock().unwrap();
        // Stage the batch; nothing lands unless every row is accepted.
        let mut staged: Vec<FieldDef> = Vec::with_capacity(fields.len());
        for (index, field) in fields.iter().enumerate() {
            if fail_at == Some(index) {
                return Err(RepositoryError::Query("simulated failure".to_string()));
            }
            let taken = tables
                .fields
                .iter()
                .chain(staged.iter())
                .any(|f| f.form_id == field.form_id && f.name == field.name);
            if taken {
                return Err(RepositoryError::Conflict(field.name.clone()));
            }
            staged.push(field.clone());
        }
        tables.fields.extend(staged.iter().cloned());
        Ok(staged)
    }

    async fn update_field(&self, field: &FieldDef) -> Result<FieldDef, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let slot = tables
            .fields
            .iter_mut()
            .find(|f| f.id == field.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = field.clone();
        Ok(field.clone())
    }

    async fn delete_field(&self, form_id: &FormId, field_id: &FieldId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.fields.len();
        tables
            .fields
            .retain(|f| !(&f.id == field_id && &f.form_id == form_id));
        if tables.fields.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn add_handler(&self, handler: &HandlerDef) -> Result<HandlerDef, RepositoryError> {
        self.tables.lock().unwrap().handlers.push(handler.clone());
        Ok(handler.clone())
    }

    async fn update_handler(&self, handler: &HandlerDef) -> Result<HandlerDef, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let slot = tables
            .handlers
            .iter_mut()
            .find(|h| h.id == handler.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = handler.clone();
        Ok(handler.clone())
    }

    async fn delete_handler(
        &self,
        form_id: &FormId,
        handler_id: &HandlerId,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.handlers.len();
        tables
            .handlers
            .retain(|h| !(&h.id == handler_id && &h.form_id == form_id));
        if tables.handlers.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Mail, instances, catalog
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), HandlerError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryInstanceStore {
    pub saved: Mutex<Vec<StoredInstance>>,
}

impl InstanceStore for MemoryInstanceStore {
    async fn save_instance(
        &self,
        model: &str,
        form_id: &FormId,
        data: &serde_json::Value,
    ) -> Result<Uuid, RepositoryError> {
        let id = Uuid::now_v7();
        self.saved.lock().unwrap().push(StoredInstance {
            id,
            model: model.to_string(),
            form_id: *form_id,
            data: data.clone(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn list_instances(
        &self,
        form_id: Option<&FormId>,
    ) -> Result<Vec<StoredInstance>, RepositoryError> {
        Ok(self
            .saved
            .lock()
            .unwrap()
            .iter()
            .filter(|i| form_id.is_none_or(|f| &i.form_id == f))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryCatalog {
    pub models: Vec<ModelSpec>,
}

impl ModelCatalog for MemoryCatalog {
    fn get_model(&self, name: &str) -> Option<&ModelSpec> {
        self.models.iter().find(|m| m.name == name)
    }

    fn list_models(&self) -> Vec<&ModelSpec> {
        self.models.iter().collect()
    }
}

// ---------------------------------------------------------------------------
// Scripted handlers
// ---------------------------------------------------------------------------

/// Handler that appends its name to a shared log and fails when told to.
pub struct ScriptedHandler {
    name: String,
    fail: bool,
    log: Arc<Mutex<Vec<String>>>,
}

impl SubmissionHandler for ScriptedHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, _submission: &Submission) -> Result<(), HandlerError> {
        self.log.lock().unwrap().push(self.name.clone());
        if self.fail {
            Err(HandlerError::Other(format!("{} exploded", self.name)))
        } else {
            Ok(())
        }
    }
}

/// Factory building a [`ScriptedHandler`] per row; rows whose name starts
/// with `fail` fail when invoked.
#[derive(Default)]
pub struct ScriptedFactory {
    pub log: Arc<Mutex<Vec<String>>>,
}

impl ScriptedFactory {
    pub fn invoked(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

impl HandlerFactory for ScriptedFactory {
    fn build(
        &self,
        def: &HandlerDef,
        _schema: &FormSchema,
    ) -> Result<BoxSubmissionHandler, FormError> {
        Ok(BoxSubmissionHandler::new(ScriptedHandler {
            name: def.name.clone(),
            fail: def.name.starts_with("fail"),
            log: Arc::clone(&self.log),
        }))
    }
}
