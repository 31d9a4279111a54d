//! Form schema repository trait definition.

use formforge_types::error::RepositoryError;
use formforge_types::field::{FieldDef, FieldId};
use formforge_types::form::{Form, FormId, FormSchema};
use formforge_types::handler::{HandlerDef, HandlerId};

use super::SortOrder;

/// Filter criteria for listing forms.
#[derive(Debug, Clone, Default)]
pub struct FormFilter {
    /// Case-insensitive substring match on the title.
    pub title_contains: Option<String>,
    /// Only forms bound to this target model.
    pub target_model: Option<String>,
    /// Sort direction on `created_at`.
    pub sort_order: Option<SortOrder>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Repository trait for form schema persistence.
///
/// Implementations live in formforge-infra (e.g., SqliteFormRepository).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
///
/// Fields and handlers are always returned in ascending `order`, ties broken
/// by insertion order. Field names are unique per form: inserting a second
/// field with a taken name fails with `RepositoryError::Conflict(name)`.
pub trait FormRepository: Send + Sync {
    fn create_form(
        &self,
        form: &Form,
    ) -> impl std::future::Future<Output = Result<Form, RepositoryError>> + Send;

    fn get_form(
        &self,
        id: &FormId,
    ) -> impl std::future::Future<Output = Result<Option<Form>, RepositoryError>> + Send;

    fn list_forms(
        &self,
        filter: Option<FormFilter>,
    ) -> impl std::future::Future<Output = Result<Vec<Form>, RepositoryError>> + Send;

    fn update_form(
        &self,
        form: &Form,
    ) -> impl std::future::Future<Output = Result<Form, RepositoryError>> + Send;

    /// Delete a form; its fields and handlers go with it.
    fn delete_form(
        &self,
        id: &FormId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Load a form with all of its fields and handlers.
    fn load_schema(
        &self,
        id: &FormId,
    ) -> impl std::future::Future<Output = Result<Option<FormSchema>, RepositoryError>> + Send;

    /// Insert a complete schema (form, fields, handlers) atomically.
    ///
    /// Either every row becomes visible or none does.
    fn insert_schema(
        &self,
        schema: &FormSchema,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn add_field(
        &self,
        field: &FieldDef,
    ) -> impl std::future::Future<Output = Result<FieldDef, RepositoryError>> + Send;

    /// Insert several fields atomically, in slice order.
    ///
    /// A conflict on any name leaves none of them stored.
    fn add_fields(
        &self,
        fields: &[FieldDef],
    ) -> impl std::future::Future<Output = Result<Vec<FieldDef>, RepositoryError>> + Send;

    fn update_field(
        &self,
        field: &FieldDef,
    ) -> impl std::future::Future<Output = Result<FieldDef, RepositoryError>> + Send;

    /// Delete a field. Fails with `NotFound` unless it belongs to `form_id`.
    fn delete_field(
        &self,
        form_id: &FormId,
        field_id: &FieldId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn add_handler(
        &self,
        handler: &HandlerDef,
    ) -> impl std::future::Future<Output = Result<HandlerDef, RepositoryError>> + Send;

    fn update_handler(
        &self,
        handler: &HandlerDef,
    ) -> impl std::future::Future<Output = Result<HandlerDef, RepositoryError>> + Send;

    /// Delete a handler. Fails with `NotFound` unless it belongs to `form_id`.
    fn delete_handler(
        &self,
        form_id: &FormId,
        handler_id: &HandlerId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
