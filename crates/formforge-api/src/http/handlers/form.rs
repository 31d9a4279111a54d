//! Form CRUD, clone, and model-attribute handlers for the REST API.

use std::time::Instant;

use axum::extract::{Path, Query, State};
use serde::Deserialize;

use formforge_types::field::FieldDef;
use formforge_types::form::{
    CloneFormRequest, CreateFormRequest, Form, FormId, FormSchema, UpdateFormRequest,
};
use formforge_types::model::AttributeSpec;

use super::parse_id;
use crate::http::error::AppError;
use crate::http::extractors::actor::CurrentActor;
use crate::http::extractors::body::ApiJson;
use crate::http::extractors::query::FormListQuery;
use crate::http::response::ApiResponse;
use crate::state::AppState;

fn form_links<T: serde::Serialize>(resp: ApiResponse<T>, id: &FormId) -> ApiResponse<T> {
    resp.with_link("self", format!("/api/v1/forms/{id}"))
        .with_link("compose", format!("/api/v1/forms/{id}/compose"))
        .with_link("submissions", format!("/api/v1/forms/{id}/submissions"))
}

/// POST /api/v1/forms - Create a new form.
pub async fn create_form(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(body): ApiJson<CreateFormRequest>,
) -> Result<ApiResponse<Form>, AppError> {
    let start = Instant::now();
    let form = state.admin.create_form(&actor, body).await?;
    let id = form.id;
    Ok(form_links(ApiResponse::created(form, start), &id))
}

/// GET /api/v1/forms - List forms with filtering and pagination.
pub async fn list_forms(
    State(state): State<AppState>,
    Query(query): Query<FormListQuery>,
) -> Result<ApiResponse<Vec<Form>>, AppError> {
    let start = Instant::now();
    let forms = state.admin.list_forms(Some(query.into_filter())).await?;
    Ok(ApiResponse::success(forms, start).with_link("self", "/api/v1/forms"))
}

/// GET /api/v1/forms/{id} - A form with its fields and handlers.
pub async fn get_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<FormSchema>, AppError> {
    let start = Instant::now();
    let id: FormId = parse_id(&id, "form")?;
    let schema = state.admin.get_schema(&id).await?;
    Ok(form_links(ApiResponse::success(schema, start), &id))
}

/// PUT /api/v1/forms/{id} - Update a form header.
pub async fn update_form(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateFormRequest>,
) -> Result<ApiResponse<Form>, AppError> {
    let start = Instant::now();
    let id: FormId = parse_id(&id, "form")?;
    let form = state.admin.update_form(&actor, &id, body).await?;
    Ok(form_links(ApiResponse::success(form, start), &id))
}

/// DELETE /api/v1/forms/{id} - Delete a form with its fields and handlers.
pub async fn delete_form(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    let start = Instant::now();
    let id: FormId = parse_id(&id, "form")?;
    state.admin.delete_form(&actor, &id).await?;
    Ok(ApiResponse::success(
        serde_json::json!({ "deleted": true, "id": id }),
        start,
    ))
}

/// POST /api/v1/forms/{id}/clone - Deep-copy a form under a new title.
pub async fn clone_form(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<CloneFormRequest>,
) -> Result<ApiResponse<FormSchema>, AppError> {
    let start = Instant::now();
    let id: FormId = parse_id(&id, "form")?;
    let copy = state.admin.clone_form(&actor, &id, body).await?;
    let copy_id = copy.form.id;
    Ok(form_links(ApiResponse::created(copy, start), &copy_id)
        .with_link("source", format!("/api/v1/forms/{id}")))
}

/// GET /api/v1/forms/{id}/attributes - Target-model attributes not yet used.
pub async fn available_attributes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Vec<AttributeSpec>>, AppError> {
    let start = Instant::now();
    let id: FormId = parse_id(&id, "form")?;
    let attributes = state.admin.available_attributes(&id).await?;
    Ok(ApiResponse::success(attributes, start)
        .with_link("model-fields", format!("/api/v1/forms/{id}/model-fields")))
}

#[derive(Debug, Deserialize)]
pub struct AddModelFieldsRequest {
    pub attributes: Vec<String>,
}

/// POST /api/v1/forms/{id}/model-fields - Add fields from model attributes.
pub async fn add_model_fields(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<AddModelFieldsRequest>,
) -> Result<ApiResponse<Vec<FieldDef>>, AppError> {
    let start = Instant::now();
    let id: FormId = parse_id(&id, "form")?;
    let fields = state
        .admin
        .add_model_fields(&actor, &id, &body.attributes)
        .await?;
    Ok(ApiResponse::created(fields, start).with_link("form", format!("/api/v1/forms/{id}")))
}
