//! Field handlers for the REST API.

use std::time::Instant;

use axum::extract::{Path, State};

use formforge_types::field::{FieldDef, FieldId, NewField, UpdateField};
use formforge_types::form::FormId;

use super::parse_id;
use crate::http::error::AppError;
use crate::http::extractors::actor::CurrentActor;
use crate::http::extractors::body::ApiJson;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// POST /api/v1/forms/{id}/fields - Attach a field.
pub async fn add_field(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(form_id): Path<String>,
    ApiJson(body): ApiJson<NewField>,
) -> Result<ApiResponse<FieldDef>, AppError> {
    let start = Instant::now();
    let form_id: FormId = parse_id(&form_id, "form")?;
    let field = state.admin.add_field(&actor, &form_id, body).await?;
    let href = format!("/api/v1/forms/{form_id}/fields/{}", field.id);
    Ok(ApiResponse::created(field, start)
        .with_link("self", href)
        .with_link("form", format!("/api/v1/forms/{form_id}")))
}

/// PUT /api/v1/forms/{id}/fields/{field_id} - Change a field.
pub async fn update_field(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((form_id, field_id)): Path<(String, String)>,
    ApiJson(body): ApiJson<UpdateField>,
) -> Result<ApiResponse<FieldDef>, AppError> {
    let start = Instant::now();
    let form_id: FormId = parse_id(&form_id, "form")?;
    let field_id: FieldId = parse_id(&field_id, "field")?;
    let field = state
        .admin
        .update_field(&actor, &form_id, &field_id, body)
        .await?;
    Ok(ApiResponse::success(field, start).with_link("form", format!("/api/v1/forms/{form_id}")))
}

/// DELETE /api/v1/forms/{id}/fields/{field_id} - Remove a field.
pub async fn delete_field(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((form_id, field_id)): Path<(String, String)>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    let start = Instant::now();
    let form_id: FormId = parse_id(&form_id, "form")?;
    let field_id: FieldId = parse_id(&field_id, "field")?;
    state
        .admin
        .delete_field(&actor, &form_id, &field_id)
        .await?;
    Ok(ApiResponse::success(
        serde_json::json!({ "deleted": true, "id": field_id }),
        start,
    ))
}
