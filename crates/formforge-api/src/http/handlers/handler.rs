//! Submission-handler handlers for the REST API.

use std::time::Instant;

use axum::extract::{Path, State};

use formforge_types::form::FormId;
use formforge_types::handler::{HandlerDef, HandlerId, NewHandler, UpdateHandler};

use super::parse_id;
use crate::http::error::AppError;
use crate::http::extractors::actor::CurrentActor;
use crate::http::extractors::body::ApiJson;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// POST /api/v1/forms/{id}/handlers - Attach a handler.
pub async fn add_handler(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(form_id): Path<String>,
    ApiJson(body): ApiJson<NewHandler>,
) -> Result<ApiResponse<HandlerDef>, AppError> {
    let start = Instant::now();
    let form_id: FormId = parse_id(&form_id, "form")?;
    let handler = state.admin.add_handler(&actor, &form_id, body).await?;
    let href = format!("/api/v1/forms/{form_id}/handlers/{}", handler.id);
    Ok(ApiResponse::created(handler, start).with_link("self", href))
}

/// PUT /api/v1/forms/{id}/handlers/{handler_id} - Change a handler.
pub async fn update_handler(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((form_id, handler_id)): Path<(String, String)>,
    ApiJson(body): ApiJson<UpdateHandler>,
) -> Result<ApiResponse<HandlerDef>, AppError> {
    let start = Instant::now();
    let form_id: FormId = parse_id(&form_id, "form")?;
    let handler_id: HandlerId = parse_id(&handler_id, "handler")?;
    let handler = state
        .admin
        .update_handler(&actor, &form_id, &handler_id, body)
        .await?;
    Ok(ApiResponse::success(handler, start))
}

/// DELETE /api/v1/forms/{id}/handlers/{handler_id} - Remove a handler.
pub async fn delete_handler(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((form_id, handler_id)): Path<(String, String)>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    let start = Instant::now();
    let form_id: FormId = parse_id(&form_id, "form")?;
    let handler_id: HandlerId = parse_id(&handler_id, "handler")?;
    state
        .admin
        .delete_handler(&actor, &form_id, &handler_id)
        .await?;
    Ok(ApiResponse::success(
        serde_json::json!({ "deleted": true, "id": handler_id }),
        start,
    ))
}
