//! Runtime consumer endpoints: compose a form and submit data to it.
//!
//! These routes need no acting user; they serve the public side of a form.

use std::time::Instant;

use axum::extract::{Path, State};
use serde::Serialize;

use formforge_core::compose::FormDescriptor;
use formforge_types::form::FormId;
use formforge_types::submission::{SubmissionReceipt, SubmittedData};

use super::parse_id;
use crate::http::error::AppError;
use crate::http::extractors::body::ApiJson;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ComposedView {
    pub form: FormDescriptor,
    pub html: String,
}

/// GET /api/v1/forms/{id}/compose - The unbound form's descriptor and HTML.
pub async fn compose_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<ComposedView>, AppError> {
    let start = Instant::now();
    let id: FormId = parse_id(&id, "form")?;
    let composed = state.composer.compose(&id, None).await?;
    let view = ComposedView {
        html: composed.render_html(),
        form: composed.descriptor().clone(),
    };
    Ok(ApiResponse::success(view, start)
        .with_link("submissions", format!("/api/v1/forms/{id}/submissions")))
}

/// POST /api/v1/forms/{id}/submissions - Bind, validate, and run handlers.
pub async fn submit_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(data): ApiJson<SubmittedData>,
) -> Result<ApiResponse<SubmissionReceipt>, AppError> {
    let start = Instant::now();
    let id: FormId = parse_id(&id, "form")?;
    let composed = state.composer.compose(&id, Some(data)).await?;
    let receipt = composed.save().await?;
    Ok(ApiResponse::created(receipt, start))
}
