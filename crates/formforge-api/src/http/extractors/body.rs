//! JSON request bodies whose rejections use the error envelope.

use axum::extract::FromRequest;

use crate::http::error::AppError;

/// `axum::Json` that rejects with [`AppError::BadRequest`] instead of a
/// plain-text response.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
