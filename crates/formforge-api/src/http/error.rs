//! Application error type mapping to HTTP status codes and envelope format.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use formforge_types::error::{ConfigurationError, FormError};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Errors from composition, submission, and administration.
    Form(FormError),
    /// Missing or unknown acting user.
    Unauthorized(String),
    /// Malformed request that never reached the service layer.
    BadRequest(String),
}

impl From<FormError> for AppError {
    fn from(e: FormError) -> Self {
        AppError::Form(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl AppError {
    /// Status, machine code, message, and optional per-field details.
    fn parts(&self) -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
        match self {
            AppError::Form(FormError::NotFound { entity, .. }) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{} not found", capitalize(entity)),
                None,
            ),
            AppError::Form(FormError::Validation(errors)) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                errors.to_string(),
                serde_json::to_value(errors).ok(),
            ),
            AppError::Form(FormError::PermissionDenied(msg)) => {
                (StatusCode::FORBIDDEN, "PERMISSION_DENIED", msg.clone(), None)
            }
            AppError::Form(FormError::DuplicateName(name)) => (
                StatusCode::CONFLICT,
                "NAME_CONFLICT",
                format!("Name '{name}' is already used on this form"),
                None,
            ),
            AppError::Form(FormError::NotSupported(msg)) => {
                (StatusCode::NOT_FOUND, "NOT_SUPPORTED", msg.clone(), None)
            }
            AppError::Form(FormError::Configuration(ConfigurationError::UnknownModel(model))) => (
                StatusCode::BAD_REQUEST,
                "UNKNOWN_MODEL",
                format!("Unknown target model '{model}'"),
                None,
            ),
            AppError::Form(
                e @ FormError::Configuration(ConfigurationError::HandlerFailed { handler, .. }),
            ) => (
                StatusCode::BAD_GATEWAY,
                "HANDLER_FAILED",
                e.to_string(),
                Some(json!({ "handler": handler })),
            ),
            AppError::Form(e @ FormError::Configuration(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIGURATION_ERROR",
                e.to_string(),
                None,
            ),
            AppError::Form(e @ FormError::Storage(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                e.to_string(),
                None,
            ),
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone(), None)
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None)
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        self.parts().0
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();
        if status.is_server_error() {
            tracing::error!(code, error = %message, "request failed");
        }

        let mut error = json!({
            "code": code,
            "message": message,
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        let body = json!({
            "data": null,
            "meta": {
                "request_id": uuid::Uuid::now_v7().to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [error]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
