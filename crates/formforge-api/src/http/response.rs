//! Envelope response format for all API responses.
//!
//! Every response is wrapped in a consistent envelope:
//! ```json
//! {
//!   "data": { ... },
//!   "meta": { "request_id": "...", "timestamp": "...", "response_time_ms": 5 },
//!   "_links": { "self": "..." }
//! }
//! ```
//!
//! Error envelopes are produced by [`AppError`](crate::http::error::AppError).

use std::collections::HashMap;
use std::time::Instant;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Envelope response wrapping all API data.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    pub meta: ApiMeta,

    /// HATEOAS-style links for discoverability.
    #[serde(rename = "_links", skip_serializing_if = "HashMap::is_empty")]
    pub links: HashMap<String, String>,

    #[serde(skip)]
    status: StatusCode,
}

/// Metadata included in every response.
#[derive(Debug, Serialize)]
pub struct ApiMeta {
    pub request_id: String,
    /// RFC 3339 timestamp of the response.
    pub timestamp: String,
    pub response_time_ms: u64,
}

impl<T: Serialize> ApiResponse<T> {
    /// A 200 response with data, timed from `start`.
    pub fn success(data: T, start: Instant) -> Self {
        Self {
            data: Some(data),
            meta: ApiMeta {
                request_id: uuid::Uuid::now_v7().to_string(),
                timestamp: chrono::Utc::now().to_rfc3339(),
                response_time_ms: start.elapsed().as_millis() as u64,
            },
            links: HashMap::new(),
            status: StatusCode::OK,
        }
    }

    /// Same envelope with 201 Created.
    pub fn created(data: T, start: Instant) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::success(data, start)
        }
    }

    /// Add a HATEOAS link.
    pub fn with_link(mut self, rel: &str, href: impl Into<String>) -> Self {
        self.links.insert(rel.to_string(), href.into());
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}
