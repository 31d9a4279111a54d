//! Registered field and handler types, for "choose a type" screens.

use std::time::Instant;

use formforge_core::registry::{
    FIELD_TYPES, FieldTypeDescriptor, HANDLER_TYPES, HandlerTypeDescriptor,
};

use crate::http::response::ApiResponse;

/// GET /api/v1/field-types
pub async fn field_types() -> ApiResponse<&'static [FieldTypeDescriptor]> {
    ApiResponse::success(FIELD_TYPES, Instant::now())
}

/// GET /api/v1/handler-types
pub async fn handler_types() -> ApiResponse<&'static [HandlerTypeDescriptor]> {
    ApiResponse::success(HANDLER_TYPES, Instant::now())
}
