//! HTTP request handlers for the REST API.

pub mod field;
pub mod form;
pub mod handler;
pub mod registry;
pub mod runtime;

use std::str::FromStr;

use formforge_types::error::FormError;

use crate::http::error::AppError;

/// Parse a path id; an unparseable id is reported as not found.
pub(crate) fn parse_id<T: FromStr>(raw: &str, entity: &'static str) -> Result<T, AppError> {
    raw.parse()
        .map_err(|_| AppError::Form(FormError::not_found(entity, raw)))
}
