//! Request extractors shared by the REST handlers.

pub mod actor;
pub mod body;
pub mod query;
