//! Shared domain types for Formforge.
//!
//! Forms, their typed fields and post-submission handlers, the target data
//! models that model-bound forms expose, submitted/cleaned values, and the
//! error taxonomy shared by every layer.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror,
//! rust_decimal.

pub mod config;
pub mod error;
pub mod field;
pub mod form;
pub mod handler;
pub mod mail;
pub mod model;
pub mod permission;
pub mod submission;
