//! Infrastructure layer for Formforge.
//!
//! Contains implementations of the ports defined in `formforge-core`:
//! SQLite storage for form schemas and saved instances, the outbox-backed
//! mailer, the config-backed model catalog, and data-directory resolution.

pub mod catalog;
pub mod config;
pub mod filesystem;
pub mod sqlite;
