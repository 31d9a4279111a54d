//! Business logic and repository trait definitions for Formforge.
//!
//! This crate defines the "ports" (repository, mailer, instance-store, and
//! model-catalog traits) that the infrastructure layer implements, plus the
//! form composer, the handler chain, the field-type registry, and the
//! permission gate. It depends only on `formforge-types` -- never on
//! `formforge-infra` or any database/IO crate.

pub mod catalog;
pub mod compose;
pub mod handler;
pub mod mail;
pub mod permission;
pub mod registry;
pub mod repository;
pub mod service;
