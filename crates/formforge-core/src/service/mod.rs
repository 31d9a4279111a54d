//! Admin-side services.

pub mod clone;
pub mod form;

pub use form::FormAdminService;
