//! Dynamic form composition: stored schema in, executable form out.

pub mod clean;
pub mod composer;
pub mod form;
pub mod render;

pub use composer::FormComposer;
pub use form::{ComposedForm, FormDescriptor, FormInput, HandlerSummary};
