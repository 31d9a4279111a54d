//! Submission handlers: post-submission actions run in ascending order.

pub mod box_handler;
pub mod builtin;
pub mod factory;
pub mod submission;
pub mod template;

pub use box_handler::BoxSubmissionHandler;
pub use factory::{HandlerFactory, StandardHandlerFactory};
pub use submission::SubmissionHandler;
