//! Submission handler trait definition.

use formforge_types::error::HandlerError;
use formforge_types::submission::Submission;

/// One post-submission action bound to a form.
///
/// Uses native async fn in traits (Rust 2024 edition). For dynamic dispatch
/// wrap implementations in [`super::BoxSubmissionHandler`].
pub trait SubmissionHandler: Send + Sync {
    /// Handler name, as configured by the admin.
    fn name(&self) -> &str;

    /// Perform the action for a validated submission.
    fn handle(
        &self,
        submission: &Submission,
    ) -> impl std::future::Future<Output = Result<(), HandlerError>> + Send;
}
