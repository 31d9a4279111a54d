//! BoxSubmissionHandler -- object-safe dynamic dispatch wrapper for SubmissionHandler.
//!
//! Same blanket-impl pattern as the other boxed ports:
//! 1. Define an object-safe `SubmissionHandlerDyn` trait with boxed futures
//! 2. Blanket-impl `SubmissionHandlerDyn` for all `T: SubmissionHandler`
//! 3. `BoxSubmissionHandler` wraps `Box<dyn SubmissionHandlerDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use formforge_types::error::HandlerError;
use formforge_types::submission::Submission;

use super::submission::SubmissionHandler;

/// Object-safe version of [`SubmissionHandler`] with boxed futures.
pub trait SubmissionHandlerDyn: Send + Sync {
    fn name(&self) -> &str;

    fn handle_boxed<'a>(
        &'a self,
        submission: &'a Submission,
    ) -> Pin<Box<dyn Future<Output = Result<(), HandlerError>> + Send + 'a>>;
}

impl<T: SubmissionHandler> SubmissionHandlerDyn for T {
    fn name(&self) -> &str {
        SubmissionHandler::name(self)
    }

    fn handle_boxed<'a>(
        &'a self,
        submission: &'a Submission,
    ) -> Pin<Box<dyn Future<Output = Result<(), HandlerError>> + Send + 'a>> {
        Box::pin(self.handle(submission))
    }
}

/// Type-erased submission handler.
///
/// A composed form holds a heterogeneous chain of these, one per stored
/// handler row.
pub struct BoxSubmissionHandler {
    inner: Box<dyn SubmissionHandlerDyn + Send + Sync>,
}

impl BoxSubmissionHandler {
    pub fn new<T: SubmissionHandler + 'static>(handler: T) -> Self {
        Self {
            inner: Box::new(handler),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub async fn handle(&self, submission: &Submission) -> Result<(), HandlerError> {
        self.inner.handle_boxed(submission).await
    }
}

impl std::fmt::Debug for BoxSubmissionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxSubmissionHandler")
            .field("name", &self.name())
            .finish()
    }
}
