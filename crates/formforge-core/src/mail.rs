//! Mailer trait used by the email handlers.
//!
//! Delivery is a collaborator: infra provides an outbox-backed mailer.

use formforge_types::error::HandlerError;
use formforge_types::mail::OutgoingEmail;

/// Hands a rendered email to a delivery mechanism.
pub trait Mailer: Send + Sync {
    fn send(
        &self,
        email: &OutgoingEmail,
    ) -> impl std::future::Future<Output = Result<(), HandlerError>> + Send;
}
