//! Instance store trait: where the save-instance handler persists submissions.

use formforge_types::error::RepositoryError;
use formforge_types::form::FormId;
use formforge_types::submission::StoredInstance;
use uuid::Uuid;

/// Persistence for submitted data saved as data-model instances.
///
/// Submitted data is never persisted implicitly; only a save-instance
/// handler writes here.
pub trait InstanceStore: Send + Sync {
    /// Store one instance of `model`. Returns its id.
    fn save_instance(
        &self,
        model: &str,
        form_id: &FormId,
        data: &serde_json::Value,
    ) -> impl std::future::Future<Output = Result<Uuid, RepositoryError>> + Send;

    /// List stored instances, newest first, optionally narrowed to a form.
    fn list_instances(
        &self,
        form_id: Option<&FormId>,
    ) -> impl std::future::Future<Output = Result<Vec<StoredInstance>, RepositoryError>> + Send;
}
