//! Built-in submission handlers.
//!
//! Each is generic over the port it talks to so the composed chain stays
//! statically dispatched inside the handler; only the chain itself is boxed.

use std::sync::Arc;

use formforge_types::error::HandlerError;
use formforge_types::mail::OutgoingEmail;
use formforge_types::submission::{FieldValue, Submission};
use tracing::{debug, info};

use super::submission::SubmissionHandler;
use super::template::MailTemplates;
use crate::mail::Mailer;
use crate::repository::instance::InstanceStore;

// ---------------------------------------------------------------------------
// EmailNotificationHandler
// ---------------------------------------------------------------------------

/// Sends the submitted data to a fixed recipient list.
pub struct EmailNotificationHandler<M: Mailer> {
    name: String,
    from: String,
    recipients: Vec<String>,
    templates: MailTemplates,
    mailer: Arc<M>,
}

impl<M: Mailer> EmailNotificationHandler<M> {
    /// Fails when either template does not compile. A blank body template
    /// sends a listing of every value.
    pub fn new(
        name: impl Into<String>,
        from: impl Into<String>,
        recipients: Vec<String>,
        subject_template: &str,
        body_template: &str,
        mailer: Arc<M>,
    ) -> Result<Self, HandlerError> {
        Ok(Self {
            name: name.into(),
            from: from.into(),
            recipients,
            templates: MailTemplates::new(subject_template, body_template)?,
            mailer,
        })
    }
}

impl<M: Mailer> SubmissionHandler for EmailNotificationHandler<M> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, submission: &Submission) -> Result<(), HandlerError> {
        if self.recipients.is_empty() {
            debug!(handler = %self.name, "no recipients configured, nothing to send");
            return Ok(());
        }

        let email = OutgoingEmail {
            from: self.from.clone(),
            to: self.recipients.clone(),
            subject: self.templates.subject(submission)?,
            body: self.templates.body(submission)?,
        };
        self.mailer.send(&email).await?;

        info!(
            handler = %self.name,
            form_id = %submission.form_id,
            recipients = self.recipients.len(),
            "notification queued"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// EmailConfirmationHandler
// ---------------------------------------------------------------------------

/// Emails the submitter at the address entered in one of the form's email
/// fields.
pub struct EmailConfirmationHandler<M: Mailer> {
    name: String,
    from: String,
    email_field: String,
    templates: MailTemplates,
    mailer: Arc<M>,
}

impl<M: Mailer> EmailConfirmationHandler<M> {
    /// `email_field` is the *name* of the field holding the address.
    pub fn new(
        name: impl Into<String>,
        from: impl Into<String>,
        email_field: impl Into<String>,
        subject_template: &str,
        body_template: &str,
        mailer: Arc<M>,
    ) -> Result<Self, HandlerError> {
        Ok(Self {
            name: name.into(),
            from: from.into(),
            email_field: email_field.into(),
            templates: MailTemplates::new(subject_template, body_template)?,
            mailer,
        })
    }
}

impl<M: Mailer> SubmissionHandler for EmailConfirmationHandler<M> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, submission: &Submission) -> Result<(), HandlerError> {
        let address = match submission.data.get(&self.email_field) {
            Some(FieldValue::Text(addr)) if !addr.trim().is_empty() => addr.trim().to_string(),
            _ => {
                debug!(
                    handler = %self.name,
                    field = %self.email_field,
                    "no confirmation address submitted, skipping"
                );
                return Ok(());
            }
        };

        let email = OutgoingEmail {
            from: self.from.clone(),
            to: vec![address],
            subject: self.templates.subject(submission)?,
            body: self.templates.body(submission)?,
        };
        self.mailer.send(&email).await?;

        info!(handler = %self.name, form_id = %submission.form_id, "confirmation queued");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SaveInstanceHandler
// ---------------------------------------------------------------------------

/// Persists the cleaned data as an instance of a data model.
pub struct SaveInstanceHandler<S: InstanceStore> {
    name: String,
    model: String,
    store: Arc<S>,
}

impl<S: InstanceStore> SaveInstanceHandler<S> {
    pub fn new(name: impl Into<String>, model: impl Into<String>, store: Arc<S>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            store,
        }
    }
}

impl<S: InstanceStore> SubmissionHandler for SaveInstanceHandler<S> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, submission: &Submission) -> Result<(), HandlerError> {
        let data = submission.data.to_json();
        let id = self
            .store
            .save_instance(&self.model, &submission.form_id, &data)
            .await
            .map_err(|e| HandlerError::Storage(e.to_string()))?;

        info!(
            handler = %self.name,
            model = %self.model,
            instance_id = %id,
            "instance saved"
        );
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::Utc;
    use formforge_types::error::RepositoryError;
    use formforge_types::form::FormId;
    use formforge_types::submission::{CleanedData, StoredInstance};
    use uuid::Uuid;

    /// Mailer that records every email it is handed.
    #[derive(Default)]
    pub(crate) struct RecordingMailer {
        pub sent: Mutex<Vec<OutgoingEmail>>,
    }

    impl Mailer for RecordingMailer {
        async fn send(&self, email: &OutgoingEmail) -> Result<(), HandlerError> {
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    /// In-memory instance store.
    #[derive(Default)]
    pub(crate) struct MemoryInstanceStore {
        pub saved: Mutex<Vec<StoredInstance>>,
    }

    impl InstanceStore for MemoryInstanceStore {
        async fn save_instance(
            &self,
            model: &str,
            form_id: &FormId,
            data: &serde_json::Value,
        ) -> Result<Uuid, RepositoryError> {
            let id = Uuid::now_v7();
            self.saved.lock().unwrap().push(StoredInstance {
                id,
                model: model.to_string(),
                form_id: *form_id,
                data: data.clone(),
                created_at: Utc::now(),
            });
            Ok(id)
        }

        async fn list_instances(
            &self,
            form_id: Option<&FormId>,
        ) -> Result<Vec<StoredInstance>, RepositoryError> {
            Ok(self
                .saved
                .lock()
                .unwrap()
                .iter()
                .filter(|i| form_id.is_none_or(|f| &i.form_id == f))
                .cloned()
                .collect())
        }
    }

    fn submission(email: Option<&str>) -> Submission {
        let mut data = CleanedData::new();
        data.insert("name", FieldValue::Text("Ada".to_string()));
        data.insert(
            "email",
            email
                .map(|e| FieldValue::Text(e.to_string()))
                .unwrap_or(FieldValue::Null),
        );
        Submission {
            form_id: FormId::new(),
            form_title: "Signup".to_string(),
            target_model: Some("person".to_string()),
            data,
            submitted_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_notification_renders_and_sends() {
        let mailer = Arc::new(RecordingMailer::default());
        let handler = EmailNotificationHandler::new(
            "notify",
            "forms@example.com",
            vec!["staff@example.com".to_string()],
            "New {{ form_title }} entry",
            "From {{ name }}",
            mailer.clone(),
        )
        .unwrap();

        handler.handle(&submission(None)).await.unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "New Signup entry");
        assert_eq!(sent[0].body, "From Ada");
        assert_eq!(sent[0].to, vec!["staff@example.com"]);
    }

    #[tokio::test]
    async fn test_notification_empty_body_lists_data() {
        let mailer = Arc::new(RecordingMailer::default());
        let handler = EmailNotificationHandler::new(
            "notify",
            "forms@example.com",
            vec!["staff@example.com".to_string()],
            "s",
            "",
            mailer.clone(),
        )
        .unwrap();

        handler.handle(&submission(Some("a@b.io"))).await.unwrap();
        let sent = mailer.sent.lock().unwrap();
        assert!(sent[0].body.contains("name: Ada"));
        assert!(sent[0].body.contains("email: a@b.io"));
    }

    #[tokio::test]
    async fn test_confirmation_sends_to_submitted_address() {
        let mailer = Arc::new(RecordingMailer::default());
        let handler = EmailConfirmationHandler::new(
            "confirm",
            "forms@example.com",
            "email",
            "Thanks {{ name }}",
            "We got it.",
            mailer.clone(),
        )
        .unwrap();

        handler.handle(&submission(Some("ada@example.com"))).await.unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, vec!["ada@example.com"]);
        assert_eq!(sent[0].subject, "Thanks Ada");
    }

    #[tokio::test]
    async fn test_confirmation_skips_empty_address() {
        let mailer = Arc::new(RecordingMailer::default());
        let handler = EmailConfirmationHandler::new(
            "confirm",
            "forms@example.com",
            "email",
            "s",
            "b",
            mailer.clone(),
        )
        .unwrap();

        handler.handle(&submission(None)).await.unwrap();
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_instance_persists_cleaned_data() {
        let store = Arc::new(MemoryInstanceStore::default());
        let handler = SaveInstanceHandler::new("save", "person", store.clone());
        let sub = submission(Some("ada@example.com"));

        handler.handle(&sub).await.unwrap();

        let saved = store.list_instances(Some(&sub.form_id)).await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].model, "person");
        assert_eq!(saved[0].data["name"], "Ada");
    }
}
