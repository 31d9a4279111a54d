//! Outbox-backed mailer.
//!
//! `SqliteOutboxMailer` implements `Mailer` by queueing each rendered email
//! in `mail_outbox`. Delivering queued mail to an MTA is left to an external
//! relay reading the table.

use chrono::Utc;
use formforge_core::mail::Mailer;
use formforge_types::error::{HandlerError, RepositoryError};
use formforge_types::mail::{OutgoingEmail, QueuedEmail};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error};

#[derive(Clone)]
pub struct SqliteOutboxMailer {
    pool: DatabasePool,
}

impl SqliteOutboxMailer {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Queued mail, oldest first.
    pub async fn list_queued(&self) -> Result<Vec<QueuedEmail>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM mail_outbox ORDER BY queued_at ASC, id ASC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;

        rows.iter().map(queued_from_row).collect()
    }
}

fn queued_from_row(row: &SqliteRow) -> Result<QueuedEmail, RepositoryError> {
    let id: String = row.try_get("id").map_err(query_error)?;
    let recipients: String = row.try_get("recipients").map_err(query_error)?;
    let queued_at: String = row.try_get("queued_at").map_err(query_error)?;

    Ok(QueuedEmail {
        id: Uuid::parse_str(&id)
            .map_err(|e| RepositoryError::Query(format!("invalid outbox id: {e}")))?,
        email: OutgoingEmail {
            from: row.try_get("from_address").map_err(query_error)?,
            to: serde_json::from_str(&recipients)
                .map_err(|e| RepositoryError::Integrity(format!("invalid recipients JSON: {e}")))?,
            subject: row.try_get("subject").map_err(query_error)?,
            body: row.try_get("body").map_err(query_error)?,
        },
        queued_at: parse_datetime(&queued_at)?,
    })
}

impl Mailer for SqliteOutboxMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), HandlerError> {
        let id = Uuid::now_v7();
        let recipients =
            serde_json::to_string(&email.to).map_err(|e| HandlerError::Delivery(e.to_string()))?;

        sqlx::query(
            "INSERT INTO mail_outbox (id, from_address, recipients, subject, body, queued_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(&email.from)
        .bind(&recipients)
        .bind(&email.subject)
        .bind(&email.body)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| HandlerError::Delivery(e.to_string()))?;

        tracing::info!(%id, to = ?email.to, subject = %email.subject, "email queued");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_pool;

    fn email(subject: &str) -> OutgoingEmail {
        OutgoingEmail {
            from: "forms@localhost".to_string(),
            to: vec!["a@example.com".to_string(), "b@example.com".to_string()],
            subject: subject.to_string(),
            body: "body".to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_queues_in_order() {
        let mailer = SqliteOutboxMailer::new(test_pool().await);
        mailer.send(&email("first")).await.unwrap();
        mailer.send(&email("second")).await.unwrap();

        let queued = mailer.list_queued().await.unwrap();
        assert_eq!(queued.len(), 2);
        assert_eq!(queued[0].email, email("first"));
        assert_eq!(queued[1].email.subject, "second");
    }

    #[tokio::test]
    async fn test_empty_outbox() {
        let mailer = SqliteOutboxMailer::new(test_pool().await);
        assert!(mailer.list_queued().await.unwrap().is_empty());
    }
}
