//! SQLite store for instances written by save-instance handlers.

use chrono::Utc;
use formforge_core::repository::instance::InstanceStore;
use formforge_types::error::RepositoryError;
use formforge_types::form::FormId;
use formforge_types::submission::StoredInstance;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error};

/// SQLite-backed implementation of `InstanceStore`.
#[derive(Clone)]
pub struct SqliteInstanceStore {
    pool: DatabasePool,
}

impl SqliteInstanceStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn instance_from_row(row: &SqliteRow) -> Result<StoredInstance, RepositoryError> {
    let id: String = row.try_get("id").map_err(query_error)?;
    let model: String = row.try_get("model").map_err(query_error)?;
    let form_id: String = row.try_get("form_id").map_err(query_error)?;
    let data: String = row.try_get("data").map_err(query_error)?;
    let created_at: String = row.try_get("created_at").map_err(query_error)?;

    Ok(StoredInstance {
        id: Uuid::parse_str(&id)
            .map_err(|e| RepositoryError::Query(format!("invalid instance id: {e}")))?,
        model,
        form_id: form_id
            .parse::<FormId>()
            .map_err(|e| RepositoryError::Query(format!("invalid form id: {e}")))?,
        data: serde_json::from_str(&data)
            .map_err(|e| RepositoryError::Integrity(format!("invalid instance data: {e}")))?,
        created_at: parse_datetime(&created_at)?,
    })
}

impl InstanceStore for SqliteInstanceStore {
    async fn save_instance(
        &self,
        model: &str,
        form_id: &FormId,
        data: &serde_json::Value,
    ) -> Result<Uuid, RepositoryError> {
        let id = Uuid::now_v7();

        sqlx::query(
            "INSERT INTO form_instances (id, model, form_id, data, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(model)
        .bind(form_id.to_string())
        .bind(data.to_string())
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        tracing::debug!(%id, model, %form_id, "instance saved");
        Ok(id)
    }

    async fn list_instances(
        &self,
        form_id: Option<&FormId>,
    ) -> Result<Vec<StoredInstance>, RepositoryError> {
        let rows = match form_id {
            Some(form_id) => {
                sqlx::query(
                    "SELECT * FROM form_instances WHERE form_id = ? ORDER BY created_at DESC, id DESC",
                )
                .bind(form_id.to_string())
                .fetch_all(&self.pool.reader)
                .await
            }
            None => {
                sqlx::query("SELECT * FROM form_instances ORDER BY created_at DESC, id DESC")
                    .fetch_all(&self.pool.reader)
                    .await
            }
        }
        .map_err(query_error)?;

        rows.iter().map(instance_from_row).collect()
    }
}
