//! SQLite storage layer.
//!
//! Repository implementations backed by SQLite with WAL mode and split
//! read/write connection pools.

pub mod form;
pub mod instance;
pub mod outbox;
pub mod pool;

use chrono::{DateTime, Utc};
use formforge_types::error::RepositoryError;

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

pub(crate) fn query_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

#[cfg(test)]
pub(crate) async fn test_pool() -> pool::DatabasePool {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let url = format!("sqlite://{}?mode=rwc", db_path.display());
    // Leak tempdir so it lives for the test
    std::mem::forget(dir);
    pool::DatabasePool::new(&url).await.unwrap()
}
