//! Database pool with split reader/writer connections in WAL mode.
//!
//! SQLite allows only one writer at a time. `DatabasePool` keeps a
//! multi-connection reader pool for concurrent reads and a single-connection
//! writer pool for serialized writes. Both use WAL journal mode and enforce
//! foreign keys, which the field/handler cascade relies on.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// Split read/write pool for SQLite with WAL mode.
///
/// - `reader`: Multi-connection pool (up to 8) for concurrent SELECT queries.
/// - `writer`: Single-connection pool for serialized INSERT/UPDATE/DELETE.
#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open both pools and run pending migrations on the writer.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let base_opts = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(std::time::Duration::from_secs(5))
            .create_if_missing(true);

        let read_opts = base_opts.clone().read_only(true);
        let write_opts = base_opts;

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(write_opts)
            .await?;

        // Reader connections are read-only, so the schema must exist first.
        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(read_opts)
            .await?;

        Ok(Self { reader, writer })
    }
}

/// Returns the default database URL based on `FORMFORGE_DATA_DIR`,
/// falling back to `~/.formforge/formforge.db`.
pub fn default_database_url() -> String {
    let data_dir = crate::filesystem::resolve_data_dir();
    format!("sqlite://{}/formforge.db", data_dir.display())
}
