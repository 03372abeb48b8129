//! SQLite connection pools for sessions and personas.
//!
//! A message turn appends to a session's history inside a write transaction,
//! and SQLite serializes writers anyway, so all writes share one connection.
//! Reads (session fetches, listings, persona lookups) go through a separate
//! read-only pool. WAL mode lets those readers proceed while a turn commits.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

/// Concurrent read connections.
pub const READER_CONNECTIONS: u32 = 8;

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Reader and writer pools over one database file.
#[derive(Clone)]
pub struct DatabasePool {
    /// Read-only, up to [`READER_CONNECTIONS`] connections.
    pub reader: SqlitePool,
    /// Single connection for inserts, updates and turn commits.
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open (creating if needed) the database at `database_url`.
    ///
    /// Migrations run on the writer before the reader pool opens, so readers
    /// never observe a half-migrated schema. Foreign keys are enforced on
    /// every connection.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options.clone())
            .await?;

        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(READER_CONNECTIONS)
            .connect_with(options.read_only(true))
            .await?;

        tracing::debug!(database_url, "database pools ready");
        Ok(Self { reader, writer })
    }

    /// Round trip on the reader pool, used by the health check.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.reader).await.map(|_| ())
    }
}

/// Database URL for `chatbox.db` inside the data directory.
pub fn default_database_url(data_dir: &Path) -> String {
    format!("sqlite://{}/chatbox.db", data_dir.display())
}
