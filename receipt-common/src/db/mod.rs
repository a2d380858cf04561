//! Documents store access
//!
//! Recognition records are stored as JSON documents in SQLite, one row per
//! record, with the natural key `(uid, rname)` held in indexed columns.

pub mod guard;
pub mod records;

pub use guard::{PersistenceGuard, SaveError};
pub use records::{DocumentStore, RecordFilter, SqliteRecordStore};

use crate::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
///
/// Creates the database file (and parent directory) if missing.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Use proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the records table and its unique natural-key index
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS records (
            rid TEXT PRIMARY KEY,
            uid TEXT NOT NULL,
            rname TEXT NOT NULL,
            time_stamp TEXT NOT NULL,
            total_price INTEGER NOT NULL,
            document TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Closes the check-then-insert race: a concurrent duplicate fails here
    sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_records_uid_rname ON records (uid, rname)")
        .execute(pool)
        .await?;

    tracing::info!("Database tables initialized (records)");

    Ok(())
}
