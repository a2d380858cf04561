//! Record documents: lookup and insert

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::models::RecognitionRecord;
use crate::{Error, Result};

/// Lookup filter on the duplicate key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFilter {
    pub uid: String,
    pub rname: String,
}

impl RecordFilter {
    pub fn new(uid: impl Into<String>, rname: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            rname: rname.into(),
        }
    }
}

/// Documents store collaborator
///
/// Implementations must be safe for concurrent use through a shared
/// reference. `insert_one` reports a natural-key collision as
/// [`Error::Duplicate`] carrying the record name.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_one(&self, filter: &RecordFilter) -> Result<Option<RecognitionRecord>>;

    async fn insert_one(&self, record: &RecognitionRecord) -> Result<()>;
}

/// SQLite-backed documents store
#[derive(Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for SqliteRecordStore {
    async fn find_one(&self, filter: &RecordFilter) -> Result<Option<RecognitionRecord>> {
        let row = sqlx::query("SELECT document FROM records WHERE uid = ? AND rname = ? LIMIT 1")
            .bind(&filter.uid)
            .bind(&filter.rname)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let document: String = row.get("document");
                let record = serde_json::from_str(&document).map_err(|e| {
                    Error::Internal(format!("Failed to deserialize record document: {}", e))
                })?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn insert_one(&self, record: &RecognitionRecord) -> Result<()> {
        // Prepare all data BEFORE acquiring database connection
        let document = serde_json::to_string(record)
            .map_err(|e| Error::Internal(format!("Failed to serialize record: {}", e)))?;
        let created_at = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO records (rid, uid, rname, time_stamp, total_price, document, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.record.rid)
        .bind(&record.uid)
        .bind(&record.record.rname)
        .bind(&record.record.time_stamp)
        .bind(record.total_price)
        .bind(&document)
        .bind(&created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(Error::Duplicate(record.record.rname.clone()))
            }
            Err(e) => Err(Error::Database(e)),
        }
    }
}
