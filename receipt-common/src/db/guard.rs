//! Duplicate-submission guard
//!
//! Inserts a recognition record at most once per `(uid, rname)`. The
//! existence lookup answers the common case; the store's unique index
//! catches duplicates that race past the lookup.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use super::records::{DocumentStore, RecordFilter};
use crate::models::{Identity, RecognitionRecord};
use crate::Error;

/// Save outcome errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveError {
    /// A record with the same duplicate key already exists
    #[error("record already exists: {rname}")]
    Conflict { rname: String },

    /// Store unavailable, failed or timed out
    #[error("storage error: {0}")]
    Storage(String),

    #[error("record owner {record_uid} does not match identity {identity_uid}")]
    OwnerMismatch {
        record_uid: String,
        identity_uid: String,
    },
}

/// Inserts records guarded by a duplicate-key lookup
///
/// Each store call is bounded by `call_timeout`. Nothing is retried.
#[derive(Clone)]
pub struct PersistenceGuard {
    store: Arc<dyn DocumentStore>,
    call_timeout: Duration,
}

impl PersistenceGuard {
    pub fn new(store: Arc<dyn DocumentStore>, call_timeout: Duration) -> Self {
        Self {
            store,
            call_timeout,
        }
    }

    /// Save `record` for `identity` unless its duplicate key already exists
    pub async fn save(&self, identity: &Identity, record: &RecognitionRecord) -> Result<(), SaveError> {
        if record.uid != identity.uid {
            return Err(SaveError::OwnerMismatch {
                record_uid: record.uid.clone(),
                identity_uid: identity.uid.clone(),
            });
        }

        let rname = record.record.rname.clone();
        let filter = RecordFilter::new(&identity.uid, &rname);

        let existing = self.bounded("find_one", self.store.find_one(&filter)).await?;
        if existing.is_some() {
            warn!(uid = %identity.uid, rname = %rname, "Duplicate record rejected");
            return Err(SaveError::Conflict { rname });
        }

        self.bounded("insert_one", self.store.insert_one(record)).await?;
        debug!(uid = %identity.uid, rid = %record.record.rid, rname = %rname, "Record saved");
        Ok(())
    }

    /// Run one store call under the per-call timeout
    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, SaveError>
    where
        F: Future<Output = crate::Result<T>>,
    {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(Error::Duplicate(rname))) => {
                warn!(operation, rname = %rname, "Duplicate record caught by unique index");
                Err(SaveError::Conflict { rname })
            }
            Ok(Err(e)) => {
                warn!(operation, error = %e, "Store call failed");
                Err(SaveError::Storage(e.to_string()))
            }
            Err(_) => {
                warn!(operation, timeout_ms = self.call_timeout.as_millis() as u64, "Store call timed out");
                Err(SaveError::Storage(format!(
                    "{} timed out after {:?}",
                    operation, self.call_timeout
                )))
            }
        }
    }
}
