//! Whole-snapshot persistence of the alarm record set.
//!
//! Every mutation of the in-memory record set is followed by a full
//! re-serialization of all records under one storage key. There is no
//! incremental write path.

use std::sync::Arc;

use crate::models::alarm::AlarmRecord;
use crate::Result;

use super::blob::BlobStore;

/// Repository serializing the full alarm set against the blob store.
#[derive(Clone)]
pub struct AlarmRepo {
    store: Arc<dyn BlobStore>,
    key: String,
}

impl AlarmRepo {
    /// Create a repository persisting under `key`.
    #[must_use]
    pub fn new(store: Arc<dyn BlobStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Load all persisted records. A missing blob yields an empty set.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Storage` if the blob cannot be read or does not
    /// parse as an alarm snapshot.
    pub async fn load_all(&self) -> Result<Vec<AlarmRecord>> {
        match self.store.get(&self.key).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    /// Overwrite the durable snapshot with the given record set.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Storage` if serialization or the blob write fails;
    /// the previous snapshot stays intact in that case.
    pub async fn persist_all(&self, records: &[AlarmRecord]) -> Result<()> {
        let value = serde_json::to_value(records)?;
        self.store.put(&self.key, value).await
    }
}
