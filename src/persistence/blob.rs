//! JSON blob storage boundary.
//!
//! The durable backend is a plain get/put store of JSON documents keyed by
//! name. Production uses [`FileBlobStore`] (one file per key, atomic
//! overwrite); tests use [`MemoryBlobStore`].

use std::collections::HashMap;
use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Mutex;

use serde_json::Value;

use crate::{AppError, Result};

/// Get/put access to named JSON blobs.
pub trait BlobStore: Send + Sync {
    /// Fetch the blob stored under `key`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`](crate::AppError::Storage) if the blob
    /// exists but cannot be read or parsed.
    fn get<'a>(
        &'a self,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Value>>> + Send + 'a>>;

    /// Overwrite the blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`](crate::AppError::Storage) if the write
    /// fails. The previous blob must survive a failed write intact.
    fn put<'a>(
        &'a self,
        key: &'a str,
        value: Value,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// File-backed blob store: one `<key>.json` file per key under a root
/// directory, overwritten atomically via temp file + rename.
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    /// Open (creating if needed) a blob store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`](crate::AppError::Storage) if the root
    /// directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|err| {
            AppError::Storage(format!("failed to create {}: {err}", root.display()))
        })?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl BlobStore for FileBlobStore {
    fn get<'a>(
        &'a self,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Value>>> + Send + 'a>> {
        Box::pin(async move {
            let path = self.path_for(key);
            match tokio::fs::read(&path).await {
                Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(err) => Err(AppError::Storage(format!(
                    "failed to read {}: {err}",
                    path.display()
                ))),
            }
        })
    }

    fn put<'a>(
        &'a self,
        key: &'a str,
        value: Value,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let path = self.path_for(key);
            let root = self.root.clone();
            let bytes = serde_json::to_vec_pretty(&value)?;

            // Write to a temp file in the same directory, then rename over
            // the target: the prior snapshot stays intact until the new one
            // is complete.
            tokio::task::spawn_blocking(move || -> Result<()> {
                let mut tmp = tempfile::NamedTempFile::new_in(&root)
                    .map_err(|err| AppError::Storage(format!("temp file: {err}")))?;
                tmp.write_all(&bytes)
                    .map_err(|err| AppError::Storage(format!("temp write: {err}")))?;
                tmp.persist(&path).map_err(|err| {
                    AppError::Storage(format!("failed to replace {}: {err}", path.display()))
                })?;
                Ok(())
            })
            .await
            .map_err(|err| AppError::Storage(format!("blob write task panicked: {err}")))?
        })
    }
}

/// In-memory blob store for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Value>>,
}

impl MemoryBlobStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get<'a>(
        &'a self,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Value>>> + Send + 'a>> {
        Box::pin(async move {
            let blobs = self
                .blobs
                .lock()
                .map_err(|_| AppError::Storage("blob map poisoned".into()))?;
            Ok(blobs.get(key).cloned())
        })
    }

    fn put<'a>(
        &'a self,
        key: &'a str,
        value: Value,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let mut blobs = self
                .blobs
                .lock()
                .map_err(|_| AppError::Storage("blob map poisoned".into()))?;
            blobs.insert(key.to_owned(), value);
            Ok(())
        })
    }
}
