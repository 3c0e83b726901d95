//! Attachment storage boundary.
//!
//! Image payload items reference externally stored binaries by id. The core
//! only ever needs to release such a reference when the owning alarm is
//! cancelled; upload and retrieval belong to the messaging side.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use tracing::debug;

use crate::{AppError, Result};

/// Release-only view of attachment storage.
pub trait AttachmentStore: Send + Sync {
    /// Release the stored binary behind `ref_id`. Idempotent: releasing an
    /// unknown reference succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`](crate::AppError::Io) if the backing storage
    /// fails while removing an existing attachment.
    fn release<'a>(
        &'a self,
        ref_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Directory-backed attachment store: one file per reference id.
pub struct DirAttachmentStore {
    root: PathBuf,
}

impl DirAttachmentStore {
    /// Open (creating if needed) an attachment store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`](crate::AppError::Io) if the root directory
    /// cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .map_err(|err| AppError::Io(format!("failed to create {}: {err}", root.display())))?;
        Ok(Self { root })
    }
}

impl AttachmentStore for DirAttachmentStore {
    fn release<'a>(
        &'a self,
        ref_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let path = self.root.join(ref_id);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    debug!(ref_id, "attachment released");
                    Ok(())
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(AppError::Io(format!(
                    "failed to remove {}: {err}",
                    path.display()
                ))),
            }
        })
    }
}

/// Attachment store that discards releases, for transports without binary
/// uploads.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAttachmentStore;

impl AttachmentStore for NoopAttachmentStore {
    fn release<'a>(
        &'a self,
        _ref_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async { Ok(()) })
    }
}
