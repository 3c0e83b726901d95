//! Persistence layer modules.

pub mod alarm_repo;
pub mod blob;

pub use alarm_repo::AlarmRepo;
pub use blob::{BlobStore, FileBlobStore, MemoryBlobStore};
