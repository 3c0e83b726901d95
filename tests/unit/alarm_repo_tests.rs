//! Unit tests for snapshot persistence over the blob-store boundary.

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};

use chime::models::alarm::AlarmRecord;
use chime::models::content::ContentItem;
use chime::models::GroupId;
use chime::persistence::{AlarmRepo, BlobStore, FileBlobStore, MemoryBlobStore};

fn sample_records() -> Vec<AlarmRecord> {
    let start = Utc::now() - ChronoDuration::hours(2);
    vec![
        AlarmRecord::new(
            start,
            3_600_000,
            GroupId(1),
            vec![ContentItem::Text("water the plants".into())],
        ),
        AlarmRecord::new(
            start,
            60_000,
            GroupId(2),
            vec![ContentItem::Image("pic".into()), ContentItem::Face(9)],
        ),
    ]
}

#[tokio::test]
async fn missing_blob_loads_as_empty_set() {
    let store: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
    let repo = AlarmRepo::new(store, "alarm");
    assert!(repo.load_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn snapshot_roundtrips_through_memory_store() {
    let store: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
    let repo = AlarmRepo::new(store, "alarm");

    let records = sample_records();
    repo.persist_all(&records).await.unwrap();
    let loaded = repo.load_all().await.unwrap();

    // Timestamps are persisted at millisecond precision, which is also the
    // precision records are created with here.
    assert_eq!(loaded.len(), records.len());
    for (loaded, original) in loaded.iter().zip(&records) {
        assert_eq!(loaded.id, original.id);
        assert_eq!(
            loaded.start_time.timestamp_millis(),
            original.start_time.timestamp_millis()
        );
        assert_eq!(loaded.interval_ms, original.interval_ms);
        assert_eq!(loaded.group, original.group);
        assert_eq!(loaded.msg, original.msg);
    }
}

#[tokio::test]
async fn persist_of_loaded_set_is_a_content_noop() {
    let store: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
    let repo = AlarmRepo::new(Arc::clone(&store), "alarm");

    repo.persist_all(&sample_records()).await.unwrap();
    let first_blob = store.get("alarm").await.unwrap();

    let loaded = repo.load_all().await.unwrap();
    repo.persist_all(&loaded).await.unwrap();
    let second_blob = store.get("alarm").await.unwrap();

    assert_eq!(first_blob, second_blob);
}

#[tokio::test]
async fn file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let records = sample_records();

    {
        let store: Arc<dyn BlobStore> =
            Arc::new(FileBlobStore::open(dir.path()).unwrap());
        let repo = AlarmRepo::new(store, "alarm");
        repo.persist_all(&records).await.unwrap();
    }

    assert!(dir.path().join("alarm.json").is_file());

    let store: Arc<dyn BlobStore> = Arc::new(FileBlobStore::open(dir.path()).unwrap());
    let repo = AlarmRepo::new(store, "alarm");
    let loaded = repo.load_all().await.unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].id, records[0].id);
    assert_eq!(loaded[1].id, records[1].id);
}

#[tokio::test]
async fn file_store_overwrites_previous_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn BlobStore> = Arc::new(FileBlobStore::open(dir.path()).unwrap());
    let repo = AlarmRepo::new(store, "alarm");

    let records = sample_records();
    repo.persist_all(&records).await.unwrap();
    repo.persist_all(&records[..1]).await.unwrap();

    assert_eq!(repo.load_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn keys_map_to_separate_files() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn BlobStore> = Arc::new(FileBlobStore::open(dir.path()).unwrap());

    let alarm_repo = AlarmRepo::new(Arc::clone(&store), "alarm");
    let other_repo = AlarmRepo::new(Arc::clone(&store), "other");
    alarm_repo.persist_all(&sample_records()).await.unwrap();

    assert!(other_repo.load_all().await.unwrap().is_empty());
}
