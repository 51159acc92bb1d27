mod common;

use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, TimeZone, Utc};

use filesync_core::ports::IRemoteStore;
use filesync_sync::archive::ArchiveUploader;
use filesync_sync::SyncError;

use common::{folder_id, MemoryRemoteStore};

fn write_with_mtime(path: &std::path::Path, content: &[u8], mtime: SystemTime) {
    std::fs::write(path, content).unwrap();
    std::fs::OpenOptions::new()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(mtime)
        .unwrap();
}

#[tokio::test]
async fn archive_uploads_in_name_order_and_removes_local_files() {
    let dir = tempfile::tempdir().unwrap();
    let recorded = Utc.with_ymd_and_hms(2024, 5, 2, 8, 30, 15).unwrap();
    let precise = SystemTime::from(recorded) + std::time::Duration::from_millis(750);

    write_with_mtime(&dir.path().join("b.mp3"), b"bbbb", precise);
    write_with_mtime(&dir.path().join("a.mp3"), b"aa", precise);
    std::fs::create_dir(dir.path().join("nested")).unwrap();

    let remote = Arc::new(MemoryRemoteStore::new());
    let uploader = ArchiveUploader::new(Arc::clone(&remote) as Arc<dyn IRemoteStore>);
    let report = uploader.archive_dir(dir.path(), &folder_id()).await.unwrap();

    assert_eq!(
        report.archived,
        vec![dir.path().join("a.mp3"), dir.path().join("b.mp3")]
    );
    assert_eq!(report.bytes, 6);
    assert!(!dir.path().join("a.mp3").exists());
    assert!(!dir.path().join("b.mp3").exists());
    assert!(dir.path().join("nested").is_dir());

    let uploaded = remote.named("a.mp3");
    assert_eq!(uploaded.len(), 1);
    assert_eq!(uploaded[0].content, b"aa");
    // Declared time keeps whole seconds only
    let declared: DateTime<Utc> = uploaded[0].modified.parse().unwrap();
    assert_eq!(declared, recorded);
    assert!(uploaded[0].properties.is_empty());
    assert_eq!(remote.object_count(), 2);
}

#[tokio::test]
async fn archive_of_empty_directory_uploads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(MemoryRemoteStore::new());
    let uploader = ArchiveUploader::new(Arc::clone(&remote) as Arc<dyn IRemoteStore>);

    let report = uploader.archive_dir(dir.path(), &folder_id()).await.unwrap();
    assert!(report.archived.is_empty());
    assert_eq!(remote.object_count(), 0);
}

#[tokio::test]
async fn archive_of_missing_directory_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let uploader = ArchiveUploader::new(Arc::new(MemoryRemoteStore::new()));

    let err = uploader
        .archive_dir(&dir.path().join("absent"), &folder_id())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Io { .. }));
}
