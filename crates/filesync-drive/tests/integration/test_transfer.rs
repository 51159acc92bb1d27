//! Integration tests for uploads, downloads and deletions

use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use filesync_core::domain::RemoteId;
use filesync_core::ports::{IRemoteStore, NewRemoteObject};
use filesync_drive::{upload, DriveError, DriveRemoteStore};
use wiremock::{
    matchers::{body_json, method, path},
    Mock, ResponseTemplate,
};

use crate::common;

fn folder() -> RemoteId {
    RemoteId::new("folder-1".to_string()).unwrap()
}

// ============================================================================
// Download tests
// ============================================================================

#[tokio::test]
async fn test_download_returns_content() {
    let (server, client) = common::setup_drive_mock().await;
    let content = b"Hello, Drive! This is test content.";
    common::mount_download(&server, "download-001", content).await;

    let id = RemoteId::new("download-001".to_string()).unwrap();
    let data = DriveRemoteStore::new(client)
        .download(&id)
        .await
        .expect("Download failed");
    assert_eq!(data, content);
}

#[tokio::test]
async fn test_download_empty_file() {
    let (server, client) = common::setup_drive_mock().await;
    common::mount_download(&server, "empty-001", &[]).await;

    let id = RemoteId::new("empty-001".to_string()).unwrap();
    assert!(client.download(&id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_download_missing_file_is_not_found() {
    let (server, client) = common::setup_drive_mock().await;
    Mock::given(method("GET"))
        .and(path("/files/missing-001"))
        .respond_with(ResponseTemplate::new(404).set_body_string("File not found"))
        .mount(&server)
        .await;

    let id = RemoteId::new("missing-001".to_string()).unwrap();
    let err = client.download(&id).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DriveError>(),
        Some(DriveError::NotFound(_))
    ));
}

// ============================================================================
// Delete tests
// ============================================================================

#[tokio::test]
async fn test_delete_sends_delete_request() {
    let (server, client) = common::setup_drive_mock().await;
    Mock::given(method("DELETE"))
        .and(path("/files/old-001"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let id = RemoteId::new("old-001".to_string()).unwrap();
    DriveRemoteStore::new(client)
        .delete(&id)
        .await
        .expect("Delete failed");
}

#[tokio::test]
async fn test_delete_forbidden_is_error() {
    let (server, client) = common::setup_drive_mock().await;
    Mock::given(method("DELETE"))
        .and(path("/files/old-001"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let id = RemoteId::new("old-001".to_string()).unwrap();
    assert!(DriveRemoteStore::new(client).delete(&id).await.is_err());
}

// ============================================================================
// Upload tests
// ============================================================================

#[tokio::test]
async fn test_create_uploads_metadata_then_content() {
    let (server, client) = common::setup_drive_mock().await;
    let session_url = format!("{}/upload/session/abc", server.uri());

    let mut properties = HashMap::new();
    properties.insert("mode".to_string(), "420".to_string());
    properties.insert("gpg".to_string(), "sig-001".to_string());
    let declared = Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap();

    Mock::given(method("POST"))
        .and(path("/upload/files"))
        .and(body_json(serde_json::json!({
            "name": "notes.txt",
            "parents": ["folder-1"],
            "properties": { "mode": "420", "gpg": "sig-001" },
            "modifiedTime": "2024-01-05T00:00:00.000Z"
        })))
        .respond_with(ResponseTemplate::new(200).insert_header("Location", session_url.as_str()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/upload/session/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "new-001",
            "name": "notes.txt"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let object = NewRemoteObject::new("notes.txt", folder())
        .with_properties(properties)
        .with_modified_time(declared);

    let id = DriveRemoteStore::new(client)
        .create(&object, b"hello".to_vec())
        .await
        .expect("Upload failed");
    assert_eq!(id.as_str(), "new-001");
}

#[tokio::test]
async fn test_upload_file_returns_created_resource() {
    let (server, client) = common::setup_drive_mock().await;
    common::mount_upload_session(&server, "new-002").await;

    let object = NewRemoteObject::new("notes.txt.sig", folder());
    let file = upload::upload_file(&client, &object, vec![0u8; 64])
        .await
        .expect("Upload failed");
    assert_eq!(file.id, "new-002");
}

#[tokio::test]
async fn test_upload_session_without_location_fails() {
    let (server, client) = common::setup_drive_mock().await;
    Mock::given(method("POST"))
        .and(path("/upload/files"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let object = NewRemoteObject::new("notes.txt", folder());
    assert!(upload::create_upload_session(&client, &object, 5)
        .await
        .is_err());
}

#[tokio::test]
async fn test_upload_rejected_session_is_error() {
    let (server, client) = common::setup_drive_mock().await;
    Mock::given(method("POST"))
        .and(path("/upload/files"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid credentials"))
        .mount(&server)
        .await;

    let object = NewRemoteObject::new("notes.txt", folder());
    let result = DriveRemoteStore::new(client)
        .create(&object, b"hello".to_vec())
        .await;
    assert!(result.is_err());
}
