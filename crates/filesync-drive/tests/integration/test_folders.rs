//! Integration tests for sync folder resolution

use filesync_core::ports::IRemoteStore;
use filesync_drive::DriveRemoteStore;
use wiremock::{
    matchers::{body_json, method, path, query_param},
    Mock, ResponseTemplate,
};

use crate::common;

const FOLDER_QUERY: &str =
    "name = 'filesync' and mimeType = 'application/vnd.google-apps.folder' and trashed = false";

#[tokio::test]
async fn test_existing_folder_is_reused() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param("q", FOLDER_QUERY))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": [
                { "id": "folder-1", "name": "filesync", "mimeType": "application/vnd.google-apps.folder" },
                { "id": "folder-2", "name": "filesync", "mimeType": "application/vnd.google-apps.folder" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let id = DriveRemoteStore::new(client)
        .find_or_create_folder("filesync")
        .await
        .unwrap();
    assert_eq!(id.as_str(), "folder-1");
}

#[tokio::test]
async fn test_missing_folder_is_created() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "files": [] })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/files"))
        .and(body_json(serde_json::json!({
            "name": "filesync",
            "mimeType": "application/vnd.google-apps.folder"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "folder-new",
            "name": "filesync",
            "mimeType": "application/vnd.google-apps.folder"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let id = DriveRemoteStore::new(client)
        .find_or_create_folder("filesync")
        .await
        .unwrap();
    assert_eq!(id.as_str(), "folder-new");
}

#[tokio::test]
async fn test_folder_lookup_failure_is_error() {
    let (server, client) = common::setup_drive_mock().await;
    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    assert!(DriveRemoteStore::new(client)
        .find_or_create_folder("filesync")
        .await
        .is_err());
}
