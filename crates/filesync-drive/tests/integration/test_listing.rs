//! Integration tests for version listing through the IRemoteStore port

use filesync_core::ports::IRemoteStore;
use filesync_drive::DriveRemoteStore;
use wiremock::{
    matchers::{header, method, path, query_param},
    Mock, ResponseTemplate,
};

use crate::common;

#[tokio::test]
async fn test_list_page_sends_version_query() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .and(header("authorization", "Bearer test-access-token"))
        .and(query_param(
            "q",
            "name = 'notes.txt' and 'folder-1' in parents and trashed = false",
        ))
        .and(query_param("pageSize", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": [common::file_json("v1", "2024-01-05T00:00:00.000Z")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = DriveRemoteStore::new(client);
    let page = store
        .list_page(&common::notes_query(), None)
        .await
        .expect("Listing failed");

    assert_eq!(page.versions.len(), 1);
    assert_eq!(page.versions[0].id().as_str(), "v1");
    assert_eq!(page.versions[0].mode().unwrap(), Some(0o644));
    assert!(!page.has_more());
}

#[tokio::test]
async fn test_list_page_follows_continuation_token() {
    let (server, client) = common::setup_drive_mock().await;
    common::mount_two_pages(
        &server,
        serde_json::json!([common::file_json("v1", "2024-01-01T00:00:00.000Z")]),
        serde_json::json!([common::file_json("v2", "2024-01-02T00:00:00.000Z")]),
    )
    .await;

    let store = DriveRemoteStore::new(client);
    let query = common::notes_query();

    let first = store.list_page(&query, None).await.unwrap();
    assert_eq!(first.versions[0].id().as_str(), "v1");
    let token = first.next_page_token.clone().expect("first page has a token");
    assert_eq!(token.as_str(), "page-2");

    let second = store.list_page(&query, Some(&token)).await.unwrap();
    assert_eq!(second.versions[0].id().as_str(), "v2");
    assert!(second.next_page_token.is_none());
}

#[tokio::test]
async fn test_list_page_empty_result() {
    let (server, client) = common::setup_drive_mock().await;
    common::mount_single_page(&server, serde_json::json!([])).await;

    let page = DriveRemoteStore::new(client)
        .list_page(&common::notes_query(), None)
        .await
        .unwrap();
    assert!(page.versions.is_empty());
    assert!(page.next_page_token.is_none());
}

#[tokio::test]
async fn test_list_page_empty_token_is_last_page() {
    let (server, client) = common::setup_drive_mock().await;
    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "nextPageToken": "",
            "files": []
        })))
        .mount(&server)
        .await;

    let page = DriveRemoteStore::new(client)
        .list_page(&common::notes_query(), None)
        .await
        .unwrap();
    assert!(page.next_page_token.is_none());
}

#[tokio::test]
async fn test_list_page_server_error_is_reported() {
    let (server, client) = common::setup_drive_mock().await;
    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend error"))
        .mount(&server)
        .await;

    let result = DriveRemoteStore::new(client)
        .list_page(&common::notes_query(), None)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_list_page_missing_modified_time_is_invalid() {
    let (server, client) = common::setup_drive_mock().await;
    common::mount_single_page(&server, serde_json::json!([{ "id": "v1", "name": "notes.txt" }]))
        .await;

    let result = DriveRemoteStore::new(client)
        .list_page(&common::notes_query(), None)
        .await;
    assert!(result.is_err());
}
