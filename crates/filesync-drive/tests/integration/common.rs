//! Shared test helpers for Drive API integration tests
//!
//! Each helper mounts the endpoints a test needs on a wiremock server. The
//! returned DriveClient points at the mock server, with uploads under
//! `/upload`.

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use filesync_core::domain::{RemoteId, VersionQuery};
use filesync_drive::client::DriveClient;

/// Starts a mock server and returns a client pointing at it
pub async fn setup_drive_mock() -> (MockServer, DriveClient) {
    let server = MockServer::start().await;
    let client = DriveClient::with_base_url("test-access-token", server.uri());
    (server, client)
}

/// Query for `notes.txt` inside `folder-1`
pub fn notes_query() -> VersionQuery {
    VersionQuery::new("notes.txt", RemoteId::new("folder-1".to_string()).unwrap())
}

/// A file resource as returned by `files.list`
pub fn file_json(id: &str, modified: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": "notes.txt",
        "modifiedTime": modified,
        "properties": { "mode": "420" }
    })
}

/// Mounts `GET /files` returning one page with no continuation
pub async fn mount_single_page(server: &MockServer, files: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": files
        })))
        .mount(server)
        .await;
}

/// Mounts two listing pages linked by `nextPageToken = "page-2"`
///
/// The continuation mock is mounted first so it wins for requests carrying
/// the token.
pub async fn mount_two_pages(
    server: &MockServer,
    page1: serde_json::Value,
    page2: serde_json::Value,
) {
    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": page2
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "nextPageToken": "page-2",
            "files": page1
        })))
        .expect(1)
        .mount(server)
        .await;
}

/// Mounts `GET /files/{id}?alt=media` returning the given bytes
pub async fn mount_download(server: &MockServer, id: &str, content: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/files/{}", id)))
        .and(query_param("alt", "media"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .mount(server)
        .await;
}

/// Mounts the two requests of a resumable upload
///
/// The session request answers with a `Location` pointing back at the mock
/// server; the content request returns the created file.
pub async fn mount_upload_session(server: &MockServer, created_id: &str) {
    let session_url = format!("{}/upload/session/abc", server.uri());

    Mock::given(method("POST"))
        .and(path("/upload/files"))
        .and(query_param("uploadType", "resumable"))
        .respond_with(ResponseTemplate::new(200).insert_header("Location", session_url.as_str()))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/upload/session/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": created_id,
            "name": "notes.txt",
            "modifiedTime": "2024-01-05T00:00:00.000Z"
        })))
        .expect(1)
        .mount(server)
        .await;
}
