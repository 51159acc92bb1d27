//! Upload operations for the Google Drive API
//!
//! Uses the resumable upload protocol so metadata (name, parent, custom
//! properties, declared modification time) and content travel in separate
//! requests:
//! - [`create_upload_session`] - `POST /upload/drive/v3/files?uploadType=resumable`
//!   with the JSON metadata; the session URL comes back in `Location`
//! - [`upload_content`] - `PUT` of the whole body to the session URL
//! - [`upload_file`] - both steps
//!
//! ## Google Drive API References
//!
//! - [Resumable upload](https://developers.google.com/drive/api/guides/manage-uploads#resumable)

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use reqwest::Method;
use serde::Serialize;
use tracing::{debug, info};

use filesync_core::ports::NewRemoteObject;

use crate::client::{check_status, DriveClient, DriveFile};
use crate::DriveError;

/// Fields returned once the content upload completes
const UPLOAD_FIELDS: &str = "id, name, modifiedTime, properties";

// ============================================================================
// Request body
// ============================================================================

/// Metadata half of a resumable upload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileMetadataRequest<'a> {
    name: &'a str,
    parents: [&'a str; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    properties: Option<&'a HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    modified_time: Option<String>,
}

impl<'a> FileMetadataRequest<'a> {
    fn from_object(object: &'a NewRemoteObject) -> Self {
        Self {
            name: &object.name,
            parents: [object.parent_id.as_str()],
            properties: Some(&object.properties).filter(|p| !p.is_empty()),
            modified_time: object.modified_time.as_ref().map(format_modified_time),
        }
    }
}

/// Drive stores modification times with millisecond precision
fn format_modified_time(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ============================================================================
// create_upload_session
// ============================================================================

/// Creates a resumable upload session
///
/// # Arguments
/// * `client` - The authenticated DriveClient
/// * `object` - Name, parent, properties and declared modification time
/// * `content_length` - Size of the content that will follow
///
/// # Returns
/// The session URL from the `Location` header
pub async fn create_upload_session(
    client: &DriveClient,
    object: &NewRemoteObject,
    content_length: usize,
) -> Result<String> {
    let url = format!("{}/files", client.upload_base_url());
    debug!(name = %object.name, parent = %object.parent_id, "Creating upload session");

    let response = client
        .authorized(Method::POST, &url)
        .query(&[("uploadType", "resumable"), ("fields", UPLOAD_FIELDS)])
        .header("X-Upload-Content-Length", content_length.to_string())
        .header("X-Upload-Content-Type", "application/octet-stream")
        .json(&FileMetadataRequest::from_object(object))
        .send()
        .await
        .context("Failed to send upload session request")?;

    let response = check_status(response)
        .await
        .with_context(|| format!("Upload session for {} rejected", object.name))?;

    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            DriveError::InvalidResponse("Upload session response has no Location header".into())
        })?
        .to_string();

    debug!(session = %location, "Upload session created");
    Ok(location)
}

// ============================================================================
// upload_content
// ============================================================================

/// Sends the whole content to an upload session in one request
///
/// # Returns
/// The created file resource
pub async fn upload_content(
    client: &DriveClient,
    session_url: &str,
    content: Vec<u8>,
) -> Result<DriveFile> {
    let len = content.len();
    debug!(bytes = len, "Uploading content");

    let response = client
        .authorized(Method::PUT, session_url)
        .header(CONTENT_TYPE, "application/octet-stream")
        .header(CONTENT_LENGTH, len.to_string())
        .body(content)
        .send()
        .await
        .context("Failed to send upload content request")?;

    let file: DriveFile = check_status(response)
        .await
        .context("Content upload rejected")?
        .json()
        .await
        .context("Failed to parse upload response")?;

    Ok(file)
}

// ============================================================================
// upload_file
// ============================================================================

/// Creates a file with metadata and content
///
/// # Arguments
/// * `client` - The authenticated DriveClient
/// * `object` - Name, parent, properties and declared modification time
/// * `content` - File bytes
///
/// # Returns
/// The created file resource (its `id` identifies the new version)
pub async fn upload_file(
    client: &DriveClient,
    object: &NewRemoteObject,
    content: Vec<u8>,
) -> Result<DriveFile> {
    let session_url = create_upload_session(client, object, content.len()).await?;
    let bytes = content.len();
    let file = upload_content(client, &session_url, content).await?;

    info!(
        name = %object.name,
        id = %file.id,
        bytes,
        "Upload completed"
    );
    Ok(file)
}
