//! Google Drive v3 API client
//!
//! Provides a typed HTTP client for the Drive v3 REST API. Handles
//! authentication headers, JSON deserialization, status classification and
//! endpoint construction.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use filesync_drive::client::DriveClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = DriveClient::new("access-token-here");
//! let page = client
//!     .list_files("name = 'notes.txt' and trashed = false", None)
//!     .await?;
//! println!("{} copies", page.files.len());
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

use anyhow::{Context, Result};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use filesync_core::domain::RemoteId;

use crate::query::{self, FOLDER_MIME_TYPE};
use crate::DriveError;

/// Base URL for Drive API v3 metadata requests
const DRIVE_BASE_URL: &str = "https://www.googleapis.com/drive/v3";

/// Base URL for Drive API v3 media uploads
const UPLOAD_BASE_URL: &str = "https://www.googleapis.com/upload/drive/v3";

/// Fields requested when listing versions
const LIST_FIELDS: &str = "nextPageToken, files(id, name, modifiedTime, properties)";

/// Default number of files per listing page
const DEFAULT_PAGE_SIZE: u32 = 10;

// ============================================================================
// Drive API resource types
// ============================================================================

/// A Drive `File` resource, restricted to the fields filesync requests
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    /// File ID
    pub id: String,
    /// File name
    #[serde(default)]
    pub name: Option<String>,
    /// Last modification time, RFC3339
    #[serde(default)]
    pub modified_time: Option<String>,
    /// MIME type
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Public custom properties
    #[serde(default)]
    pub properties: Option<HashMap<String, String>>,
}

/// A page of `files.list` results
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileList {
    /// Continuation token, absent on the last page
    #[serde(default)]
    pub next_page_token: Option<String>,
    /// Files on this page
    #[serde(default)]
    pub files: Vec<DriveFile>,
}

/// Request body for creating a folder
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateFolderRequest<'a> {
    name: &'a str,
    mime_type: &'a str,
}

// ============================================================================
// DriveClient
// ============================================================================

/// HTTP client for Google Drive API calls
///
/// Wraps `reqwest::Client` with the bearer token and base URLs. Non-success
/// responses are converted into [`DriveError`] with the response body kept
/// for diagnostics.
pub struct DriveClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL for metadata requests
    base_url: String,
    /// Base URL for media uploads
    upload_base_url: String,
    /// Current OAuth2 access token
    access_token: String,
    /// Files requested per listing page
    page_size: u32,
}

impl DriveClient {
    /// Creates a new DriveClient with the given access token
    ///
    /// # Arguments
    /// * `access_token` - A valid OAuth2 access token with a Drive scope
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: DRIVE_BASE_URL.to_string(),
            upload_base_url: UPLOAD_BASE_URL.to_string(),
            access_token: access_token.into(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Creates a new DriveClient with a custom base URL (useful for testing)
    ///
    /// Uploads go to `{base_url}/upload`.
    ///
    /// # Arguments
    /// * `access_token` - A valid OAuth2 access token
    /// * `base_url` - Custom base URL for API requests
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client: Client::new(),
            upload_base_url: format!("{}/upload", base_url),
            base_url,
            access_token: access_token.into(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Sets the number of files requested per listing page
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Updates the access token (e.g., after a token refresh)
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = token.into();
        debug!("Updated DriveClient access token");
    }

    /// Returns a reference to the current access token
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the listing page size
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Returns the base URL for metadata requests
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the base URL for media uploads
    pub fn upload_base_url(&self) -> &str {
        &self.upload_base_url
    }

    /// Creates an authenticated request builder for the given method and path
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `path` - API path relative to the base URL (e.g., "/files")
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.authorized(method, &url)
    }

    /// Creates an authenticated request builder for an absolute URL
    ///
    /// Used for upload session URLs returned in `Location` headers.
    pub(crate) fn authorized(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.access_token)
    }

    /// Lists one page of files matching a query
    ///
    /// # Arguments
    /// * `q` - Query in the Drive search language
    /// * `page_token` - Token from the previous page, `None` for the first page
    pub async fn list_files(&self, q: &str, page_token: Option<&str>) -> Result<FileList> {
        debug!(q, ?page_token, "Listing files");

        let page_size = self.page_size.to_string();
        let mut params = vec![
            ("q", q),
            ("pageSize", page_size.as_str()),
            ("fields", LIST_FIELDS),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let response = self
            .request(Method::GET, "/files")
            .query(&params)
            .send()
            .await
            .context("Failed to send files.list request")?;

        let list: FileList = check_status(response)
            .await
            .context("files.list failed")?
            .json()
            .await
            .context("Failed to parse files.list response")?;

        debug!(
            count = list.files.len(),
            more = list.next_page_token.is_some(),
            "Listed files"
        );
        Ok(list)
    }

    /// Downloads a file's content
    ///
    /// Makes `GET /files/{id}?alt=media`.
    pub async fn download(&self, id: &RemoteId) -> Result<Vec<u8>> {
        debug!(id = %id, "Downloading file");

        let response = self
            .request(Method::GET, &format!("/files/{}", id.as_str()))
            .query(&[("alt", "media")])
            .send()
            .await
            .context("Failed to send download request")?;

        let bytes = check_status(response)
            .await
            .with_context(|| format!("Download of {} failed", id))?
            .bytes()
            .await
            .context("Failed to read download response body")?;

        debug!(id = %id, bytes = bytes.len(), "Downloaded file");
        Ok(bytes.to_vec())
    }

    /// Permanently deletes a file, bypassing the trash
    pub async fn delete(&self, id: &RemoteId) -> Result<()> {
        debug!(id = %id, "Deleting file");

        let response = self
            .request(Method::DELETE, &format!("/files/{}", id.as_str()))
            .send()
            .await
            .context("Failed to send delete request")?;

        check_status(response)
            .await
            .with_context(|| format!("Delete of {} failed", id))?;
        Ok(())
    }

    /// Finds the first folder with the given name
    pub async fn find_folder(&self, name: &str) -> Result<Option<DriveFile>> {
        let q = query::folder_by_name(name);
        let response = self
            .request(Method::GET, "/files")
            .query(&[("q", q.as_str()), ("fields", "files(id, name, mimeType)")])
            .send()
            .await
            .context("Failed to send folder lookup request")?;

        let list: FileList = check_status(response)
            .await
            .context("Folder lookup failed")?
            .json()
            .await
            .context("Failed to parse folder lookup response")?;

        Ok(list.files.into_iter().next())
    }

    /// Creates a folder at the root of the drive
    pub async fn create_folder(&self, name: &str) -> Result<DriveFile> {
        let response = self
            .request(Method::POST, "/files")
            .query(&[("fields", "id, name, mimeType")])
            .json(&CreateFolderRequest {
                name,
                mime_type: FOLDER_MIME_TYPE,
            })
            .send()
            .await
            .context("Failed to send folder create request")?;

        let folder: DriveFile = check_status(response)
            .await
            .context("Folder creation failed")?
            .json()
            .await
            .context("Failed to parse folder create response")?;

        debug!(name, id = %folder.id, "Created folder");
        Ok(folder)
    }
}

/// Converts a non-success response into a [`DriveError`]
pub(crate) async fn check_status(response: Response) -> Result<Response, DriveError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(DriveError::from_status(status, body))
}
