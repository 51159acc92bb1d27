//! DriveRemoteStore - IRemoteStore implementation for Google Drive
//!
//! Wraps the [`DriveClient`] and delegates to the client, query and upload
//! modules to fulfil the [`IRemoteStore`] port contract.
//!
//! ## Design Notes
//!
//! - Authentication is handled separately by `DriveAuthAdapter`; the store
//!   is constructed with an access token that is valid for the whole run.
//! - Listing maps Drive `File` resources into domain [`RemoteVersion`]s. The
//!   `modifiedTime` string is passed through unparsed, a missing one as an
//!   empty string; both surface as timestamp errors when the engine orders
//!   versions.
//! - An empty `nextPageToken` is treated as the last page.

use anyhow::{Context, Result};
use tracing::{debug, info};

use filesync_core::domain::{PageToken, RemoteId, RemoteVersion, VersionPage, VersionQuery};
use filesync_core::ports::{IRemoteStore, NewRemoteObject};

use crate::client::{DriveClient, DriveFile};
use crate::query;
use crate::upload;

/// Converts a listed Drive file into a domain [`RemoteVersion`]
fn file_to_version(file: DriveFile) -> Result<RemoteVersion> {
    let id = RemoteId::new(file.id.clone())
        .with_context(|| format!("Drive returned an unusable file id '{}'", file.id))?;

    Ok(RemoteVersion::new(
        id,
        file.name.unwrap_or_default(),
        file.modified_time.unwrap_or_default(),
    )
        .with_properties(file.properties.unwrap_or_default()))
}

// ============================================================================
// DriveRemoteStore
// ============================================================================

/// Remote store backed by the Google Drive v3 API
pub struct DriveRemoteStore {
    client: DriveClient,
}

impl DriveRemoteStore {
    /// Creates a new store wrapping the given [`DriveClient`]
    pub fn new(client: DriveClient) -> Self {
        Self { client }
    }

    /// Returns the wrapped client
    pub fn client(&self) -> &DriveClient {
        &self.client
    }
}

#[async_trait::async_trait]
impl IRemoteStore for DriveRemoteStore {
    async fn list_page(
        &self,
        version_query: &VersionQuery,
        page_token: Option<&PageToken>,
    ) -> Result<VersionPage> {
        let q = query::versions(version_query);
        let list = self
            .client
            .list_files(&q, page_token.map(PageToken::as_str))
            .await?;

        let versions = list
            .files
            .into_iter()
            .map(file_to_version)
            .collect::<Result<Vec<_>>>()?;

        let next_page_token = list
            .next_page_token
            .filter(|t| !t.is_empty())
            .map(PageToken::new)
            .transpose()?;

        Ok(VersionPage {
            versions,
            next_page_token,
        })
    }

    async fn create(&self, object: &NewRemoteObject, content: Vec<u8>) -> Result<RemoteId> {
        let file = upload::upload_file(&self.client, object, content).await?;
        let id = RemoteId::new(file.id.clone())
            .with_context(|| format!("Drive returned an unusable file id '{}'", file.id))?;
        Ok(id)
    }

    async fn delete(&self, id: &RemoteId) -> Result<()> {
        self.client.delete(id).await?;
        debug!(id = %id, "Remote object deleted");
        Ok(())
    }

    async fn download(&self, id: &RemoteId) -> Result<Vec<u8>> {
        self.client.download(id).await
    }

    async fn find_or_create_folder(&self, name: &str) -> Result<RemoteId> {
        let folder = match self.client.find_folder(name).await? {
            Some(existing) => {
                debug!(name, id = %existing.id, "Found sync folder");
                existing
            }
            None => {
                info!(name, "Sync folder not found, creating it");
                self.client.create_folder(name).await?
            }
        };

        RemoteId::new(folder.id.clone())
            .with_context(|| format!("Drive returned an unusable folder id '{}'", folder.id))
    }
}

// ============================================================================
// Tests
// ============================================================================
