//! Remote store port (driven/secondary port)
//!
//! This module defines the narrow capability the engine needs from the
//! remote object store: paginated listing by name, creation, deletion,
//! download, and folder resolution.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are adapter-specific;
//!   the sync crate classifies them into its error taxonomy by call site.
//! - Uses `#[async_trait]` for async trait methods.
//! - Content is passed as whole buffers. Files handled by the engine are
//!   small configuration and document files.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::domain::newtypes::{PageToken, RemoteId};
use crate::domain::query::{VersionPage, VersionQuery};

// ============================================================================
// NewRemoteObject
// ============================================================================

/// Metadata of an object about to be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRemoteObject {
    /// Object name
    pub name: String,
    /// Folder the object is created in
    pub parent_id: RemoteId,
    /// Flat property map
    pub properties: HashMap<String, String>,
    /// Declared modification time; the store's clock is used when `None`
    pub modified_time: Option<DateTime<Utc>>,
}

impl NewRemoteObject {
    /// Creates metadata for a plain object without properties
    pub fn new(name: impl Into<String>, parent_id: RemoteId) -> Self {
        Self {
            name: name.into(),
            parent_id,
            properties: HashMap::new(),
            modified_time: None,
        }
    }

    /// Sets the property map
    pub fn with_properties(mut self, properties: HashMap<String, String>) -> Self {
        self.properties = properties;
        self
    }

    /// Sets the declared modification time
    pub fn with_modified_time(mut self, modified_time: DateTime<Utc>) -> Self {
        self.modified_time = Some(modified_time);
        self
    }
}

// ============================================================================
// IRemoteStore trait
// ============================================================================

/// Port trait for remote object store operations
///
/// All methods assume that valid authentication is available; token refresh
/// is handled by the implementation before it is constructed.
#[async_trait::async_trait]
pub trait IRemoteStore: Send + Sync {
    /// Lists one page of objects matching a query
    ///
    /// # Arguments
    /// * `query` - Name and parent folder to match
    /// * `page_token` - Continuation token from the previous page, `None` for the first
    ///
    /// # Returns
    /// The page of versions and the token for the next page, if any
    async fn list_page(
        &self,
        query: &VersionQuery,
        page_token: Option<&PageToken>,
    ) -> anyhow::Result<VersionPage>;

    /// Creates an object and uploads its content
    ///
    /// # Arguments
    /// * `object` - Name, parent, properties and declared modification time
    /// * `content` - Object bytes
    ///
    /// # Returns
    /// The id assigned by the store
    async fn create(&self, object: &NewRemoteObject, content: Vec<u8>) -> anyhow::Result<RemoteId>;

    /// Deletes an object permanently
    async fn delete(&self, id: &RemoteId) -> anyhow::Result<()>;

    /// Downloads an object's content
    async fn download(&self, id: &RemoteId) -> anyhow::Result<Vec<u8>>;

    /// Resolves a top-level folder by name, creating it if absent
    ///
    /// # Returns
    /// The folder id
    async fn find_or_create_folder(&self, name: &str) -> anyhow::Result<RemoteId>;
}
