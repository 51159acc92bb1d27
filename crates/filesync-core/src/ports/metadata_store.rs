//! Metadata store port (driven/secondary port)
//!
//! Persists one [`SyncMetadataRecord`] per local path. The engine is the
//! only writer.
//!
//! ## Design Notes
//!
//! - Paths are keyed by their string form exactly as given to the engine.
//! - `set` is an upsert that must report failure when it does not affect
//!   exactly one row.

use std::path::{Path, PathBuf};

use crate::domain::metadata::SyncMetadataRecord;

/// Port trait for the per-path sync metadata cache
#[async_trait::async_trait]
pub trait IMetadataStore: Send + Sync {
    /// Gets the record for a path
    ///
    /// # Returns
    /// `Some(record)` if the path was synced before, `None` otherwise
    async fn get(&self, path: &Path) -> anyhow::Result<Option<SyncMetadataRecord>>;

    /// Inserts or replaces the record for a path
    ///
    /// # Errors
    /// Fails if the write affected zero or more than one row
    async fn set(&self, path: &Path, record: &SyncMetadataRecord) -> anyhow::Result<()>;

    /// Lists every path that has a record
    async fn list_known_paths(&self) -> anyhow::Result<Vec<PathBuf>>;
}
