//! filesync Sync - Reconciliation engine
//!
//! Provides:
//! - Per-file reconciliation between a local path and its remote versions
//! - Upload with optional detached signature, verified atomic download
//! - Pruning of expired versions and orphaned signatures
//! - Bulk upload of an archive directory
//!
//! ## Modules
//!
//! - [`engine`] - `SyncEngine`, the per-file orchestrator, and sync-all mode
//! - [`transfer`] - Upload and download protocol
//! - [`prune`] - Version and signature retention
//! - [`pagination`] - Restartable listing over every page of a query
//! - [`filesystem`] - Local stat, mode-preserving writes and temp file guards
//! - [`signer`] - gpg command adapter for the `ISigner` port
//! - [`archive`] - Archive uploader (upload then delete local copy)

pub mod archive;
pub mod engine;
pub mod filesystem;
pub mod pagination;
pub mod prune;
pub mod signer;
pub mod transfer;

pub use engine::{SyncEngine, SyncOutcome, SyncReport, SyncTarget};

use std::path::PathBuf;

use filesync_core::domain::DomainError;
use thiserror::Error;

/// Errors that abort the reconciliation of a file
///
/// Port adapters return `anyhow::Error`; their full context chain is kept in
/// the message.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Listing remote versions failed
    #[error("Remote query failed: {0}")]
    RemoteQuery(String),

    /// A remote modification time could not be parsed
    #[error("Timestamp parse error: {0}")]
    TimestampParse(DomainError),

    /// Signing, uploading or downloading content failed
    #[error("Transfer failed: {0}")]
    Transfer(String),

    /// The detached signature did not verify; the target was left untouched
    #[error("Signature verification failed for {0}")]
    Verification(PathBuf),

    /// The metadata cache could not be read
    #[error("Metadata read failed: {0}")]
    MetadataRead(String),

    /// The metadata cache rejected a write
    #[error("Metadata write failed: {0}")]
    MetadataWrite(String),

    /// Deleting an expired version or orphaned signature failed
    #[error("Prune failed: {0}")]
    Prune(String),

    /// A local file operation failed
    #[error("IO error on {path}: {source}")]
    Io {
        /// Path being operated on
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A domain-level error propagated from filesync-core
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

impl SyncError {
    /// Wraps an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }

    /// Classifies a domain error raised while reading a remote timestamp
    pub fn timestamp(err: DomainError) -> Self {
        match err {
            DomainError::InvalidTimestamp { .. } => SyncError::TimestampParse(err),
            other => SyncError::Domain(other),
        }
    }

    /// Short machine-readable category
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::RemoteQuery(_) => "remote_query",
            SyncError::TimestampParse(_) => "timestamp_parse",
            SyncError::Transfer(_) => "transfer",
            SyncError::Verification(_) => "verification",
            SyncError::MetadataRead(_) => "metadata_read",
            SyncError::MetadataWrite(_) => "metadata_write",
            SyncError::Prune(_) => "prune",
            SyncError::Io { .. } => "io",
            SyncError::Domain(_) => "domain",
        }
    }
}

/// Renders an adapter error with its context chain
pub(crate) fn chain(err: &anyhow::Error) -> String {
    format!("{:#}", err)
}
