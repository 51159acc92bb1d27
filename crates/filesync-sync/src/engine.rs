//! Reconciliation engine
//!
//! The [`SyncEngine`] reconciles one local path with every remote version of
//! the same name inside a container.
//!
//! ## Sync Flow
//!
//! 1. **List**: drain every page of versions named like the file
//! 2. **Decide**: no versions means upload; otherwise the newest version is
//!    authoritative and is compared against the cached record and local mtime
//! 3. **Transfer**: upload, download or nothing
//! 4. **Prune**: expire old versions and orphaned signatures, using the
//!    authoritative mtime as the pivot
//!
//! Work runs strictly in sequence and nothing is retried. Sync-all mode stops
//! at the first failing path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use filesync_core::domain::{
    decide, select_authoritative, RemoteId, SigningKey, SyncDecision, VersionQuery,
};
use filesync_core::ports::{IMetadataStore, IRemoteStore, ISigner};

use crate::filesystem;
use crate::pagination::VersionPages;
use crate::prune::{PruneReport, VersionPruner};
use crate::transfer::TransferProtocol;
use crate::{chain, SyncError};

// ============================================================================
// SyncTarget
// ============================================================================

/// Where a file is synchronized to, and how uploads are signed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    /// Remote folder holding the versions
    pub container_id: RemoteId,
    /// Key for detached signatures; `None` uploads unsigned
    pub signing_key: Option<SigningKey>,
}

impl SyncTarget {
    /// Creates an unsigned target
    pub fn new(container_id: RemoteId) -> Self {
        Self {
            container_id,
            signing_key: None,
        }
    }

    /// Signs uploads with `key`
    pub fn with_signing_key(mut self, key: SigningKey) -> Self {
        self.signing_key = Some(key);
        self
    }
}

// ============================================================================
// SyncOutcome / SyncReport
// ============================================================================

/// Result of reconciling one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// The reconciled path
    pub path: PathBuf,
    /// What was done
    pub decision: SyncDecision,
    /// Version uploaded or downloaded; `None` when up to date
    pub version: Option<RemoteId>,
    /// Deletions made by the prune pass
    pub pruned: PruneReport,
}

/// Summary of a sync-all run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Paths uploaded
    pub uploaded: u32,
    /// Paths downloaded
    pub downloaded: u32,
    /// Paths already in sync
    pub unchanged: u32,
    /// Expired versions deleted
    pub versions_pruned: u32,
    /// Orphaned signatures deleted
    pub signatures_pruned: u32,
}

impl SyncReport {
    /// Adds one path's outcome to the totals
    pub fn record(&mut self, outcome: &SyncOutcome) {
        match outcome.decision {
            SyncDecision::Upload => self.uploaded += 1,
            SyncDecision::Download => self.downloaded += 1,
            SyncDecision::UpToDate => self.unchanged += 1,
        }
        self.versions_pruned += outcome.pruned.versions_deleted as u32;
        self.signatures_pruned += outcome.pruned.signatures_deleted as u32;
    }

    /// Number of paths processed
    pub fn total(&self) -> u32 {
        self.uploaded + self.downloaded + self.unchanged
    }
}

// ============================================================================
// SyncEngine
// ============================================================================

/// Per-file reconciliation between the local filesystem and a remote store
///
/// ## Dependencies
///
/// - `remote`: version listing, transfers and deletions
/// - `metadata`: the last observed remote/local mtimes per path
/// - `signer`: detached signatures (only used when a key is set or a
///   downloaded version is signed)
pub struct SyncEngine {
    remote: Arc<dyn IRemoteStore>,
    metadata: Arc<dyn IMetadataStore>,
    transfer: TransferProtocol,
}

impl SyncEngine {
    /// Creates a new `SyncEngine` with the given ports
    pub fn new(
        remote: Arc<dyn IRemoteStore>,
        metadata: Arc<dyn IMetadataStore>,
        signer: Arc<dyn ISigner>,
    ) -> Self {
        let transfer = TransferProtocol::new(Arc::clone(&remote), Arc::clone(&metadata), signer);
        Self {
            remote,
            metadata,
            transfer,
        }
    }

    /// Reconciles one path with its remote versions
    ///
    /// # Errors
    /// Any listing, parsing, transfer, cache or prune failure. Work already
    /// completed (an upload, a renamed download) is not rolled back.
    #[tracing::instrument(skip(self, target), fields(path = %path.display()), err)]
    pub async fn sync_file(
        &self,
        path: &Path,
        target: &SyncTarget,
    ) -> Result<SyncOutcome, SyncError> {
        let query = VersionQuery::for_file(path, target.container_id.clone())?;
        info!(name = %query.name, "Querying remote versions");

        let versions = VersionPages::new(self.remote.as_ref(), query.clone())
            .collect_all()
            .await?;

        let Some(authoritative) = select_authoritative(&versions).map_err(SyncError::timestamp)?
        else {
            info!("No remote versions, uploading");
            let uploaded = self.transfer.upload(path, target).await?;
            return Ok(SyncOutcome {
                path: path.to_path_buf(),
                decision: SyncDecision::Upload,
                version: Some(uploaded.id),
                pruned: PruneReport::default(),
            });
        };

        let record = self
            .metadata
            .get(path)
            .await
            .map_err(|e| SyncError::MetadataRead(format!("{}: {}", path.display(), chain(&e))))?;
        let local = filesystem::stat(path).await?;

        let decision = decide(
            authoritative.modified,
            local.map(|s| s.modified),
            record.as_ref(),
        );
        info!(
            %decision,
            versions = versions.len(),
            remote = %authoritative.modified,
            local = ?local.map(|s| s.modified),
            cached = record.is_some(),
            "Reconciled"
        );

        let mut pruner = VersionPruner::new(self.remote.as_ref());
        let version = match decision {
            SyncDecision::Download => {
                self.transfer.download(path, authoritative.version).await?;
                Some(authoritative.version.id().clone())
            }
            SyncDecision::Upload => {
                let uploaded = self.transfer.upload(path, target).await?;
                if let Some(signature) = uploaded.signature {
                    pruner = pruner.keep_signature(signature);
                }
                Some(uploaded.id)
            }
            SyncDecision::UpToDate => None,
        };

        // The listing predates an upload made above
        let pruned = pruner
            .prune(&query, &versions, authoritative.modified, Utc::now())
            .await?;

        Ok(SyncOutcome {
            path: path.to_path_buf(),
            decision,
            version,
            pruned,
        })
    }

    /// Reconciles every path the metadata cache knows about
    ///
    /// Stops at the first failure.
    #[tracing::instrument(skip(self, target))]
    pub async fn sync_all(&self, target: &SyncTarget) -> Result<SyncReport, SyncError> {
        let paths = self
            .metadata
            .list_known_paths()
            .await
            .map_err(|e| SyncError::MetadataRead(chain(&e)))?;
        info!(count = paths.len(), "Syncing known paths");

        let mut report = SyncReport::default();
        for path in &paths {
            let outcome = self.sync_file(path, target).await?;
            debug!(path = %path.display(), decision = %outcome.decision, "Path done");
            report.record(&outcome);
        }

        info!(
            uploaded = report.uploaded,
            downloaded = report.downloaded,
            unchanged = report.unchanged,
            "Sync complete"
        );
        Ok(report)
    }
}
