//! Version pruning
//!
//! Runs after every reconciliation of a file that had remote versions.
//!
//! - **Versions**: a version strictly older than the pivot (the authoritative
//!   version's mtime) whose age exceeds the retention window is deleted.
//!   Every other version keeps its signature alive.
//! - **Signatures**: every `<name>.sig` object that no surviving version
//!   references is deleted. The listing is drained before the first delete,
//!   so page tokens never point into a shrinking result set. Signatures
//!   passed to [`VersionPruner::keep_signature`] (the one just uploaded with
//!   a version the listing predates) always survive.
//!
//! A failed deletion aborts the prune; the next sync of the file sweeps again.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use filesync_core::domain::{
    retention_verdict, RemoteId, RemoteVersion, RetentionVerdict, VersionQuery,
};
use filesync_core::ports::IRemoteStore;

use crate::pagination::VersionPages;
use crate::{chain, SyncError};

/// What a prune pass deleted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Expired versions deleted
    pub versions_deleted: usize,
    /// Orphaned signatures deleted
    pub signatures_deleted: usize,
}

/// Deletes expired versions and orphaned signatures of one file
pub struct VersionPruner<'a> {
    remote: &'a dyn IRemoteStore,
    kept: Vec<RemoteId>,
}

impl<'a> VersionPruner<'a> {
    /// Creates a pruner over the remote store
    pub fn new(remote: &'a dyn IRemoteStore) -> Self {
        Self {
            remote,
            kept: Vec::new(),
        }
    }

    /// Keeps `signature` even though no listed version references it
    pub fn keep_signature(mut self, signature: RemoteId) -> Self {
        self.kept.push(signature);
        self
    }

    /// Prunes the versions listed for `query`
    ///
    /// # Arguments
    /// * `query` - The file's version query; signatures are listed with
    ///   [`VersionQuery::signatures`]
    /// * `versions` - Every version of the file, all pages drained
    /// * `pivot` - mtime of the authoritative version
    /// * `now` - Reference time for version age
    #[instrument(skip(self, versions), fields(name = %query.name, count = versions.len()))]
    pub async fn prune(
        &self,
        query: &VersionQuery,
        versions: &[RemoteVersion],
        pivot: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<PruneReport, SyncError> {
        let mut report = PruneReport::default();
        let mut live_signatures: HashSet<&str> = self.kept.iter().map(RemoteId::as_str).collect();

        for version in versions {
            let modified = version.modified_time().map_err(SyncError::timestamp)?;
            let verdict = retention_verdict(modified, pivot, now);

            if verdict == RetentionVerdict::Expired {
                info!(id = %version.id(), modified = %modified, "Deleting expired version");
                self.remote.delete(version.id()).await.map_err(|e| {
                    SyncError::Prune(format!("deleting version {}: {}", version.id(), chain(&e)))
                })?;
                report.versions_deleted += 1;
            } else if let Some(sig) = version.signature_id() {
                live_signatures.insert(sig);
            }
        }

        let signatures = VersionPages::new(self.remote, query.signatures())
            .collect_all()
            .await?;
        for signature in &signatures {
            if live_signatures.contains(signature.id().as_str()) {
                continue;
            }
            info!(id = %signature.id(), "Deleting orphaned signature");
            self.remote.delete(signature.id()).await.map_err(|e| {
                SyncError::Prune(format!(
                    "deleting signature {}: {}",
                    signature.id(),
                    chain(&e)
                ))
            })?;
            report.signatures_deleted += 1;
        }

        debug!(
            versions_deleted = report.versions_deleted,
            signatures_deleted = report.signatures_deleted,
            live_signatures = live_signatures.len(),
            "Prune complete"
        );
        Ok(report)
    }
}
