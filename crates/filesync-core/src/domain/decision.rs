//! Reconciliation decision rules
//!
//! Pure functions deciding which remote version is authoritative and which
//! direction, if any, a logical file should be transferred in. Three clocks
//! are compared: the local mtime, the remote version mtime, and the pair
//! cached by the metadata store after the previous successful sync.
//!
//! ## Design Notes
//!
//! - Ordering uses strict "before": among versions with equal timestamps the
//!   one listed last becomes authoritative.
//! - The grace window is a fixed one second of mtime slack. Changing it
//!   changes which local edits are considered new.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::metadata::{sync_epoch, SyncMetadataRecord};
use super::version::RemoteVersion;

/// Slack added to the cached local mtime before a local edit counts as new
pub fn grace_window() -> Duration {
    Duration::seconds(1)
}

/// The newest remote version of a logical file together with its parsed mtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authoritative<'a> {
    /// The selected version
    pub version: &'a RemoteVersion,
    /// Its parsed modification time (the retention pivot)
    pub modified: DateTime<Utc>,
}

/// Selects the authoritative version among all listed copies
///
/// Returns `None` when `versions` is empty. Every timestamp is parsed, so a
/// single malformed value fails the whole selection instead of being skipped.
///
/// # Errors
/// Returns [`DomainError::InvalidTimestamp`] for the first malformed mtime
pub fn select_authoritative(
    versions: &[RemoteVersion],
) -> Result<Option<Authoritative<'_>>, DomainError> {
    let mut best: Option<Authoritative<'_>> = None;

    for version in versions {
        let modified = version.modified_time()?;
        match best {
            Some(current) if modified < current.modified => {}
            _ => best = Some(Authoritative { version, modified }),
        }
    }

    Ok(best)
}

/// Direction chosen for a logical file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDecision {
    /// Local copy is newer: create a new remote version
    Upload,
    /// Remote copy is newer or the local file is missing
    Download,
    /// Nothing to transfer
    UpToDate,
}

impl std::fmt::Display for SyncDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SyncDecision::Upload => "upload",
            SyncDecision::Download => "download",
            SyncDecision::UpToDate => "up_to_date",
        };
        write!(f, "{}", s)
    }
}

/// Decides the transfer direction when at least one remote version exists
///
/// # Arguments
///
/// * `remote_mtime` - mtime of the authoritative remote version
/// * `local_mtime` - mtime of the local file, `None` if it does not exist
/// * `record` - the cached record for this path, if any
pub fn decide(
    remote_mtime: DateTime<Utc>,
    local_mtime: Option<DateTime<Utc>>,
    record: Option<&SyncMetadataRecord>,
) -> SyncDecision {
    let Some(local_mtime) = local_mtime else {
        return SyncDecision::Download;
    };

    // Without a record the local mtime stands in for the last seen remote time
    let baseline = record.map_or(local_mtime, |r| r.remote_mod_date);
    if baseline < remote_mtime {
        return SyncDecision::Download;
    }

    let last_local = record.map_or_else(sync_epoch, |r| r.local_mod_date);
    if local_mtime > last_local + grace_window() {
        SyncDecision::Upload
    } else {
        SyncDecision::UpToDate
    }
}
