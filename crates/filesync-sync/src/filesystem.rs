//! Local filesystem helpers
//!
//! ## Design Decisions
//!
//! - **Atomic replace**: downloads are written to a hidden sibling `_<name>`
//!   in the same directory and renamed over the target, so the real path is
//!   either the old content or the complete new content.
//! - **Temp guards**: [`TempPath`] removes its file when dropped unless it
//!   was disarmed after a successful rename.
//! - **Exact mode**: permission bits are applied with `set_permissions` after
//!   the write so the process umask does not alter them.

use std::io::ErrorKind;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, instrument, warn};

use filesync_core::domain::DomainError;

use crate::SyncError;

/// Prefix of the hidden sibling a download is staged in
const TEMP_PREFIX: &str = "_";

/// What reconciliation needs to know about a local file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalState {
    /// Last modification time
    pub modified: DateTime<Utc>,
    /// Permission bits (`mode & 0o7777`)
    pub mode: u32,
}

/// Stats a local file
///
/// # Returns
/// `None` if the path does not exist. Any other failure is an error.
#[instrument(fields(path = %path.display()))]
pub async fn stat(path: &Path) -> Result<Option<LocalState>, SyncError> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("local file missing");
            return Ok(None);
        }
        Err(e) => return Err(SyncError::io(path, e)),
    };

    let modified = metadata.modified().map_err(|e| SyncError::io(path, e))?;
    let state = LocalState {
        modified: DateTime::<Utc>::from(modified),
        mode: metadata.permissions().mode() & 0o7777,
    };
    debug!(modified = %state.modified, mode = %format!("{:o}", state.mode), "stat");
    Ok(Some(state))
}

/// Stats a file that must exist
pub async fn stat_existing(path: &Path) -> Result<LocalState, SyncError> {
    stat(path).await?.ok_or_else(|| {
        SyncError::io(
            path,
            std::io::Error::new(ErrorKind::NotFound, "file does not exist"),
        )
    })
}

/// Returns the UTF-8 base name of a path
pub fn base_name(path: &Path) -> Result<&str, SyncError> {
    path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| SyncError::Domain(DomainError::InvalidPath(path.display().to_string())))
}

/// Hidden sibling used to stage a download: `dir/_<name><suffix>`
pub fn temp_sibling(path: &Path, suffix: &str) -> Result<PathBuf, SyncError> {
    let name = base_name(path)?;
    Ok(path.with_file_name(format!("{}{}{}", TEMP_PREFIX, name, suffix)))
}

/// Writes `data` to `path`, truncating it, and applies `mode`
#[instrument(skip(data), fields(path = %path.display(), bytes = data.len()))]
pub async fn write_with_mode(path: &Path, data: &[u8], mode: u32) -> Result<(), SyncError> {
    tokio::fs::write(path, data)
        .await
        .map_err(|e| SyncError::io(path, e))?;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .await
        .map_err(|e| SyncError::io(path, e))?;
    debug!(mode = %format!("{:o}", mode), "written");
    Ok(())
}

// ============================================================================
// TempPath
// ============================================================================

/// Removes a staging file on drop unless disarmed
#[derive(Debug)]
pub struct TempPath {
    path: PathBuf,
    armed: bool,
}

impl TempPath {
    /// Guards `path`; nothing has to exist yet
    pub fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    /// The guarded path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keeps the file (it has been renamed into place)
    pub fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TempPath {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "temp file removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove temp file"),
        }
    }
}

// ============================================================================
// Unit tests
// ============================================================================
