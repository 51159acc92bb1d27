//! Archive uploader
//!
//! Moves every regular file of a local directory into a remote folder: each
//! file is uploaded with its own mtime as the declared modification time and
//! then deleted locally. Files are processed in name order and the run stops
//! at the first failure, so a file is only ever deleted after its upload
//! succeeded.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use tracing::{debug, info, instrument};

use filesync_core::domain::RemoteId;
use filesync_core::ports::{IRemoteStore, NewRemoteObject};

use crate::{chain, SyncError};

/// Files moved by an archive run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveReport {
    /// Uploaded (and locally deleted) files
    pub archived: Vec<PathBuf>,
    /// Total bytes uploaded
    pub bytes: u64,
}

/// Uploads a directory's files and removes the local copies
pub struct ArchiveUploader {
    remote: Arc<dyn IRemoteStore>,
}

impl ArchiveUploader {
    /// Creates an uploader over the remote store
    pub fn new(remote: Arc<dyn IRemoteStore>) -> Self {
        Self { remote }
    }

    /// Archives every regular file directly inside `dir` into `folder`
    #[instrument(skip(self), fields(dir = %dir.display(), folder = %folder))]
    pub async fn archive_dir(
        &self,
        dir: &Path,
        folder: &RemoteId,
    ) -> Result<ArchiveReport, SyncError> {
        let files = regular_files(dir).await?;
        info!(count = files.len(), "Archiving files");

        let mut report = ArchiveReport::default();
        for path in files {
            report.bytes += self.archive_file(&path, folder).await?;
            report.archived.push(path);
        }
        Ok(report)
    }

    async fn archive_file(&self, path: &Path, folder: &RemoteId) -> Result<u64, SyncError> {
        let name = crate::filesystem::base_name(path)?;
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| SyncError::io(path, e))?;
        let modified = metadata.modified().map_err(|e| SyncError::io(path, e))?;
        let declared = DateTime::<Utc>::from(modified).trunc_subsecs(0);

        let content = tokio::fs::read(path)
            .await
            .map_err(|e| SyncError::io(path, e))?;
        let bytes = content.len() as u64;

        info!(name, bytes, "Uploading");
        let object = NewRemoteObject::new(name, folder.clone()).with_modified_time(declared);
        let id = self
            .remote
            .create(&object, content)
            .await
            .map_err(|e| SyncError::Transfer(format!("uploading {}: {}", name, chain(&e))))?;

        tokio::fs::remove_file(path)
            .await
            .map_err(|e| SyncError::io(path, e))?;
        debug!(name, id = %id, "Archived and removed local copy");
        Ok(bytes)
    }
}

/// Regular files directly inside `dir`, sorted by name
async fn regular_files(dir: &Path) -> Result<Vec<PathBuf>, SyncError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| SyncError::io(dir, e))?;

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| SyncError::io(dir, e))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| SyncError::io(entry.path(), e))?;
        if file_type.is_file() {
            files.push(entry.path());
        } else {
            debug!(path = %entry.path().display(), "Skipping non-regular entry");
        }
    }

    files.sort();
    Ok(files)
}
