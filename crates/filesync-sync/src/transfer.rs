//! Transfer protocol
//!
//! ## Upload
//!
//! 1. Stat the file for its permission bits
//! 2. With a signing key: sign, upload `<name>.sig` next to the content and
//!    keep its id
//! 3. Create the new version with properties `{mode, gpg?}` and a declared
//!    modification time of "now" (millisecond precision, as Drive stores it)
//! 4. Record `{remote: declared time, local: fresh mtime}`
//!
//! ## Download
//!
//! 1. Stage the content in `_<name>` with the version's mode (0600 if unset)
//! 2. With a `gpg` property: stage the signature in `_<name>.sig` and verify
//! 3. Rename the staged file over the target
//! 4. Record `{remote: version mtime, local: fresh mtime}`
//!
//! Staged files are removed on every exit path; the content file survives
//! only by being renamed. Nothing is retried.

use std::path::Path;
use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use tracing::{debug, info, instrument, warn};

use filesync_core::domain::{
    RemoteId, RemoteVersion, SigningKey, SyncMetadataRecord, VersionProperties, DEFAULT_MODE,
    SIGNATURE_SUFFIX,
};
use filesync_core::ports::{IMetadataStore, IRemoteStore, ISigner, NewRemoteObject};

use crate::engine::SyncTarget;
use crate::filesystem::{self, TempPath};
use crate::{chain, SyncError};

/// Objects created by one upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedVersion {
    /// The new content version
    pub id: RemoteId,
    /// Its detached signature, when a signing key was set
    pub signature: Option<RemoteId>,
}

/// Moves content between a local path and the remote store
pub struct TransferProtocol {
    remote: Arc<dyn IRemoteStore>,
    metadata: Arc<dyn IMetadataStore>,
    signer: Arc<dyn ISigner>,
}

impl TransferProtocol {
    /// Creates a protocol over the given ports
    pub fn new(
        remote: Arc<dyn IRemoteStore>,
        metadata: Arc<dyn IMetadataStore>,
        signer: Arc<dyn ISigner>,
    ) -> Self {
        Self {
            remote,
            metadata,
            signer,
        }
    }

    /// Uploads `path` as a new version inside the target container
    ///
    /// # Returns
    /// The ids of the created version and of its signature
    #[instrument(skip(self, target), fields(path = %path.display(), container = %target.container_id))]
    pub async fn upload(
        &self,
        path: &Path,
        target: &SyncTarget,
    ) -> Result<UploadedVersion, SyncError> {
        let name = filesystem::base_name(path)?;
        let state = filesystem::stat_existing(path).await?;

        let mut properties = VersionProperties::new(state.mode);
        let mut signature_id = None;
        if let Some(key) = &target.signing_key {
            let signature = self.sign(path, key).await?;
            let sig_object =
                NewRemoteObject::new(format!("{}{}", name, SIGNATURE_SUFFIX), target.container_id.clone());
            let sig_id = self
                .remote
                .create(&sig_object, signature)
                .await
                .map_err(|e| SyncError::Transfer(format!("uploading signature: {}", chain(&e))))?;
            debug!(signature = %sig_id, "Signature uploaded");
            properties = properties.with_signature(sig_id.clone());
            signature_id = Some(sig_id);
        }

        let content = tokio::fs::read(path)
            .await
            .map_err(|e| SyncError::io(path, e))?;
        let declared = Utc::now().trunc_subsecs(3);
        let object = NewRemoteObject::new(name, target.container_id.clone())
            .with_properties(properties.into_map())
            .with_modified_time(declared);

        let bytes = content.len();
        let id = self
            .remote
            .create(&object, content)
            .await
            .map_err(|e| SyncError::Transfer(format!("uploading {}: {}", name, chain(&e))))?;

        let fresh = filesystem::stat_existing(path).await?;
        self.record(path, SyncMetadataRecord::new(declared, fresh.modified))
            .await?;

        info!(id = %id, bytes, declared = %declared, "Uploaded");
        Ok(UploadedVersion {
            id,
            signature: signature_id,
        })
    }

    /// Replaces `path` with the content of `version`
    #[instrument(skip(self, version), fields(path = %path.display(), id = %version.id()))]
    pub async fn download(&self, path: &Path, version: &RemoteVersion) -> Result<(), SyncError> {
        let remote_mtime = version.modified_time().map_err(SyncError::timestamp)?;
        let mode = version.effective_mode()?;

        let content = self
            .remote
            .download(version.id())
            .await
            .map_err(|e| SyncError::Transfer(format!("downloading {}: {}", version.id(), chain(&e))))?;

        let mut staged = TempPath::new(filesystem::temp_sibling(path, "")?);
        filesystem::write_with_mode(staged.path(), &content, mode).await?;

        if let Some(sig_id) = version.signature_id() {
            let sig_id = RemoteId::new(sig_id.to_string())?;
            let staged_sig = TempPath::new(filesystem::temp_sibling(path, SIGNATURE_SUFFIX)?);

            let signature = self
                .remote
                .download(&sig_id)
                .await
                .map_err(|e| SyncError::Transfer(format!("downloading signature {}: {}", sig_id, chain(&e))))?;
            filesystem::write_with_mode(staged_sig.path(), &signature, DEFAULT_MODE).await?;

            if !self.verify(staged_sig.path(), staged.path()).await {
                return Err(SyncError::Verification(path.to_path_buf()));
            }
            debug!(signature = %sig_id, "Signature verified");
        }

        tokio::fs::rename(staged.path(), path)
            .await
            .map_err(|e| SyncError::io(path, e))?;
        staged.disarm();

        let fresh = filesystem::stat_existing(path).await?;
        self.record(path, SyncMetadataRecord::new(remote_mtime, fresh.modified))
            .await?;

        info!(bytes = content.len(), remote = %remote_mtime, "Downloaded");
        Ok(())
    }

    async fn sign(&self, path: &Path, key: &SigningKey) -> Result<Vec<u8>, SyncError> {
        let signer = Arc::clone(&self.signer);
        let file = path.to_path_buf();
        let key = key.clone();

        tokio::task::spawn_blocking(move || signer.sign(&file, &key))
            .await
            .map_err(|e| SyncError::Transfer(format!("signing task failed: {}", e)))?
            .map_err(|e| SyncError::Transfer(format!("signing {}: {}", path.display(), chain(&e))))
    }

    /// A verifier that cannot be run counts as a failed verification
    async fn verify(&self, signature: &Path, content: &Path) -> bool {
        let signer = Arc::clone(&self.signer);
        let signature = signature.to_path_buf();
        let content = content.to_path_buf();

        match tokio::task::spawn_blocking(move || signer.verify(&signature, &content)).await {
            Ok(Ok(passed)) => passed,
            Ok(Err(e)) => {
                warn!(error = %chain(&e), "Signature verifier could not run");
                false
            }
            Err(e) => {
                warn!(error = %e, "Signature verifier task failed");
                false
            }
        }
    }

    async fn record(&self, path: &Path, record: SyncMetadataRecord) -> Result<(), SyncError> {
        self.metadata
            .set(path, &record)
            .await
            .map_err(|e| SyncError::MetadataWrite(format!("{}: {}", path.display(), chain(&e))))
    }
}
