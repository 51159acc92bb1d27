//! Sync command - Reconcile local files with their Drive versions
//!
//! `filesync [PATH]` which:
//! 1. Opens the metadata database and resolves `--folder` / `--key`
//! 2. Loads OAuth tokens and resolves the sync folder on Drive
//! 3. Runs the SyncEngine for PATH, or for every path the cache knows

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use filesync_core::domain::{SigningKey, SyncDecision};
use filesync_core::ports::config_store::{KEY_FOLDER, KEY_SIGNING_KEY};
use filesync_core::ports::IRemoteStore;
use filesync_sync::signer::GpgSigner;
use filesync_sync::{SyncEngine, SyncOutcome, SyncReport, SyncTarget};

use super::{connect_drive, open_store, resolve_setting, CliContext, DEFAULT_FOLDER};
use crate::output::{count, OutputFormatter};

#[derive(Debug, Args)]
pub struct SyncCommand {
    /// File to synchronize; every known file when omitted
    pub path: Option<PathBuf>,

    /// Drive folder holding the versions (remembered for later runs)
    #[arg(long)]
    pub folder: Option<String>,

    /// gpg key used to sign uploads (remembered for later runs)
    #[arg(long)]
    pub key: Option<String>,
}

impl SyncCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let config = &ctx.config;
        let formatter = ctx.formatter();

        let (pool, store) = open_store(config).await?;
        let folder = resolve_setting(store.as_ref(), KEY_FOLDER, self.folder.as_deref())
            .await?
            .unwrap_or_else(|| DEFAULT_FOLDER.to_string());
        let key = resolve_setting(store.as_ref(), KEY_SIGNING_KEY, self.key.as_deref())
            .await?
            .map(SigningKey::new)
            .transpose()
            .context("Invalid signing key")?;

        let remote = connect_drive(config).await?;
        let container = remote
            .find_or_create_folder(&folder)
            .await
            .with_context(|| format!("Failed to resolve Drive folder '{}'", folder))?;
        info!(folder = %folder, id = %container, signed = key.is_some(), "Resolved sync folder");

        let mut target = SyncTarget::new(container);
        if let Some(key) = key {
            target = target.with_signing_key(key);
        }

        let signer = Arc::new(GpgSigner::new(config.signing.program.clone()));
        let engine = SyncEngine::new(remote, store, signer);

        let result = match &self.path {
            Some(path) => {
                let path = absolute(path)?;
                engine
                    .sync_file(&path, &target)
                    .await
                    .map(|outcome| print_outcome(&outcome, ctx, &*formatter))
            }
            None => engine
                .sync_all(&target)
                .await
                .map(|report| print_report(&report, ctx, &*formatter)),
        };

        pool.close().await;
        Ok(result?)
    }
}

/// Cache records are keyed by absolute path
fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to read the working directory")?;
    Ok(cwd.join(path))
}

fn print_outcome(outcome: &SyncOutcome, ctx: &CliContext, formatter: &dyn OutputFormatter) {
    if ctx.format.is_json() {
        formatter.print_json(&serde_json::json!({
            "path": outcome.path.display().to_string(),
            "decision": outcome.decision,
            "version": outcome.version.as_ref().map(|id| id.as_str()),
            "versions_pruned": outcome.pruned.versions_deleted,
            "signatures_pruned": outcome.pruned.signatures_deleted,
        }));
        return;
    }

    let path = outcome.path.display();
    match outcome.decision {
        SyncDecision::Upload => formatter.success(&format!("Uploaded {}", path)),
        SyncDecision::Download => formatter.success(&format!("Downloaded {}", path)),
        SyncDecision::UpToDate => formatter.success(&format!("{} is up to date", path)),
    }
    if let Some(id) = &outcome.version {
        formatter.info(&format!("Version: {}", id));
    }
    print_pruned(
        outcome.pruned.versions_deleted,
        outcome.pruned.signatures_deleted,
        formatter,
    );
}

fn print_report(report: &SyncReport, ctx: &CliContext, formatter: &dyn OutputFormatter) {
    if ctx.format.is_json() {
        formatter.print_json(&serde_json::json!({
            "uploaded": report.uploaded,
            "downloaded": report.downloaded,
            "unchanged": report.unchanged,
            "versions_pruned": report.versions_pruned,
            "signatures_pruned": report.signatures_pruned,
        }));
        return;
    }

    if report.total() == 0 {
        formatter.success("No known files; sync a path first");
        return;
    }
    if report.uploaded + report.downloaded == 0 {
        formatter.success(&format!(
            "Already up to date ({})",
            count(report.unchanged as usize, "file")
        ));
    } else {
        formatter.success(&format!(
            "Synchronized {}",
            count(report.total() as usize, "file")
        ));
        formatter.info(&format!("Uploaded:   {}", report.uploaded));
        formatter.info(&format!("Downloaded: {}", report.downloaded));
        formatter.info(&format!("Unchanged:  {}", report.unchanged));
    }
    print_pruned(
        report.versions_pruned as usize,
        report.signatures_pruned as usize,
        formatter,
    );
}

fn print_pruned(versions: usize, signatures: usize, formatter: &dyn OutputFormatter) {
    if versions + signatures > 0 {
        formatter.info(&format!(
            "Pruned {} and {}",
            count(versions, "old version"),
            count(signatures, "signature")
        ));
    }
}
