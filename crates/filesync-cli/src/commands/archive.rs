//! Archive command - Move a directory's files into a Drive folder
//!
//! `filesync archive [DIR] [--folder NAME]` uploads every regular file in DIR
//! (default `archive.source_dir`) with its own mtime, then deletes it locally.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use filesync_core::ports::IRemoteStore;
use filesync_sync::archive::ArchiveUploader;

use super::{connect_drive, CliContext};
use crate::output::count;

#[derive(Debug, Args)]
pub struct ArchiveCommand {
    /// Directory to archive (default: archive.source_dir)
    pub dir: Option<PathBuf>,

    /// Drive folder receiving the files (default: archive.folder)
    #[arg(long)]
    pub folder: Option<String>,
}

impl ArchiveCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let fmt = ctx.formatter();
        let dir = self
            .dir
            .clone()
            .unwrap_or_else(|| ctx.config.archive.source_dir.clone());
        let folder = self
            .folder
            .clone()
            .unwrap_or_else(|| ctx.config.archive.folder.clone());

        let remote = connect_drive(&ctx.config).await?;
        let folder_id = remote
            .find_or_create_folder(&folder)
            .await
            .with_context(|| format!("Failed to resolve Drive folder '{}'", folder))?;
        info!(dir = %dir.display(), folder = %folder, "Archiving directory");

        let report = ArchiveUploader::new(remote)
            .archive_dir(&dir, &folder_id)
            .await?;

        if ctx.format.is_json() {
            let files: Vec<String> = report
                .archived
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            fmt.print_json(&serde_json::json!({
                "folder": folder,
                "archived": files,
                "bytes": report.bytes,
            }));
        } else if report.archived.is_empty() {
            fmt.success(&format!("Nothing to archive in {}", dir.display()));
        } else {
            fmt.success(&format!(
                "Archived {} ({} bytes) into '{}'",
                count(report.archived.len(), "file"),
                report.bytes,
                folder
            ));
            for path in &report.archived {
                fmt.info(&path.display().to_string());
            }
        }
        Ok(())
    }
}
