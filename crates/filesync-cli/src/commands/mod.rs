//! Subcommands and the wiring they share
//!
//! Every command that talks to Drive goes through the same bootstrap:
//! open the SQLite file, resolve the operator settings, load (and refresh)
//! OAuth tokens, then build the Drive adapter.

pub mod archive;
pub mod auth;
pub mod completions;
pub mod config;
pub mod sync;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use filesync_cache::{DatabasePool, SqliteMetadataStore};
use filesync_core::config::Config;
use filesync_core::ports::IConfigStore;
use filesync_drive::auth::{DriveAuthAdapter, TokenStorage};
use filesync_drive::{DriveClient, DriveRemoteStore};
use filesync_sync::SyncError;

use crate::output::{formatter, OutputFormat, OutputFormatter};

/// Name of the Drive folder used when none was ever chosen
pub const DEFAULT_FOLDER: &str = "filesync";

/// State shared by every command
#[derive(Debug)]
pub struct CliContext {
    pub format: OutputFormat,
    pub quiet: bool,
    pub config_path: PathBuf,
    pub config: Config,
}

impl CliContext {
    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        formatter(self.format.is_json(), self.quiet)
    }
}

/// Opens the SQLite file holding the metadata cache and the config store
pub async fn open_store(config: &Config) -> Result<(DatabasePool, Arc<SqliteMetadataStore>)> {
    let pool = DatabasePool::new(&config.database.path)
        .await
        .context("Failed to open database")?;
    let store = Arc::new(SqliteMetadataStore::new(pool.pool().clone()));
    debug!(path = %config.database.path.display(), "Opened metadata store");
    Ok((pool, store))
}

/// Token storage selected in the configuration
pub fn token_storage(config: &Config) -> TokenStorage {
    TokenStorage::from_kind(config.auth.token_store, config.auth.token_path())
}

/// Authenticated Drive adapter, refreshing stored tokens when needed
pub async fn connect_drive(config: &Config) -> Result<Arc<DriveRemoteStore>> {
    let credentials = config.auth.credentials_path();
    let adapter = DriveAuthAdapter::from_credentials_file(&credentials)
        .with_context(|| format!("Unable to read client secret file {}", credentials.display()))?;

    let storage = token_storage(config);
    let tokens = adapter.valid_tokens(&storage).await?;
    info!(store = %storage.describe(), "Using stored OAuth tokens");

    let client = DriveClient::new(tokens.access_token).with_page_size(config.drive.page_size);
    Ok(Arc::new(DriveRemoteStore::new(client)))
}

/// Value of an operator setting
///
/// A flag value wins and is written back to the store; otherwise the stored
/// value is used.
pub async fn resolve_setting(
    store: &dyn IConfigStore,
    key: &str,
    flag: Option<&str>,
) -> Result<Option<String>> {
    if let Some(value) = flag {
        store
            .write_string(key, value)
            .await
            .with_context(|| format!("Failed to store setting '{}'", key))?;
        debug!(key, value, "Stored setting from flag");
        return Ok(Some(value.to_string()));
    }

    store
        .read_string(key)
        .await
        .with_context(|| format!("Failed to read setting '{}'", key))
}

/// Process exit status for a failed command
///
/// - 2: local failure (filesystem, cache, bad remote data)
/// - 3: a downloaded version failed signature verification
/// - 4: the remote store rejected a query, transfer or deletion
/// - 1: anything else (configuration, authentication)
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<SyncError>() {
        Some(SyncError::Verification(_)) => 3,
        Some(SyncError::RemoteQuery(_) | SyncError::Transfer(_) | SyncError::Prune(_)) => 4,
        Some(_) => 2,
        None => 1,
    }
}
