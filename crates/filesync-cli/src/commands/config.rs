//! Config command - View and manage filesync configuration
//!
//! 1. `show`     - prints the effective YAML configuration
//! 2. `set`      - sets one value via a dot-notation key and saves the file
//! 3. `validate` - loads the file strictly and reports every problem
//! 4. `stored`   - lists the operator settings kept in the database
//!    (sync folder, signing key)

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use filesync_core::config::{Config, TokenStoreKind};
use filesync_core::ports::IConfigStore;

use super::{open_store, CliContext};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "drive.page_size")
        key: String,
        /// New value
        value: String,
    },
    /// Validate configuration file
    Validate,
    /// List settings remembered from --folder / --key
    Stored,
}

/// Keys accepted by `config set`, with a short description
const SUPPORTED_KEYS: &[(&str, &str)] = &[
    ("database.path", "SQLite metadata file"),
    ("auth.credentials_file", "Google OAuth client secret JSON"),
    ("auth.token_file", "Token file (token_store = file)"),
    ("auth.token_store", "file|keyring"),
    ("drive.page_size", "Objects per listing page"),
    ("signing.program", "gpg-compatible program"),
    ("archive.source_dir", "Default directory for 'filesync archive'"),
    ("archive.folder", "Default Drive folder for 'filesync archive'"),
    ("logging.level", "trace|debug|info|warn|error"),
];

impl ConfigCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(ctx),
            ConfigCommand::Set { key, value } => self.execute_set(ctx, key, value),
            ConfigCommand::Validate => self.execute_validate(ctx),
            ConfigCommand::Stored => self.execute_stored(ctx).await,
        }
    }

    fn execute_show(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.formatter();
        info!(config_path = %ctx.config_path.display(), "Showing configuration");

        if ctx.format.is_json() {
            let json = serde_json::to_value(&ctx.config)
                .context("Failed to serialize configuration to JSON")?;
            formatter.print_json(&json);
            return Ok(());
        }

        formatter.success(&format!("Configuration ({})", ctx.config_path.display()));
        let yaml =
            serde_yaml::to_string(&ctx.config).context("Failed to serialize configuration")?;
        for line in yaml.lines() {
            formatter.info(line);
        }
        Ok(())
    }

    fn execute_set(&self, ctx: &CliContext, key: &str, value: &str) -> Result<()> {
        let formatter = ctx.formatter();
        let mut config = ctx.config.clone();

        if let Err(e) = apply_config_value(&mut config, key, value) {
            if ctx.format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "success": false,
                    "key": key,
                    "error": e.to_string(),
                }));
            } else {
                formatter.error(&format!("Failed to set '{}': {}", key, e));
                formatter.info("Supported keys:");
                for (name, description) in SUPPORTED_KEYS {
                    formatter.info(&format!("  {:<24} - {}", name, description));
                }
            }
            return Ok(());
        }

        let errors: Vec<String> = config
            .validate()
            .into_iter()
            .filter(|e| e.field == key)
            .map(|e| e.message)
            .collect();
        if !errors.is_empty() {
            if ctx.format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "success": false,
                    "key": key,
                    "errors": errors,
                }));
            } else {
                formatter.error(&format!(
                    "Invalid value for '{}': {}",
                    key,
                    errors.join("; ")
                ));
            }
            return Ok(());
        }

        save(&config, &ctx.config_path)?;
        info!(key, value, "Configuration value set");

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "key": key,
                "value": value,
                "config_path": ctx.config_path.display().to_string(),
            }));
        } else {
            formatter.success(&format!("Set {} = {}", key, value));
            formatter.info(&format!("Saved to {}", ctx.config_path.display()));
        }
        Ok(())
    }

    fn execute_validate(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.formatter();
        let path = &ctx.config_path;

        if !path.exists() {
            if ctx.format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "valid": true,
                    "config_path": path.display().to_string(),
                    "defaults": true,
                }));
            } else {
                formatter.info(&format!("Configuration file not found at {}", path.display()));
                formatter.success("Using default configuration");
            }
            return Ok(());
        }

        // Parse strictly here; other commands fall back to defaults
        let errors: Vec<String> = match Config::load(path) {
            Ok(config) => config.validate().iter().map(|e| e.to_string()).collect(),
            Err(e) => vec![format!("Failed to parse configuration: {:#}", e)],
        };

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::json!({
                "valid": errors.is_empty(),
                "config_path": path.display().to_string(),
                "errors": errors,
            }));
        } else if errors.is_empty() {
            formatter.success("Configuration is valid");
            formatter.info(&format!("File: {}", path.display()));
        } else {
            formatter.error(&format!(
                "Configuration has {}:",
                crate::output::count(errors.len(), "error")
            ));
            formatter.info(&format!("File: {}", path.display()));
            for error in &errors {
                formatter.info(&format!("  {}", error));
            }
        }
        Ok(())
    }

    async fn execute_stored(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.formatter();
        let (pool, store) = open_store(&ctx.config).await?;
        let entries = store.list_strings().await;
        pool.close().await;
        let entries = entries.context("Failed to read stored settings")?;

        if ctx.format.is_json() {
            let map: serde_json::Map<String, serde_json::Value> = entries
                .into_iter()
                .map(|(k, v)| (k, serde_json::Value::String(v)))
                .collect();
            formatter.print_json(&serde_json::Value::Object(map));
        } else if entries.is_empty() {
            formatter.success("No stored settings");
        } else {
            formatter.success(&format!("Stored settings ({})", ctx.config.database.path.display()));
            for (key, value) in &entries {
                formatter.info(&format!("{} = {}", key, value));
            }
        }
        Ok(())
    }
}

fn save(config: &Config, path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("Failed to create configuration directory")?;
    }
    let yaml = serde_yaml::to_string(config).context("Failed to serialize configuration")?;
    std::fs::write(path, yaml).context("Failed to write configuration file")
}

/// Apply a dot-notation key/value pair to a Config struct
fn apply_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "database.path" => config.database.path = PathBuf::from(value),
        "auth.credentials_file" => config.auth.credentials_file = optional_path(value),
        "auth.token_file" => config.auth.token_file = optional_path(value),
        "auth.token_store" => {
            config.auth.token_store = match value {
                "file" => TokenStoreKind::File,
                "keyring" => TokenStoreKind::Keyring,
                other => anyhow::bail!("Expected 'file' or 'keyring', got '{}'", other),
            }
        }
        "drive.page_size" => {
            config.drive.page_size = value
                .parse::<u32>()
                .context("Expected a positive integer for drive.page_size")?;
        }
        "signing.program" => config.signing.program = value.to_string(),
        "archive.source_dir" => config.archive.source_dir = PathBuf::from(value),
        "archive.folder" => config.archive.folder = value.to_string(),
        "logging.level" => config.logging.level = value.to_string(),
        _ => anyhow::bail!("Unknown configuration key: '{}'", key),
    }
    Ok(())
}

/// Empty or `none` clears an optional path
fn optional_path(value: &str) -> Option<PathBuf> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(PathBuf::from(value))
    }
}
