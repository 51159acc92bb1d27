//! Auth commands - Login, Logout, and Status for Google Drive authentication
//!
//! 1. `login`  - Runs the OAuth2 PKCE flow via DriveAuthAdapter and stores the
//!    tokens in the configured token store (file or keyring).
//! 2. `logout` - Removes the stored tokens.
//! 3. `status` - Shows where tokens are stored and whether they are still valid.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Subcommand;
use tracing::info;

use filesync_drive::auth::DriveAuthAdapter;

use super::{token_storage, CliContext};

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Authenticate with Google Drive via OAuth2
    Login,
    /// Remove stored credentials
    Logout,
    /// Check authentication status
    Status,
}

impl AuthCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        match self {
            AuthCommand::Login => self.execute_login(ctx).await,
            AuthCommand::Logout => self.execute_logout(ctx),
            AuthCommand::Status => self.execute_status(ctx),
        }
    }

    async fn execute_login(&self, ctx: &CliContext) -> Result<()> {
        let fmt = ctx.formatter();
        let credentials = ctx.config.auth.credentials_path();
        let adapter = DriveAuthAdapter::from_credentials_file(&credentials).with_context(|| {
            format!("Unable to read client secret file {}", credentials.display())
        })?;

        fmt.info("Opening browser for Google login...");
        let tokens = adapter.login().await.context("OAuth2 login failed")?;

        let storage = token_storage(&ctx.config);
        storage.store(&tokens)?;
        info!(store = %storage.describe(), "Stored OAuth tokens");

        if ctx.format.is_json() {
            fmt.print_json(&serde_json::json!({
                "authenticated": true,
                "token_store": storage.describe(),
                "expires_at": tokens.expires_at.to_rfc3339(),
            }));
        } else {
            fmt.success("Authenticated with Google Drive");
            fmt.info(&format!("Tokens stored in {}", storage.describe()));
        }
        Ok(())
    }

    fn execute_logout(&self, ctx: &CliContext) -> Result<()> {
        let fmt = ctx.formatter();
        let storage = token_storage(&ctx.config);
        storage.clear()?;

        if ctx.format.is_json() {
            fmt.print_json(&serde_json::json!({
                "authenticated": false,
                "token_store": storage.describe(),
            }));
        } else {
            fmt.success("Logged out");
        }
        Ok(())
    }

    fn execute_status(&self, ctx: &CliContext) -> Result<()> {
        let fmt = ctx.formatter();
        let storage = token_storage(&ctx.config);
        let tokens = storage.load()?;

        if ctx.format.is_json() {
            fmt.print_json(&serde_json::json!({
                "authenticated": tokens.is_some(),
                "token_store": storage.describe(),
                "expires_at": tokens.as_ref().map(|t| t.expires_at.to_rfc3339()),
                "expired": tokens.as_ref().map(|t| t.is_expired()),
                "refreshable": tokens.as_ref().map(|t| t.refresh_token.is_some()),
            }));
            return Ok(());
        }

        let Some(tokens) = tokens else {
            fmt.warn("Not authenticated. Run 'filesync auth login' first.");
            return Ok(());
        };

        fmt.success("Authenticated");
        fmt.info(&format!("Token store: {}", storage.describe()));
        if tokens.is_expired() {
            let note = if tokens.refresh_token.is_some() {
                "refreshed on next sync"
            } else {
                "run 'filesync auth login'"
            };
            fmt.info(&format!("Access token: expired ({})", note));
        } else {
            let minutes = (tokens.expires_at - Utc::now()).num_minutes();
            fmt.info(&format!("Access token: valid for {} more minutes", minutes));
        }
        Ok(())
    }
}
