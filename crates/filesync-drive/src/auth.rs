//! OAuth2 PKCE authentication flow for Google Drive
//!
//! Implements the Authorization Code flow with PKCE (RFC 7636) for an
//! installed application, using a loopback redirect.
//!
//! ## Components
//!
//! - [`ClientCredentials`] - Client id/secret loaded from Google's `credentials.json`
//! - [`OAuth2Config`] - Configuration for the OAuth2 flow
//! - [`Tokens`] - Access/refresh token pair with expiry
//! - [`TokenStorage`] - Token persistence (owner-only JSON file or system keyring)
//! - [`PKCEFlow`] - OAuth2 PKCE challenge/exchange logic
//! - [`LocalCallbackServer`] - Minimal HTTP server for the OAuth redirect
//! - [`DriveAuthAdapter`] - Orchestrates login, refresh and token reuse

use std::fs;
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use oauth2::{
    basic::BasicClient, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken,
    EndpointNotSet, EndpointSet, PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, RefreshToken,
    Scope, TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use filesync_core::config::TokenStoreKind;

/// Google OAuth2 authorization endpoint
const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";

/// Google OAuth2 token endpoint
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Default redirect URI for the local callback server
const REDIRECT_URI: &str = "http://127.0.0.1:8400/callback";

/// Address the callback server binds to
const CALLBACK_ADDR: &str = "127.0.0.1:8400";

/// Keyring service name for storing tokens
const KEYRING_SERVICE: &str = "filesync";

/// Keyring username under which the token JSON is stored
const KEYRING_USER: &str = "google-drive";

/// Access to files created or opened by this application only
pub const DRIVE_FILE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

/// Tokens expiring sooner than this are refreshed before use
const REFRESH_MARGIN_SECS: i64 = 60;

// ============================================================================
// ClientCredentials
// ============================================================================

/// OAuth client registration downloaded from the Google Cloud console
#[derive(Debug, Clone, Deserialize)]
pub struct ClientCredentials {
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
}

/// `credentials.json` wraps the registration in `installed` or `web`
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: Option<ClientCredentials>,
    web: Option<ClientCredentials>,
}

impl ClientCredentials {
    /// Parses the JSON content of a `credentials.json` file
    pub fn from_json(json: &str) -> Result<Self> {
        let file: CredentialsFile =
            serde_json::from_str(json).context("Failed to parse client credentials")?;
        file.installed
            .or(file.web)
            .ok_or_else(|| anyhow!("Client credentials have neither an 'installed' nor a 'web' section"))
    }

    /// Reads and parses a `credentials.json` file
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Unable to read client secret file {}", path.display()))?;
        Self::from_json(&json)
    }
}

// ============================================================================
// OAuth2Config
// ============================================================================

/// Configuration for the OAuth2 PKCE authentication flow
#[derive(Debug, Clone)]
pub struct OAuth2Config {
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret (not confidential for installed apps, but required by Google)
    pub client_secret: String,
    /// Redirect URI for receiving the authorization code
    pub redirect_uri: String,
    /// OAuth scopes to request
    pub scopes: Vec<String>,
}

impl OAuth2Config {
    /// Creates a config for the given client with default settings
    pub fn new(credentials: ClientCredentials) -> Self {
        Self {
            client_id: credentials.client_id,
            client_secret: credentials.client_secret,
            redirect_uri: REDIRECT_URI.to_string(),
            scopes: vec![DRIVE_FILE_SCOPE.to_string()],
        }
    }

    /// Creates a config with custom scopes
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Creates a config with a custom redirect URI
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = uri.into();
        self
    }
}

// ============================================================================
// Tokens
// ============================================================================

/// OAuth tokens as persisted between runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokens {
    /// Bearer token for API calls
    pub access_token: String,
    /// Long-lived token used to obtain new access tokens
    pub refresh_token: Option<String>,
    /// When the access token stops being accepted
    pub expires_at: DateTime<Utc>,
}

impl Tokens {
    /// Whether the access token has already expired
    pub fn is_expired(&self) -> bool {
        self.expires_within(Duration::zero())
    }

    /// Whether the access token expires within `margin` from now
    pub fn expires_within(&self, margin: Duration) -> bool {
        self.expires_at <= Utc::now() + margin
    }
}

fn expiry_from(expires_in: Option<std::time::Duration>) -> DateTime<Utc> {
    expires_in
        .map(|d| Utc::now() + Duration::seconds(d.as_secs() as i64))
        .unwrap_or_else(|| Utc::now() + Duration::hours(1))
}

// ============================================================================
// TokenStorage
// ============================================================================

/// Persists OAuth tokens between runs
#[derive(Debug, Clone)]
pub enum TokenStorage {
    /// JSON file readable only by the owner (mode 0600)
    File(PathBuf),
    /// System keyring entry (service "filesync")
    Keyring,
}

impl TokenStorage {
    /// Builds the storage selected in the configuration
    pub fn from_kind(kind: TokenStoreKind, token_file: PathBuf) -> Self {
        match kind {
            TokenStoreKind::File => TokenStorage::File(token_file),
            TokenStoreKind::Keyring => TokenStorage::Keyring,
        }
    }

    /// Human readable location of the stored tokens
    pub fn describe(&self) -> String {
        match self {
            TokenStorage::File(path) => path.display().to_string(),
            TokenStorage::Keyring => format!("keyring ({}/{})", KEYRING_SERVICE, KEYRING_USER),
        }
    }

    /// Loads stored tokens
    ///
    /// # Returns
    /// `Some(Tokens)` if found, `None` if nothing is stored
    pub fn load(&self) -> Result<Option<Tokens>> {
        let json = match self {
            TokenStorage::File(path) => match fs::read_to_string(path) {
                Ok(json) => json,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!(path = %path.display(), "No token file");
                    return Ok(None);
                }
                Err(e) => {
                    return Err(anyhow::Error::new(e)
                        .context(format!("Failed to read token file {}", path.display())))
                }
            },
            TokenStorage::Keyring => match keyring_entry()?.get_password() {
                Ok(json) => json,
                Err(keyring::Error::NoEntry) => {
                    debug!("No tokens found in keyring");
                    return Ok(None);
                }
                Err(e) => return Err(anyhow::Error::new(e).context("Failed to read from keyring")),
            },
        };

        let tokens: Tokens =
            serde_json::from_str(&json).context("Failed to deserialize stored tokens")?;
        debug!(store = %self.describe(), "Loaded tokens");
        Ok(Some(tokens))
    }

    /// Stores tokens, replacing any previous ones
    pub fn store(&self, tokens: &Tokens) -> Result<()> {
        let json = serde_json::to_string(tokens).context("Failed to serialize tokens")?;

        match self {
            TokenStorage::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create token directory {}", parent.display())
                    })?;
                }
                let mut file = fs::OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .mode(0o600)
                    .open(path)
                    .with_context(|| format!("Unable to cache oauth token in {}", path.display()))?;
                file.write_all(json.as_bytes())
                    .context("Failed to write token file")?;
            }
            TokenStorage::Keyring => {
                keyring_entry()?
                    .set_password(&json)
                    .context("Failed to store tokens in keyring")?;
            }
        }

        debug!(store = %self.describe(), "Stored tokens");
        Ok(())
    }

    /// Removes stored tokens; a missing entry is not an error
    pub fn clear(&self) -> Result<()> {
        match self {
            TokenStorage::File(path) => match fs::remove_file(path) {
                Ok(()) => info!(path = %path.display(), "Removed token file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!("No token file to remove")
                }
                Err(e) => {
                    return Err(anyhow::Error::new(e)
                        .context(format!("Failed to remove token file {}", path.display())))
                }
            },
            TokenStorage::Keyring => match keyring_entry()?.delete_credential() {
                Ok(()) => info!("Cleared tokens from keyring"),
                Err(keyring::Error::NoEntry) => debug!("No tokens to clear in keyring"),
                Err(e) => {
                    return Err(anyhow::Error::new(e).context("Failed to delete from keyring"))
                }
            },
        }
        Ok(())
    }
}

fn keyring_entry() -> Result<keyring::Entry> {
    keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER).context("Failed to create keyring entry")
}

// ============================================================================
// PKCEFlow
// ============================================================================

/// OAuth2 PKCE flow implementation using the `oauth2` crate
pub struct PKCEFlow {
    client: BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>,
    scopes: Vec<String>,
}

impl PKCEFlow {
    /// Creates a new PKCEFlow with the given configuration
    pub fn new(config: &OAuth2Config) -> Result<Self> {
        let client = BasicClient::new(ClientId::new(config.client_id.clone()))
            .set_client_secret(ClientSecret::new(config.client_secret.clone()))
            .set_auth_uri(AuthUrl::new(AUTH_URL.to_string()).context("Invalid authorization URL")?)
            .set_token_uri(TokenUrl::new(TOKEN_URL.to_string()).context("Invalid token URL")?)
            .set_redirect_uri(
                RedirectUrl::new(config.redirect_uri.clone()).context("Invalid redirect URI")?,
            );

        Ok(Self {
            client,
            scopes: config.scopes.clone(),
        })
    }

    /// Generates an authorization URL with a PKCE challenge
    ///
    /// Requests offline access so Google issues a refresh token.
    ///
    /// # Returns
    /// A tuple of `(authorization_url, csrf_token, pkce_verifier)`.
    pub fn generate_auth_url(&self) -> (String, CsrfToken, PkceCodeVerifier) {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent");

        for scope in &self.scopes {
            auth_request = auth_request.add_scope(Scope::new(scope.clone()));
        }

        let (auth_url, csrf_token) = auth_request.set_pkce_challenge(pkce_challenge).url();

        debug!("Generated authorization URL");
        (auth_url.to_string(), csrf_token, pkce_verifier)
    }

    /// Exchanges an authorization code for OAuth tokens
    pub async fn exchange_code(
        &self,
        code: String,
        pkce_verifier: PkceCodeVerifier,
    ) -> Result<Tokens> {
        info!("Exchanging authorization code for tokens");

        let http_client = reqwest::Client::new();
        let token_result = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(pkce_verifier)
            .request_async(&http_client)
            .await
            .context("Unable to retrieve token from web")?;

        Ok(Tokens {
            access_token: token_result.access_token().secret().to_string(),
            refresh_token: token_result.refresh_token().map(|t| t.secret().to_string()),
            expires_at: expiry_from(token_result.expires_in()),
        })
    }

    /// Obtains a new access token with a refresh token
    ///
    /// Google usually omits the refresh token from the response; the old one
    /// is carried over in that case.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<Tokens> {
        info!("Refreshing access token");

        let http_client = reqwest::Client::new();
        let token_result = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&http_client)
            .await
            .context("Failed to refresh token")?;

        Ok(Tokens {
            access_token: token_result.access_token().secret().to_string(),
            refresh_token: token_result
                .refresh_token()
                .map(|t| t.secret().to_string())
                .or_else(|| Some(refresh_token.to_string())),
            expires_at: expiry_from(token_result.expires_in()),
        })
    }
}

// ============================================================================
// LocalCallbackServer
// ============================================================================

/// Minimal HTTP server that receives the OAuth2 redirect on `127.0.0.1:8400`
pub struct LocalCallbackServer;

/// Parameters extracted from the OAuth2 callback
#[derive(Debug)]
pub struct CallbackParams {
    /// The authorization code
    pub code: String,
    /// The CSRF state parameter
    pub state: String,
}

impl LocalCallbackServer {
    /// Waits for a single redirect and returns its parameters
    pub async fn start() -> Result<CallbackParams> {
        use http_body_util::Full;
        use hyper::body::Bytes;
        use hyper::server::conn::http1;
        use hyper::service::service_fn;
        use hyper::{Request, Response, StatusCode};
        use hyper_util::rt::TokioIo;
        use tokio::net::TcpListener;
        use tokio::sync::oneshot;

        info!(addr = CALLBACK_ADDR, "Waiting for OAuth callback");

        let listener = TcpListener::bind(CALLBACK_ADDR)
            .await
            .with_context(|| format!("Failed to bind callback server to {}", CALLBACK_ADDR))?;

        let (tx, rx) = oneshot::channel::<CallbackParams>();
        let tx = std::sync::Arc::new(tokio::sync::Mutex::new(Some(tx)));

        let (stream, _addr) = listener
            .accept()
            .await
            .context("Failed to accept connection on callback server")?;

        let io = TokioIo::new(stream);

        let service = service_fn(move |req: Request<hyper::body::Incoming>| {
            let tx = tx.clone();
            async move {
                let uri = req.uri().to_string();
                debug!("Callback server received request: {}", uri);

                let (status, html) = match parse_callback_params(&uri) {
                    Some(params) => {
                        if let Some(sender) = tx.lock().await.take() {
                            let _ = sender.send(params);
                        }
                        (StatusCode::OK, success_html())
                    }
                    None => (
                        StatusCode::BAD_REQUEST,
                        error_html("Missing authorization code in callback"),
                    ),
                };

                let mut response = Response::new(Full::new(Bytes::from(html)));
                *response.status_mut() = status;
                response.headers_mut().insert(
                    hyper::header::CONTENT_TYPE,
                    hyper::header::HeaderValue::from_static("text/html; charset=utf-8"),
                );
                Ok::<_, hyper::Error>(response)
            }
        });

        tokio::spawn(async move {
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                warn!("Callback server connection error: {}", e);
            }
        });

        let params = rx
            .await
            .context("Callback server channel closed without receiving parameters")?;

        info!("Received OAuth callback with authorization code");
        Ok(params)
    }
}

/// Parses the authorization code and state from a callback URI
fn parse_callback_params(uri: &str) -> Option<CallbackParams> {
    let url = url::Url::parse(&format!("http://localhost{}", uri)).ok()?;
    let mut code = None;
    let mut state = None;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.to_string()),
            "state" => state = Some(value.to_string()),
            _ => {}
        }
    }

    Some(CallbackParams {
        code: code?,
        state: state.unwrap_or_default(),
    })
}

fn success_html() -> String {
    r#"<!DOCTYPE html>
<html>
<head><title>filesync - Authentication Successful</title></head>
<body style="font-family: sans-serif; text-align: center; padding-top: 50px;">
    <h1>Authentication Successful</h1>
    <p>filesync can now access its files on Google Drive.</p>
    <p>You can close this window.</p>
</body>
</html>"#
        .to_string()
}

fn error_html(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>filesync - Authentication Error</title></head>
<body style="font-family: sans-serif; text-align: center; padding-top: 50px;">
    <h1>Authentication Error</h1>
    <p>{}</p>
    <p>Please close this window and try again.</p>
</body>
</html>"#,
        message
    )
}

// ============================================================================
// DriveAuthAdapter
// ============================================================================

/// Orchestrates the interactive login and token reuse
///
/// 1. Generates a PKCE authorization URL
/// 2. Opens the user's browser (the URL is also printed to the log)
/// 3. Receives the redirect on the local callback server and checks its state
/// 4. Exchanges the authorization code for tokens
pub struct DriveAuthAdapter {
    config: OAuth2Config,
}

impl DriveAuthAdapter {
    /// Creates a new adapter with the given configuration
    pub fn new(config: OAuth2Config) -> Self {
        Self { config }
    }

    /// Creates an adapter from a `credentials.json` file with default settings
    pub fn from_credentials_file(path: &Path) -> Result<Self> {
        Ok(Self::new(OAuth2Config::new(ClientCredentials::load(path)?)))
    }

    /// Performs the full interactive login flow
    pub async fn login(&self) -> Result<Tokens> {
        info!("Starting OAuth2 PKCE login flow");

        let flow = PKCEFlow::new(&self.config)?;
        let (auth_url, csrf_token, pkce_verifier) = flow.generate_auth_url();

        info!(url = %auth_url, "Go to the following link in your browser");
        if let Err(e) = webbrowser::open(&auth_url) {
            warn!(error = %e, "Failed to open browser, open the link manually");
        }

        let callback = LocalCallbackServer::start().await?;
        if callback.state != *csrf_token.secret() {
            bail!("OAuth callback state does not match the authorization request");
        }

        let tokens = flow.exchange_code(callback.code, pkce_verifier).await?;
        info!("OAuth2 PKCE login completed successfully");
        Ok(tokens)
    }

    /// Refreshes an expired access token
    pub async fn refresh(&self, refresh_token: &str) -> Result<Tokens> {
        PKCEFlow::new(&self.config)?.refresh_token(refresh_token).await
    }

    /// Returns tokens that are valid for at least another minute
    ///
    /// Stored tokens close to expiry are refreshed and written back.
    pub async fn valid_tokens(&self, storage: &TokenStorage) -> Result<Tokens> {
        let tokens = storage.load()?.ok_or_else(|| {
            anyhow!("Not authenticated. Run 'filesync auth login' first")
        })?;

        if !tokens.expires_within(Duration::seconds(REFRESH_MARGIN_SECS)) {
            return Ok(tokens);
        }

        let refresh_token = tokens.refresh_token.as_deref().ok_or_else(|| {
            anyhow!("Access token expired and no refresh token is stored. Run 'filesync auth login'")
        })?;

        let refreshed = self.refresh(refresh_token).await?;
        storage.store(&refreshed)?;
        Ok(refreshed)
    }

    /// Returns a reference to the current configuration
    pub fn config(&self) -> &OAuth2Config {
        &self.config
    }
}
