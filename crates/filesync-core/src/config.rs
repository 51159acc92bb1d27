//! Configuration module for filesync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.
//!
//! Operator choices that change from run to run (sync folder, signing key) are
//! not part of this file; they live in the config store next to the metadata
//! cache.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for filesync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub drive: DriveConfig,
    pub signing: SigningConfig,
    pub archive: ArchiveConfig,
    pub logging: LoggingConfig,
}

/// Metadata database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file holding the sync metadata and config store tables.
    pub path: PathBuf,
}

/// How OAuth tokens are persisted between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStoreKind {
    /// JSON file with owner-only permissions.
    #[default]
    File,
    /// System keyring (Secret Service).
    Keyring,
}

impl std::fmt::Display for TokenStoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenStoreKind::File => write!(f, "file"),
            TokenStoreKind::Keyring => write!(f, "keyring"),
        }
    }
}

/// Authentication / OAuth settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Google OAuth client secret JSON. `None` resolves `credentials.json`
    /// next to the executable, then in the working directory.
    pub credentials_file: Option<PathBuf>,
    /// Token file used when `token_store` is `file`. `None` resolves
    /// `token.json` the same way as the credentials file.
    pub token_file: Option<PathBuf>,
    /// Where tokens are persisted.
    pub token_store: TokenStoreKind,
}

/// Google Drive API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Number of objects requested per listing page.
    pub page_size: u32,
}

/// Detached signature settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    /// gpg-compatible program used to sign and verify.
    pub program: String,
}

/// Settings for `filesync archive`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Directory whose files are uploaded and then removed.
    pub source_dir: PathBuf,
    /// Remote folder receiving the archived files.
    pub folder: String,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/filesync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("filesync")
            .join("config.yaml")
    }
}

impl AuthConfig {
    /// Resolved path of the OAuth client secret file.
    pub fn credentials_path(&self) -> PathBuf {
        self.credentials_file
            .clone()
            .unwrap_or_else(|| beside_executable("credentials.json"))
    }

    /// Resolved path of the token file.
    pub fn token_path(&self) -> PathBuf {
        self.token_file
            .clone()
            .unwrap_or_else(|| beside_executable("token.json"))
    }
}

/// `file_name` in the executable's directory if it exists there, otherwise
/// `file_name` relative to the working directory.
pub fn beside_executable(file_name: &str) -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(file_name)))
        .filter(|candidate| candidate.exists())
        .unwrap_or_else(|| PathBuf::from(file_name))
}

// ---------------------------------------------------------------------------
// Config::default()
// ---------------------------------------------------------------------------

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("~"))
                .join(".bin")
                .join("sync.sqlite3"),
        }
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self { page_size: 10 }
    }
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            program: "gpg2".to_string(),
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            source_dir: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("~"))
                .join("Music")
                .join("youtube"),
            folder: "youtube".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"drive.page_size"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Largest page size the Drive API accepts for `files.list`.
const MAX_PAGE_SIZE: u32 = 1000;

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- database ---
        if self.database.path.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "database.path".into(),
                message: "must not be empty".into(),
            });
        }

        // --- auth ---
        if let Some(path) = &self.auth.credentials_file {
            if !path.exists() {
                errors.push(ValidationError {
                    field: "auth.credentials_file".into(),
                    message: format!("file does not exist: {}", path.display()),
                });
            }
        }

        // --- drive ---
        if self.drive.page_size == 0 || self.drive.page_size > MAX_PAGE_SIZE {
            errors.push(ValidationError {
                field: "drive.page_size".into(),
                message: format!("must be in range 1..={MAX_PAGE_SIZE}"),
            });
        }

        // --- signing ---
        if self.signing.program.trim().is_empty() {
            errors.push(ValidationError {
                field: "signing.program".into(),
                message: "must not be empty".into(),
            });
        }

        // --- archive ---
        if self.archive.folder.trim().is_empty() {
            errors.push(ValidationError {
                field: "archive.folder".into(),
                message: "must not be empty".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use filesync_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .database_path(PathBuf::from("/tmp/sync.sqlite3"))
///     .drive_page_size(50)
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn database_path(mut self, path: PathBuf) -> Self {
        self.config.database.path = path;
        self
    }

    pub fn auth_credentials_file(mut self, path: PathBuf) -> Self {
        self.config.auth.credentials_file = Some(path);
        self
    }

    pub fn auth_token_file(mut self, path: PathBuf) -> Self {
        self.config.auth.token_file = Some(path);
        self
    }

    pub fn auth_token_store(mut self, kind: TokenStoreKind) -> Self {
        self.config.auth.token_store = kind;
        self
    }

    pub fn drive_page_size(mut self, n: u32) -> Self {
        self.config.drive.page_size = n;
        self
    }

    pub fn signing_program(mut self, program: impl Into<String>) -> Self {
        self.config.signing.program = program.into();
        self
    }

    pub fn archive_source_dir(mut self, dir: PathBuf) -> Self {
        self.config.archive.source_dir = dir;
        self
    }

    pub fn archive_folder(mut self, folder: impl Into<String>) -> Self {
        self.config.archive.folder = folder.into();
        self
    }

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
