//! Database connection pool management
//!
//! Wraps SQLx's `SqlitePool`. Opening a file-backed pool creates the parent
//! directory (`~/.bin` by default) and the schema on first use, so a fresh
//! machine needs no setup step before the first sync.

use std::path::{Path, PathBuf};
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::CacheError;

/// Pool of SQLite connections for the metadata cache
///
/// File-backed pools use WAL journaling and a 5 second busy timeout. The
/// in-memory pool is limited to one connection because every SQLite memory
/// database is private to its connection.
pub struct DatabasePool {
    pool: SqlitePool,
    path: Option<PathBuf>,
}

impl DatabasePool {
    /// Opens (or creates) the database file at `db_path` and applies the schema
    ///
    /// # Errors
    ///
    /// Returns `CacheError::ConnectionFailed` if the directory or the connection
    /// cannot be created, or `CacheError::MigrationFailed` if the schema cannot
    /// be applied.
    pub async fn new(db_path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                CacheError::ConnectionFailed(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| {
                CacheError::ConnectionFailed(format!(
                    "Failed to open metadata database {}: {}",
                    db_path.display(),
                    e
                ))
            })?;

        Self::run_migrations(&pool).await?;

        tracing::info!(path = %db_path.display(), "Metadata database opened");

        Ok(Self {
            pool,
            path: Some(db_path.to_path_buf()),
        })
    }

    /// Creates an in-memory database for tests
    ///
    /// # Errors
    ///
    /// Returns `CacheError::ConnectionFailed` or `CacheError::MigrationFailed`.
    pub async fn in_memory() -> Result<Self, CacheError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| {
                CacheError::ConnectionFailed(format!("Failed to create in-memory database: {}", e))
            })?;

        Self::run_migrations(&pool).await?;

        tracing::debug!("In-memory metadata database initialized");

        Ok(Self { pool, path: None })
    }

    /// Returns a reference to the underlying SQLite connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Path of the database file, `None` for in-memory pools
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Closes every connection, flushing the WAL
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Creates the `sync_mt` and `config_string` tables if absent
    async fn run_migrations(pool: &SqlitePool) -> Result<(), CacheError> {
        let schema = include_str!("migrations/20261017_initial.sql");
        sqlx::raw_sql(schema).execute(pool).await.map_err(|e| {
            CacheError::MigrationFailed(format!("Failed to apply metadata schema: {}", e))
        })?;

        tracing::debug!("Metadata schema ready");
        Ok(())
    }
}
