//! filesync Cache - Local sync metadata persistence
//!
//! SQLite-based cache for:
//! - The last synced remote and local mtimes of every file
//! - Operator settings (sync folder, signing key)
//!
//! ## Architecture
//!
//! This crate implements the `IMetadataStore` and `IConfigStore` ports from
//! `filesync-core` using SQLite as the storage backend. It is a driven
//! (secondary) adapter in the hexagonal architecture.
//!
//! ## Key Components
//!
//! - [`DatabasePool`] - Connection pool with migration support
//! - [`SqliteMetadataStore`] - Implementation of both store ports
//! - [`CacheError`] - Error types for cache operations
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use filesync_cache::{DatabasePool, SqliteMetadataStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = DatabasePool::new(Path::new("/home/user/.bin/sync.sqlite3")).await?;
//! let store = SqliteMetadataStore::new(pool.pool().clone());
//! // Use store as IMetadataStore and IConfigStore...
//! # Ok(())
//! # }
//! ```

pub mod pool;
pub mod store;

pub use pool::DatabasePool;
pub use store::SqliteMetadataStore;

/// Errors that can occur during cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Failed to establish a database connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A database query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A stored value could not be decoded
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A path that cannot be stored as a UTF-8 key
    #[error("Path is not valid UTF-8: {}", .0.display())]
    InvalidPath(std::path::PathBuf),

    /// An upsert did not affect exactly one row
    #[error("Expected 1 row affected in {table} for '{key}', got {affected}")]
    UnexpectedRowCount {
        /// Table written to
        table: &'static str,
        /// Primary key of the write
        key: String,
        /// Rows reported by SQLite
        affected: u64,
    },
}

impl From<sqlx::Error> for CacheError {
    fn from(e: sqlx::Error) -> Self {
        CacheError::QueryFailed(e.to_string())
    }
}
