//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including validation failures and malformed remote data.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid local path (empty, or without a file name component)
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Invalid remote object ID format
    #[error("Invalid remote ID: {0}")]
    InvalidRemoteId(String),

    /// Invalid pagination token
    #[error("Invalid page token: {0}")]
    InvalidPageToken(String),

    /// Invalid signing key identifier
    #[error("Invalid signing key: {0}")]
    InvalidSigningKey(String),

    /// A remote modification time could not be parsed as RFC3339
    #[error("Invalid timestamp '{value}': {reason}")]
    InvalidTimestamp {
        /// The raw value reported by the remote store
        value: String,
        /// Parser error message
        reason: String,
    },

    /// The `mode` property of a remote version is not a decimal integer
    #[error("Invalid mode property: {0}")]
    InvalidMode(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
