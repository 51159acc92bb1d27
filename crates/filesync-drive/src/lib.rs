//! filesync Drive - Google Drive API client
//!
//! Provides an async client for:
//! - OAuth2 authentication (Authorization Code with PKCE, loopback redirect)
//! - Listing, downloading and deleting files through the Drive v3 API
//! - Resumable uploads with custom properties and a declared modification time
//! - Resolving the sync folder by name
//!
//! ## Modules
//!
//! - [`auth`] - OAuth2 flow, client secret loading and token storage
//! - [`client`] - Drive v3 HTTP client
//! - [`query`] - `files.list` query string construction
//! - [`upload`] - Resumable upload session handling
//! - [`provider`] - `IRemoteStore` implementation

pub mod auth;
pub mod client;
pub mod provider;
pub mod query;
pub mod upload;

pub use client::DriveClient;
pub use provider::DriveRemoteStore;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when communicating with the Google Drive API
#[derive(Debug, Error)]
pub enum DriveError {
    /// Authentication credentials are invalid or expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Insufficient permissions for the requested operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The requested file does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request quota exceeded
    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    /// A server-side error occurred (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// Any other non-success status
    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body, as returned by the API
        body: String,
    },

    /// A network-level error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The API response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl DriveError {
    /// Classifies a non-success HTTP status
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => DriveError::Unauthorized(body),
            StatusCode::FORBIDDEN => DriveError::Forbidden(body),
            StatusCode::NOT_FOUND => DriveError::NotFound(body),
            StatusCode::TOO_MANY_REQUESTS => DriveError::TooManyRequests(body),
            s if s.is_server_error() => DriveError::ServerError(body),
            s => DriveError::UnexpectedStatus {
                status: s.as_u16(),
                body,
            },
        }
    }
}
