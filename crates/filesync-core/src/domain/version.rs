//! Remote version domain entities
//!
//! A [`RemoteVersion`] is one concrete copy of a logical file stored in the
//! remote store. Several versions may share the same name inside a folder;
//! the engine reconciles them instead of relying on remote uniqueness.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::RemoteId;

/// Property holding the POSIX permission bits as a decimal string
pub const PROPERTY_MODE: &str = "mode";

/// Property holding the remote id of the detached signature object
pub const PROPERTY_SIGNATURE: &str = "gpg";

/// Permission bits applied when a version carries no `mode` property
pub const DEFAULT_MODE: u32 = 0o600;

/// Suffix appended to a file name to form its signature object name
pub const SIGNATURE_SUFFIX: &str = ".sig";

/// Parse an RFC3339 timestamp reported by the remote store
///
/// # Errors
/// Returns [`DomainError::InvalidTimestamp`] if the value is not RFC3339
pub fn parse_remote_time(value: &str) -> Result<DateTime<Utc>, DomainError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DomainError::InvalidTimestamp {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// One stored copy of a logical file
///
/// The modification time is kept as the raw string reported by the store so
/// that a malformed value surfaces as an error at the moment it is used for
/// ordering, rather than being dropped while listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteVersion {
    /// Remote object id
    id: RemoteId,
    /// Object name (the local base name)
    name: String,
    /// Modification time as reported by the store (RFC3339)
    modified: String,
    /// Flat property map attached at creation
    properties: HashMap<String, String>,
}

impl RemoteVersion {
    /// Creates a new RemoteVersion with an empty property map
    ///
    /// # Arguments
    ///
    /// * `id` - The remote object id
    /// * `name` - The object name
    /// * `modified` - The modification timestamp as reported by the store
    pub fn new(id: RemoteId, name: impl Into<String>, modified: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            modified: modified.into(),
            properties: HashMap::new(),
        }
    }

    /// Replaces the property map
    pub fn with_properties(mut self, properties: HashMap<String, String>) -> Self {
        self.properties = properties;
        self
    }

    /// Sets a single property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Returns the remote object id
    pub fn id(&self) -> &RemoteId {
        &self.id
    }

    /// Returns the object name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the raw modification timestamp
    pub fn modified_raw(&self) -> &str {
        &self.modified
    }

    /// Returns the property map
    pub fn properties(&self) -> &HashMap<String, String> {
        &self.properties
    }

    /// Parses the modification timestamp
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidTimestamp`] if the store reported a
    /// value that is not RFC3339
    pub fn modified_time(&self) -> Result<DateTime<Utc>, DomainError> {
        parse_remote_time(&self.modified)
    }

    /// Returns the permission bits recorded at upload, if any
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidMode`] if the property is present but is
    /// not a decimal integer
    pub fn mode(&self) -> Result<Option<u32>, DomainError> {
        match self.properties.get(PROPERTY_MODE) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<u32>()
                .map(Some)
                .map_err(|_| DomainError::InvalidMode(raw.clone())),
        }
    }

    /// Returns the permission bits to restore on download
    ///
    /// Falls back to [`DEFAULT_MODE`] when the version carries no `mode`.
    ///
    /// # Errors
    /// Propagates [`RemoteVersion::mode`] parse failures
    pub fn effective_mode(&self) -> Result<u32, DomainError> {
        Ok(self.mode()?.unwrap_or(DEFAULT_MODE) & 0o7777)
    }

    /// Returns the id of the detached signature object, if the version is signed
    pub fn signature_id(&self) -> Option<&str> {
        self.properties
            .get(PROPERTY_SIGNATURE)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Properties attached to a version when it is created
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VersionProperties {
    /// Permission bits of the local file
    pub mode: u32,
    /// Remote id of the uploaded signature object
    pub signature: Option<RemoteId>,
}

impl VersionProperties {
    /// Creates properties for an unsigned upload
    pub fn new(mode: u32) -> Self {
        Self {
            mode,
            signature: None,
        }
    }

    /// Attaches a signature id
    pub fn with_signature(mut self, signature: RemoteId) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Converts into the flat map stored alongside the object
    pub fn into_map(self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert(PROPERTY_MODE.to_string(), self.mode.to_string());
        if let Some(sig) = self.signature {
            map.insert(PROPERTY_SIGNATURE.to_string(), sig.into());
        }
        map
    }
}
