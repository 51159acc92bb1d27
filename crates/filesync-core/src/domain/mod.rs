//! Domain entities and business logic
//!
//! This module contains the core domain types for filesync:
//! - Newtypes for remote ids, page tokens and signing keys
//! - Remote versions and their property map
//! - Cached sync metadata records
//! - The reconciliation decision and retention rules
//! - Domain-specific error types

pub mod decision;
pub mod errors;
pub mod metadata;
pub mod newtypes;
pub mod query;
pub mod retention;
pub mod version;

// Re-export commonly used types
pub use decision::{decide, grace_window, select_authoritative, Authoritative, SyncDecision};
pub use errors::DomainError;
pub use metadata::{sync_epoch, SyncMetadataRecord};
pub use newtypes::*;
pub use query::{VersionPage, VersionQuery};
pub use retention::{retention_verdict, retention_window, RetentionVerdict};
pub use version::{
    parse_remote_time, RemoteVersion, VersionProperties, DEFAULT_MODE, PROPERTY_MODE,
    PROPERTY_SIGNATURE, SIGNATURE_SUFFIX,
};
