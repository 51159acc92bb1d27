//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRemoteStore`] - Remote object store (Google Drive)
//! - [`IMetadataStore`] - Per-path cache of the last synced mtimes
//! - [`IConfigStore`] - Persisted operator settings
//! - [`ISigner`] - External detached-signature tool

pub mod config_store;
pub mod metadata_store;
pub mod remote_store;
pub mod signer;

pub use config_store::IConfigStore;
pub use metadata_store::IMetadataStore;
pub use remote_store::{IRemoteStore, NewRemoteObject};
pub use signer::ISigner;
