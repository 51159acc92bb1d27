//! filesync Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `RemoteVersion`, `SyncMetadataRecord`, `VersionQuery`
//! - **Decision rules** - authoritative version selection, the transfer
//!   decision with its grace window, and the retention verdict used by pruning
//! - **Port definitions** - Traits for adapters: `IRemoteStore`, `IMetadataStore`,
//!   `IConfigStore`, `ISigner`
//! - **Configuration** - the YAML configuration file
//!
//! # Architecture
//!
//! The domain module contains pure rules with no I/O. Ports define trait
//! interfaces that adapter crates implement (`filesync-cache`, `filesync-drive`,
//! `filesync-sync`). The engine in `filesync-sync` orchestrates the domain
//! rules through these ports.

pub mod config;
pub mod domain;
pub mod ports;
