//! Signer port (driven/secondary port)
//!
//! Wraps an external detached-signature tool. The contract is a blocking
//! command: inputs are files on disk and success is signalled by exit status.
//!
//! ## Design Notes
//!
//! - The trait is synchronous. Async callers run it on the
//!   blocking thread pool (`tokio::task::spawn_blocking`).

use std::path::Path;

use crate::domain::newtypes::SigningKey;

/// Port trait for producing and checking detached signatures
pub trait ISigner: Send + Sync {
    /// Produces a detached signature for `file` with `key`
    ///
    /// # Returns
    /// The signature bytes. Any intermediate file the tool writes is removed.
    fn sign(&self, file: &Path, key: &SigningKey) -> anyhow::Result<Vec<u8>>;

    /// Checks a detached signature against content
    ///
    /// # Returns
    /// `Ok(true)` if the signature is valid, `Ok(false)` if the tool rejected it.
    /// `Err` if the tool could not be run at all.
    fn verify(&self, signature: &Path, content: &Path) -> anyhow::Result<bool>;
}
