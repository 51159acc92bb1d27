//! gpg adapter for the [`ISigner`] port
//!
//! Runs the configured OpenPGP program (default `gpg2`) as a blocking child
//! process:
//!
//! - sign: `<program> --yes --sign-with <key> --detach-sig <file>`, which
//!   writes `<file>.sig`; the bytes are read back and the file removed
//! - verify: `<program> --verify <signature> <file>`; exit status 0 is a pass

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::{bail, Context, Result};
use tracing::{debug, warn};

use filesync_core::domain::{SigningKey, SIGNATURE_SUFFIX};
use filesync_core::ports::ISigner;

/// Default OpenPGP program
pub const DEFAULT_PROGRAM: &str = "gpg2";

/// [`ISigner`] backed by the gpg command line
#[derive(Debug, Clone)]
pub struct GpgSigner {
    program: String,
}

impl GpgSigner {
    /// Creates a signer that runs `program`
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The program being run
    pub fn program(&self) -> &str {
        &self.program
    }

    fn run(&self, args: &[&OsStr]) -> Result<Output> {
        Command::new(&self.program)
            .args(args)
            .output()
            .with_context(|| format!("Failed to run {}", self.program))
    }
}

impl Default for GpgSigner {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

/// Where gpg writes a detached signature for `file`
fn detached_signature_path(file: &Path) -> PathBuf {
    let mut name = file.as_os_str().to_os_string();
    name.push(SIGNATURE_SUFFIX);
    PathBuf::from(name)
}

impl ISigner for GpgSigner {
    fn sign(&self, file: &Path, key: &SigningKey) -> Result<Vec<u8>> {
        let sig_path = detached_signature_path(file);
        debug!(file = %file.display(), key = %key, "Signing");

        let output = self.run(&[
            OsStr::new("--yes"),
            OsStr::new("--sign-with"),
            OsStr::new(key.as_str()),
            OsStr::new("--detach-sig"),
            file.as_os_str(),
        ])?;

        if !output.status.success() {
            let _ = std::fs::remove_file(&sig_path);
            bail!(
                "{} failed to sign {}: {}",
                self.program,
                file.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let signature = std::fs::read(&sig_path)
            .with_context(|| format!("Failed to read signature {}", sig_path.display()))?;
        if let Err(e) = std::fs::remove_file(&sig_path) {
            warn!(path = %sig_path.display(), error = %e, "Failed to remove signature file");
        }
        Ok(signature)
    }

    fn verify(&self, signature: &Path, content: &Path) -> Result<bool> {
        let output = self.run(&[
            OsStr::new("--verify"),
            signature.as_os_str(),
            content.as_os_str(),
        ])?;

        let passed = output.status.success();
        debug!(
            signature = %signature.display(),
            passed,
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "Verified"
        );
        Ok(passed)
    }
}
