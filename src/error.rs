//! Error types.
//!
//! One top-level [`Error`] wraps a focused enum per component so callers
//! can match on the failure class (manifest state, keyring trust, backend
//! subprocess, path confinement, repair) without string inspection.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::domain::{RepairFailure, TrustLevel};

/// Top-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Keyring(#[from] KeyringError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Repair(#[from] RepairError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Vaultfile state and persistence errors.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("not initialized: no Vaultfile in {0}")]
    NotInitialized(PathBuf),

    #[error("already initialized: {0} exists")]
    AlreadyInitialized(PathBuf),

    #[error("failed to read Vaultfile: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse Vaultfile: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("failed to serialize Vaultfile: {0}")]
    Serialize(#[source] toml::ser::Error),

    #[error("duplicate recipient in Vaultfile: {0}")]
    Duplicate(String),

    #[error("Vaultfile has no recipients")]
    NoRecipients,

    #[error("recipient not found: {0}")]
    RecipientNotFound(String),
}

/// Keyring trust preconditions.
#[derive(Error, Debug)]
pub enum KeyringError {
    #[error("key {fingerprint} is not trusted (trust: {trust}); only full or ultimate trust is accepted")]
    UntrustedKey {
        fingerprint: String,
        trust: TrustLevel,
    },

    #[error("could not resolve key {key}: {reason}")]
    KeyResolutionFailure { key: String, reason: String },

    #[error("no secret key in the local keyring")]
    NoSecretKey,

    #[error("invalid fingerprint '{0}': expected 16-64 hex digits")]
    InvalidFingerprint(String),
}

/// Crypto backend (subprocess) failures.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("gpg not found on PATH. Install GnuPG from https://gnupg.org/download/")]
    NotInstalled,

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    Exited {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("backend io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed backend output: {0}")]
    Malformed(String),
}

/// Object store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("path escapes the vault root: {0}")]
    PathTraversal(String),

    #[error("empty object path")]
    EmptyPath,

    #[error("object not found: {0}")]
    NotFound(String),
}

/// Repair run errors.
#[derive(Error, Debug)]
pub enum RepairError {
    #[error("repair left {} object(s) unresolved:\n{}", failures.len(), format_failures(failures))]
    PartialFailure { failures: Vec<RepairFailure> },
}

fn format_failures(failures: &[RepairFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("  {}: {}", f.path.display(), f.error))
        .collect::<Vec<_>>()
        .join("\n")
}

pub type Result<T> = std::result::Result<T, Error>;
