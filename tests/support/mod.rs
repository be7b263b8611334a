//! Test support utilities for gpgvault integration tests.
//!
//! Two environments: [`Test`] drives the binary in a temp directory with an
//! isolated `GNUPGHOME`, [`Lab`] drives the library against the in-memory
//! backend and needs the `test-fake` feature.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fixtures;
#[cfg(feature = "test-fake")]
pub mod lab;
pub mod skip;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
#[cfg(feature = "test-fake")]
#[allow(unused_imports)]
pub use lab::*;

use tempfile::TempDir;

/// Binary test environment with isolated temp directories.
///
/// Child processes get `.current_dir()` and `GNUPGHOME` so tests can run in
/// parallel without touching the user's keyring.
pub struct Test {
    /// Vault root
    pub dir: TempDir,
    /// GnuPG home
    pub gnupg: TempDir,
}

impl Test {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let gnupg = TempDir::new().expect("failed to create temp gnupg home");
        Self { dir, gnupg }
    }

    /// A test environment whose root already holds a Vaultfile with
    /// `recipients`, written directly so no gpg is needed.
    pub fn with_vaultfile(recipients: &[(&str, &str)]) -> Self {
        let t = Self::new();
        std::fs::write(t.dir.path().join("Vaultfile"), vaultfile(recipients))
            .expect("failed to write Vaultfile");
        t
    }
}
