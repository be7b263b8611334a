//! Library fixtures on the in-memory backend.

use std::path::Path;
use std::sync::Arc;

use gpgvault::core::cipher::{Fake, FakeKey};
use gpgvault::core::domain::{PlaintextSource, TrustLevel};
use gpgvault::core::repair::RepairOptions;
use gpgvault::core::types::Fingerprint;
use gpgvault::core::Vault;
use tempfile::TempDir;

use super::fixtures::{ALICE, BOB, CAROL, MALLORY, STANDARD_OBJECTS};

/// Library test environment: a vault on disk backed by [`Fake`].
///
/// Bob owns the keyring (secret key); Alice and Carol are fully trusted
/// public keys; Mallory is only marginally trusted.
pub struct Lab {
    pub dir: TempDir,
    pub fake: Arc<Fake>,
    pub vault: Vault,
}

impl Lab {
    /// A vault with Bob as the only recipient.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let fake = Arc::new(
            Fake::new()
                .with_key(FakeKey::secret(BOB, "bob@example.com"))
                .with_key(FakeKey::public(ALICE, "alice@example.com", TrustLevel::Full))
                .with_key(FakeKey::public(CAROL, "carol@example.com", TrustLevel::Ultimate))
                .with_key(FakeKey::public(MALLORY, "mallory@example.com", TrustLevel::Marginal)),
        );
        let mut vault = Vault::init(dir.path(), fake.clone()).expect("failed to init vault");
        vault
            .add_owner(&RepairOptions::default())
            .expect("failed to add owner");
        Self { dir, fake, vault }
    }

    /// A vault with Bob and [`STANDARD_OBJECTS`].
    pub fn with_objects() -> Self {
        let lab = Self::new();
        for (path, value) in STANDARD_OBJECTS {
            lab.vault
                .set(path, &PlaintextSource::from_arg(value))
                .expect("failed to set object");
        }
        lab
    }

    pub fn object(&self, logical: &str) -> std::path::PathBuf {
        self.vault.store().resolve(logical).expect("valid object path")
    }

    pub fn options(workers: usize) -> RepairOptions {
        RepairOptions {
            workers,
            ..RepairOptions::default()
        }
    }
}

/// Assert an object was encrypted for exactly `expected`, in order.
pub fn assert_encrypted_for(fake: &Fake, object: &Path, expected: &[&str]) {
    let actual = fake
        .recipients_of(object)
        .unwrap_or_else(|e| panic!("{} is not a readable object: {}", object.display(), e));
    let expected: Vec<Fingerprint> = expected
        .iter()
        .map(|f| Fingerprint::parse(f).expect("valid fingerprint"))
        .collect();
    assert_eq!(actual, expected, "recipients of {}", object.display());
}
