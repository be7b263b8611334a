//! The primary interface for vault operations.
//!
//! A `Vault` owns the Vaultfile and the object store for one root and wires
//! recipient changes to repair.

mod objects;
mod team;

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::core::cipher::Backend;
use crate::core::domain::{Recipient, RepairReport};
use crate::core::manifest::Manifest;
use crate::core::repair::{Repair, RepairOptions};
use crate::core::store::ObjectStore;
use crate::error::Result;

/// One vault: a root directory, its Vaultfile and its objects.
pub struct Vault {
    pub(super) manifest: Manifest,
    pub(super) store: ObjectStore,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("manifest", &self.manifest)
            .field("store", &self.store)
            .finish()
    }
}

impl Vault {
    /// Open an existing vault at `root`.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::NotInitialized` if there is no Vaultfile,
    /// or an error if it cannot be read.
    pub fn open(root: &Path, backend: Arc<dyn Backend>) -> Result<Self> {
        let store = ObjectStore::new(root, backend)?;
        let manifest = Manifest::load(store.root())?;
        Ok(Self { manifest, store })
    }

    /// Initialize a new vault at `root` with an empty Vaultfile.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::AlreadyInitialized` if a Vaultfile exists.
    pub fn init(root: &Path, backend: Arc<dyn Backend>) -> Result<Self> {
        std::fs::create_dir_all(root)?;
        let store = ObjectStore::new(root, backend)?;
        let manifest = Manifest::create(store.root())?;
        info!(root = %store.root().display(), "initialized vault");
        Ok(Self { manifest, store })
    }

    /// Canonical vault root.
    pub fn root(&self) -> &Path {
        self.store.root()
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn backend(&self) -> &dyn Backend {
        self.store.backend()
    }

    /// Current recipients, in Vaultfile order.
    pub fn recipients(&self) -> &[Recipient] {
        self.manifest.recipients()
    }

    /// Re-encrypt every object for the current recipients.
    ///
    /// Per-object failures are in the report; call
    /// [`RepairReport::into_result`] to turn them into an error.
    pub fn repair(&self, options: &RepairOptions) -> Result<RepairReport> {
        Repair::with_options(&self.store, options.clone()).run(self.manifest.recipients())
    }
}
