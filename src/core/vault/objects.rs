//! Object operations.

use std::path::{Path, PathBuf};

use zeroize::Zeroizing;

use super::Vault;
use crate::core::domain::PlaintextSource;
use crate::error::{ManifestError, Result};

impl Vault {
    /// Encrypt `source` to `logical` for the current recipients.
    ///
    /// Only this object is written; the rest of the vault is not touched.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::NoRecipients` if the Vaultfile is empty,
    /// `StoreError::PathTraversal` if `logical` leaves the root.
    pub fn set(&self, logical: &str, source: &PlaintextSource) -> Result<PathBuf> {
        if self.manifest.is_empty() {
            return Err(ManifestError::NoRecipients.into());
        }
        self.store.put(logical, source, self.manifest.recipients())
    }

    /// Decrypt `logical` into memory.
    pub fn get(&self, logical: &str) -> Result<Zeroizing<Vec<u8>>> {
        self.store.get(logical)
    }

    /// Decrypt `logical` into `dest`.
    pub fn get_to_file(&self, logical: &str, dest: &Path) -> Result<()> {
        self.store.get_to_file(logical, dest)
    }

    /// Logical names of every object, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .list_all()?
            .iter()
            .filter_map(|p| self.store.logical(p))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cipher::{Fake, FakeKey};
    use crate::core::repair::RepairOptions;
    use crate::error::{Error, StoreError};
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    const BOB: &str = "B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0";

    fn vault(tmp: &TempDir) -> (Arc<Fake>, Vault) {
        let fake = Arc::new(Fake::new().with_key(FakeKey::secret(BOB, "bob@example.com")));
        let mut vault = Vault::init(tmp.path(), fake.clone()).unwrap();
        vault.add_owner(&RepairOptions::default()).unwrap();
        (fake, vault)
    }

    #[test]
    fn test_set_get() {
        let tmp = TempDir::new().unwrap();
        let (_fake, vault) = vault(&tmp);

        let path = vault
            .set("db/password", &PlaintextSource::from_arg("hunter2"))
            .unwrap();
        assert!(path.ends_with("db/password.asc"));
        assert_eq!(vault.get("db/password").unwrap().as_slice(), b"hunter2");
        assert_eq!(vault.get("db/password.asc").unwrap().as_slice(), b"hunter2");
    }

    #[test]
    fn test_set_from_file() {
        let tmp = TempDir::new().unwrap();
        let (_fake, vault) = vault(&tmp);
        let input = tmp.path().join("plain.txt");
        fs::write(&input, "from a file").unwrap();

        vault
            .set("copy", &PlaintextSource::File(input))
            .unwrap();
        let out = tmp.path().join("out").join("copy.txt");
        vault.get_to_file("copy", &out).unwrap();
        assert_eq!(fs::read_to_string(out).unwrap(), "from a file");
    }

    #[test]
    fn test_set_touches_only_its_object() {
        let tmp = TempDir::new().unwrap();
        let (fake, vault) = vault(&tmp);
        vault.set("a", &PlaintextSource::from_arg("1")).unwrap();
        let before = fs::read(tmp.path().join("a.asc")).unwrap();

        vault.set("b", &PlaintextSource::from_arg("2")).unwrap();
        assert_eq!(fs::read(tmp.path().join("a.asc")).unwrap(), before);
        assert!(fake.calls().iter().all(|c| !c.starts_with("decrypt")));
    }

    #[test]
    fn test_set_without_recipients() {
        let tmp = TempDir::new().unwrap();
        let fake = Arc::new(Fake::new());
        let vault = Vault::init(tmp.path(), fake).unwrap();
        let err = vault.set("x", &PlaintextSource::from_arg("v")).unwrap_err();
        assert!(matches!(err, Error::Manifest(ManifestError::NoRecipients)));
    }

    #[test]
    fn test_set_rejects_traversal() {
        let tmp = TempDir::new().unwrap();
        let (_fake, vault) = vault(&tmp);
        let err = vault
            .set("../outside", &PlaintextSource::from_arg("v"))
            .unwrap_err();
        assert!(matches!(err, Error::Store(StoreError::PathTraversal(_))));
    }

    #[test]
    fn test_get_missing() {
        let tmp = TempDir::new().unwrap();
        let (_fake, vault) = vault(&tmp);
        let err = vault.get("nope").unwrap_err();
        assert!(matches!(err, Error::Store(StoreError::NotFound(_))));
    }

    #[test]
    fn test_list_sorted_logical_names() {
        let tmp = TempDir::new().unwrap();
        let (_fake, vault) = vault(&tmp);
        for name in ["zeta", "alpha", "nested/beta"] {
            vault.set(name, &PlaintextSource::from_arg(name)).unwrap();
        }
        fs::write(tmp.path().join("README.md"), "not an object").unwrap();

        assert_eq!(vault.list().unwrap(), vec!["alpha", "nested/beta", "zeta"]);
    }
}
