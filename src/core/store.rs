//! Object store.
//!
//! Maps logical paths to `.asc` files under the vault root. The root is the
//! trust boundary for "things encrypted under this Vaultfile", so every path
//! is confined to it, including through symlinks.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};
use walkdir::WalkDir;
use zeroize::Zeroizing;

use crate::core::cipher::Backend;
use crate::core::constants::{OBJECT_EXTENSION, TEMP_SUFFIX};
use crate::core::domain::{PlaintextSource, Recipient};
use crate::error::{Error, Result, StoreError};

/// Encrypted objects under one vault root.
pub struct ObjectStore {
    root: PathBuf,
    backend: Arc<dyn Backend>,
}

impl std::fmt::Debug for ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStore")
            .field("root", &self.root)
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl ObjectStore {
    /// Open a store rooted at `root`, which must exist.
    pub fn new(root: &Path, backend: Arc<dyn Backend>) -> Result<Self> {
        let root = root.canonicalize()?;
        Ok(Self { root, backend })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Absolute object path for `logical`.
    ///
    /// # Errors
    ///
    /// - `StoreError::EmptyPath` for an empty path.
    /// - `StoreError::PathTraversal` if the path, lexically or through an
    ///   existing symlink, leaves the vault root.
    pub fn resolve(&self, logical: &str) -> Result<PathBuf> {
        if logical.trim().is_empty() {
            return Err(StoreError::EmptyPath.into());
        }

        let candidate = Path::new(logical);
        let joined = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        };

        let normalized = normalize(&joined).ok_or_else(|| traversal(logical))?;
        if normalized == self.root || !normalized.starts_with(&self.root) {
            return Err(traversal(logical));
        }

        let path = with_object_extension(normalized);

        // The deepest existing ancestor must also canonicalize inside root.
        let mut ancestor = path.as_path();
        while !ancestor.exists() {
            ancestor = match ancestor.parent() {
                Some(parent) => parent,
                None => return Err(traversal(logical)),
            };
        }
        if !ancestor.canonicalize()?.starts_with(&self.root) {
            return Err(traversal(logical));
        }

        Ok(path)
    }

    /// Encrypt `source` for `recipients` at `logical`.
    ///
    /// The ciphertext is staged next to the target and renamed into place,
    /// so an existing object is only replaced by a complete one.
    pub fn put(
        &self,
        logical: &str,
        source: &PlaintextSource,
        recipients: &[Recipient],
    ) -> Result<PathBuf> {
        let path = self.resolve(logical)?;
        let staging = staging_path(&path);
        info!(path = %path.display(), recipients = recipients.len(), "writing object");

        if let Err(e) = self.backend.encrypt_to_file(&staging, recipients, source) {
            discard(&staging);
            return Err(e);
        }
        if let Err(e) = fs::rename(&staging, &path) {
            discard(&staging);
            return Err(e.into());
        }
        Ok(path)
    }

    /// Decrypt the object at `logical` into memory.
    pub fn get(&self, logical: &str) -> Result<Zeroizing<Vec<u8>>> {
        let path = self.existing(logical)?;
        self.backend.decrypt_to_bytes(&path)
    }

    /// Decrypt the object at `logical` into `dest`.
    pub fn get_to_file(&self, logical: &str, dest: &Path) -> Result<()> {
        let path = self.existing(logical)?;
        self.backend.decrypt_to_file(dest, &path)
    }

    /// Every object under the root, depth-first, sorted.
    ///
    /// `.git` directories are skipped; staging files never match because
    /// they end in the temp suffix.
    pub fn list_all(&self) -> Result<Vec<PathBuf>> {
        let mut objects = Vec::new();
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || e.file_name() != ".git");

        for entry in walker {
            let entry = entry.map_err(|e| Error::Io(e.into()))?;
            if entry.file_type().is_file() && is_object(entry.path()) {
                objects.push(entry.into_path());
            }
        }
        objects.sort();

        debug!(count = objects.len(), "listed objects");
        Ok(objects)
    }

    /// Logical name of an object path: relative to root, extension dropped.
    pub fn logical(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let text = relative.to_string_lossy();
        let suffix = format!(".{}", OBJECT_EXTENSION);
        Some(text.strip_suffix(&suffix).unwrap_or(&text).to_string())
    }

    fn existing(&self, logical: &str) -> Result<PathBuf> {
        let path = self.resolve(logical)?;
        if !path.is_file() {
            return Err(StoreError::NotFound(logical.to_string()).into());
        }
        Ok(path)
    }
}

/// Where a replacement for `path` is written before it is promoted.
pub(crate) fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}{}", name, TEMP_SUFFIX))
}

/// Best-effort removal of an abandoned staging file.
pub(crate) fn discard(staging: &Path) {
    if staging.exists() {
        if let Err(e) = fs::remove_file(staging) {
            debug!(path = %staging.display(), error = %e, "could not remove staging file");
        }
    }
}

fn is_object(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(OBJECT_EXTENSION)
}

fn with_object_extension(path: PathBuf) -> PathBuf {
    if is_object(&path) {
        return path;
    }
    let mut raw = path.into_os_string();
    raw.push(".");
    raw.push(OBJECT_EXTENSION);
    PathBuf::from(raw)
}

/// Lexically resolve `.` and `..`; `None` if `..` climbs past the top.
fn normalize(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() || out.as_os_str().is_empty() {
                    return None;
                }
            }
            Component::Normal(part) => out.push(part),
        }
    }
    Some(out)
}

fn traversal(logical: &str) -> Error {
    StoreError::PathTraversal(logical.to_string()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cipher::{Fake, FakeKey};
    use crate::core::types::Fingerprint;
    use tempfile::TempDir;

    const BOB: &str = "B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0";

    fn setup() -> (TempDir, Arc<Fake>, ObjectStore) {
        let tmp = TempDir::new().unwrap();
        let fake = Arc::new(Fake::new().with_key(FakeKey::secret(BOB, "bob")));
        let store = ObjectStore::new(tmp.path(), fake.clone()).unwrap();
        (tmp, fake, store)
    }

    fn bob() -> Recipient {
        Recipient::new("bob", Fingerprint::parse(BOB).unwrap())
    }

    fn is_traversal(result: Result<PathBuf>) -> bool {
        matches!(result, Err(Error::Store(StoreError::PathTraversal(_))))
    }

    #[test]
    fn test_resolve_appends_extension_once() {
        let (_tmp, _fake, store) = setup();
        assert_eq!(store.resolve("notes").unwrap(), store.root().join("notes.asc"));
        assert_eq!(store.resolve("notes.asc").unwrap(), store.root().join("notes.asc"));
        assert_eq!(
            store.resolve("certs/server.pem").unwrap(),
            store.root().join("certs/server.pem.asc")
        );
    }

    #[test]
    fn test_resolve_allows_inner_dotdot() {
        let (_tmp, _fake, store) = setup();
        assert_eq!(store.resolve("a/../b").unwrap(), store.root().join("b.asc"));
    }

    #[test]
    fn test_resolve_rejects_escape() {
        let (_tmp, _fake, store) = setup();
        assert!(is_traversal(store.resolve("../outside")));
        assert!(is_traversal(store.resolve("a/../../outside")));
        assert!(is_traversal(store.resolve("/etc/passwd")));
        assert!(is_traversal(store.resolve(".")));
    }

    #[test]
    fn test_resolve_accepts_absolute_inside_root() {
        let (_tmp, _fake, store) = setup();
        let inside = store.root().join("x");
        assert_eq!(
            store.resolve(&inside.to_string_lossy()).unwrap(),
            store.root().join("x.asc")
        );
    }

    #[test]
    fn test_resolve_rejects_empty() {
        let (_tmp, _fake, store) = setup();
        assert!(matches!(
            store.resolve("  "),
            Err(Error::Store(StoreError::EmptyPath))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_rejects_symlink_escape() {
        let (tmp, _fake, store) = setup();
        let outside = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path(), tmp.path().join("link")).unwrap();
        assert!(is_traversal(store.resolve("link/secret")));
    }

    #[test]
    fn test_put_get_roundtrip() {
        let (_tmp, _fake, store) = setup();
        let path = store
            .put("db/password", &PlaintextSource::from_arg("hunter2"), &[bob()])
            .unwrap();
        assert!(path.ends_with("db/password.asc"));
        assert!(!staging_path(&path).exists());
        assert_eq!(store.get("db/password").unwrap().as_slice(), b"hunter2");
    }

    #[test]
    fn test_put_from_file() {
        let (tmp, _fake, store) = setup();
        let outside = TempDir::new().unwrap();
        let input = outside.path().join("server.pem");
        fs::write(&input, "-----BEGIN CERT-----").unwrap();

        store
            .put("server.pem", &PlaintextSource::File(input), &[bob()])
            .unwrap();
        assert!(tmp.path().join("server.pem.asc").exists());
        assert_eq!(store.get("server.pem").unwrap().as_slice(), b"-----BEGIN CERT-----");
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_rename_removes_staging_file() {
        let (tmp, _fake, store) = setup();
        let blocked = tmp.path().join("k.asc");
        fs::create_dir(&blocked).unwrap();
        fs::write(blocked.join("inside"), "x").unwrap();

        assert!(store.put("k", &PlaintextSource::from_arg("v"), &[bob()]).is_err());
        assert!(!staging_path(&blocked).exists());
        assert!(blocked.is_dir());
    }

    #[test]
    fn test_failed_put_keeps_previous_object() {
        let (_tmp, fake, store) = setup();
        store.put("k", &PlaintextSource::from_arg("v1"), &[bob()]).unwrap();

        fake.fail(crate::core::cipher::FakeOp::Encrypt, "k.asc");
        assert!(store.put("k", &PlaintextSource::from_arg("v2"), &[bob()]).is_err());
        fake.heal();

        assert_eq!(store.get("k").unwrap().as_slice(), b"v1");
        assert!(!staging_path(&store.resolve("k").unwrap()).exists());
    }

    #[test]
    fn test_traversal_writes_nothing() {
        let (_tmp, fake, store) = setup();
        let err = store.put("../../escape", &PlaintextSource::from_arg("x"), &[bob()]);
        assert!(is_traversal(err));
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn test_get_missing() {
        let (_tmp, _fake, store) = setup();
        assert!(matches!(
            store.get("nope"),
            Err(Error::Store(StoreError::NotFound(_)))
        ));
    }

    #[test]
    fn test_get_to_file() {
        let (tmp, _fake, store) = setup();
        store.put("k", &PlaintextSource::from_arg("plain"), &[bob()]).unwrap();
        let dest = tmp.path().join("out/plain.txt");
        store.get_to_file("k", &dest).unwrap();
        assert_eq!(fs::read_to_string(dest).unwrap(), "plain");
    }

    #[test]
    fn test_list_all_sorted_and_filtered() {
        let (tmp, _fake, store) = setup();
        for name in ["zeta", "alpha", "nested/deep/beta", ".hidden"] {
            store.put(name, &PlaintextSource::from_arg("x"), &[bob()]).unwrap();
        }
        fs::write(tmp.path().join("plain.txt"), "ignored").unwrap();
        fs::write(tmp.path().join(".alpha.asc.tmp"), "staging").unwrap();
        fs::create_dir_all(tmp.path().join(".git")).unwrap();
        fs::write(tmp.path().join(".git/packed.asc"), "ignored").unwrap();

        let names: Vec<String> = store
            .list_all()
            .unwrap()
            .iter()
            .filter_map(|p| store.logical(p))
            .collect();
        assert_eq!(names, vec![".hidden", "alpha", "nested/deep/beta", "zeta"]);
    }
}
