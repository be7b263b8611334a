//! Crypto backend adapter.
//!
//! The vault never performs cryptography itself. It drives an external
//! asymmetric-encryption tool through the [`Backend`] trait, which is passed
//! explicitly to the registry, store and repair engine.
//!
//! ## Backends
//!
//! - **gpg**: GnuPG via the `gpg` CLI ([`Gpg`]).
//! - **fake**: in-memory keyring that records every invocation (`Fake`),
//!   used as a test double. Only built for tests or with `test-fake`.
//!
//! ## Adding a New Backend
//!
//! 1. Implement the `Backend` trait
//! 2. Decode the tool's key listing into [`KeyRecord`]s inside the adapter
//! 3. Re-export from this module

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;
use std::thread;

use tracing::trace;
use zeroize::Zeroizing;

use crate::core::domain::{KeyRecord, PlaintextSource, Recipient};
use crate::core::types::Fingerprint;
use crate::error::{BackendError, Error, Result};

#[cfg(any(test, feature = "test-fake"))]
mod fake;
mod gpg;
pub mod pipe;

#[cfg(any(test, feature = "test-fake"))]
pub use fake::{Fake, FakeKey, FakeOp};
pub use gpg::{parse_colons, Gpg, GpgConfig};

/// Asymmetric-encryption backend.
///
/// Operations that write a file create the parent directory first and
/// remove their output again if they fail.
pub trait Backend: Send + Sync {
    /// Encrypt `source` for `recipients` into `dest`.
    fn encrypt_to_file(
        &self,
        dest: &Path,
        recipients: &[Recipient],
        source: &PlaintextSource,
    ) -> Result<()>;

    /// Decrypt `src` into memory.
    fn decrypt_to_bytes(&self, src: &Path) -> Result<Zeroizing<Vec<u8>>>;

    /// Decrypt `src` into `dest`.
    fn decrypt_to_file(&self, dest: &Path, src: &Path) -> Result<()>;

    /// Decrypt `src`, streaming plaintext into `out`.
    fn decrypt_stream(&self, src: &Path, out: &mut dyn Write) -> Result<()>;

    /// Encrypt everything readable from `input` for `recipients` into `dest`.
    fn encrypt_stream(
        &self,
        dest: &Path,
        recipients: &[Recipient],
        input: &mut dyn Read,
    ) -> Result<()>;

    /// Fetch public keys for `recipients` into the keyring.
    fn import_keys(&self, recipients: &[Recipient]) -> Result<()>;

    /// Remove a public key from the keyring.
    fn delete_key(&self, recipient: &Recipient) -> Result<()>;

    /// Every public key in the keyring with its trust label.
    fn list_keys(&self) -> Result<Vec<KeyRecord>>;

    /// Every secret key in the keyring.
    fn secret_keys(&self) -> Result<Vec<KeyRecord>>;

    /// Backend name for display.
    fn name(&self) -> &'static str;
}

/// Fingerprint → trusted, for every public key in the keyring.
pub fn trust_map(backend: &dyn Backend) -> Result<BTreeMap<Fingerprint, bool>> {
    Ok(backend
        .list_keys()?
        .into_iter()
        .map(|k| (k.fingerprint, k.trust.is_trusted()))
        .collect())
}

/// Re-encrypt `src` into `dest` for `recipients` without plaintext ever
/// touching disk.
///
/// Decryption runs on a scoped thread writing into one end of an in-process
/// pipe; encryption runs on the calling thread reading the other end. The
/// pipe buffer is sized from the source ciphertext length. `dest` must not
/// be `src`: the caller promotes `dest` only after this returns `Ok`.
pub fn reencrypt_stream(
    backend: &dyn Backend,
    src: &Path,
    dest: &Path,
    recipients: &[Recipient],
) -> Result<()> {
    let source_len = std::fs::metadata(src)?.len();
    let (writer, mut reader) = pipe::pipe(pipe::buffer_hint(source_len));
    trace!(src = %src.display(), dest = %dest.display(), source_len, "re-encrypting");

    thread::scope(|s| {
        let producer = s.spawn(move || {
            let mut writer = writer;
            let decrypted = backend.decrypt_stream(src, &mut writer);
            let closed = writer.close().map_err(|e| Error::from(BackendError::Io(e)));
            decrypted.and(closed)
        });

        let consumed = backend.encrypt_stream(dest, recipients, &mut reader);
        // unblocks the producer if the consumer stopped reading early
        drop(reader);

        let produced = producer.join().unwrap_or_else(|_| {
            Err(BackendError::Malformed("decrypt worker panicked".to_string()).into())
        });

        match (produced, consumed) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(p), Ok(())) => Err(p),
            (Ok(()), Err(c)) => Err(c),
            (Err(p), Err(c)) => {
                if is_broken_pipe(&p) {
                    Err(c)
                } else {
                    Err(p)
                }
            }
        }
    })
}

fn is_broken_pipe(err: &Error) -> bool {
    matches!(
        err,
        Error::Backend(BackendError::Io(e)) if e.kind() == std::io::ErrorKind::BrokenPipe
    )
}

/// Create `path`'s parent directory (owner-only on unix) if missing.
pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent.exists() {
        return Ok(());
    }

    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(parent)?;
    Ok(())
}
