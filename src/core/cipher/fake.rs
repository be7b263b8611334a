//! In-memory backend for tests.
//!
//! Keeps its own keyring, records every invocation, and produces a
//! text "ciphertext" that names its recipients plus a fresh nonce, so two
//! encryptions of the same plaintext never produce the same bytes. It
//! decrypts only when the keyring holds a secret key for one of the listed
//! recipients, which mirrors how gpg behaves.
//!
//! Failures can be injected per operation by path substring.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use zeroize::Zeroizing;

use super::{ensure_parent, Backend};
use crate::core::domain::{KeyRecord, PlaintextSource, Recipient, TrustLevel};
use crate::core::types::Fingerprint;
use crate::error::{BackendError, Result};

const BEGIN: &str = "-----BEGIN FAKE PGP MESSAGE-----";
const END: &str = "-----END FAKE PGP MESSAGE-----";

/// A key known to the fake keyring.
#[derive(Debug, Clone)]
pub struct FakeKey {
    pub fingerprint: Fingerprint,
    pub uid: String,
    pub trust: TrustLevel,
    pub secret: bool,
}

impl FakeKey {
    /// A public-only key with the given trust.
    ///
    /// # Panics
    ///
    /// Panics if `fingerprint` is not valid hex.
    pub fn public(fingerprint: &str, uid: &str, trust: TrustLevel) -> Self {
        Self {
            fingerprint: Fingerprint::parse(fingerprint).expect("valid test fingerprint"),
            uid: uid.to_string(),
            trust,
            secret: false,
        }
    }

    /// A key pair owned locally (ultimate trust, secret half present).
    pub fn secret(fingerprint: &str, uid: &str) -> Self {
        Self {
            secret: true,
            ..Self::public(fingerprint, uid, TrustLevel::Ultimate)
        }
    }

    fn record(&self) -> KeyRecord {
        KeyRecord {
            fingerprint: self.fingerprint.clone(),
            trust: self.trust,
            uid: Some(self.uid.clone()),
        }
    }
}

/// Operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeOp {
    Encrypt,
    Decrypt,
    Import,
    List,
}

#[derive(Default)]
struct State {
    keyring: Vec<FakeKey>,
    keyserver: Vec<FakeKey>,
    calls: Vec<String>,
    failures: Vec<(FakeOp, String)>,
}

/// Recording test double for [`Backend`].
#[derive(Default)]
pub struct Fake {
    state: Mutex<State>,
    nonce: AtomicU64,
}

impl Fake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Fake::add_key`].
    pub fn with_key(self, key: FakeKey) -> Self {
        self.add_key(key);
        self
    }

    /// Put a key directly in the keyring.
    pub fn add_key(&self, key: FakeKey) {
        let mut state = self.lock();
        state.keyring.retain(|k| k.fingerprint != key.fingerprint);
        state.keyring.push(key);
    }

    /// Make a key available to `import_keys` without adding it locally.
    pub fn publish(&self, key: FakeKey) {
        self.lock().keyserver.push(key);
    }

    /// Make `op` fail whenever its path contains `needle`
    /// (`List` and `Import` fail unconditionally).
    pub fn fail(&self, op: FakeOp, needle: &str) {
        self.lock().failures.push((op, needle.to_string()));
    }

    /// Stop injecting failures.
    pub fn heal(&self) {
        self.lock().failures.clear();
    }

    /// Every invocation so far, oldest first.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Whether a public key is in the keyring.
    pub fn has_key(&self, fingerprint: &Fingerprint) -> bool {
        self.lock()
            .keyring
            .iter()
            .any(|k| &k.fingerprint == fingerprint)
    }

    /// Fingerprints an object was encrypted for.
    pub fn recipients_of(&self, path: &Path) -> Result<Vec<Fingerprint>> {
        let (recipients, _) = open_envelope(&fs::read_to_string(path)?)?;
        Ok(recipients)
    }

    /// Decrypt as if only `fingerprint`'s secret key were available.
    pub fn decrypt_as(&self, fingerprint: &Fingerprint, path: &Path) -> Result<Zeroizing<Vec<u8>>> {
        let (recipients, plaintext) = open_envelope(&fs::read_to_string(path)?)?;
        if !recipients.contains(fingerprint) {
            return Err(exited("decrypt", "decryption failed: No secret key"));
        }
        Ok(plaintext)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: String) {
        self.lock().calls.push(call);
    }

    fn should_fail(&self, op: FakeOp, path: &str) -> bool {
        self.lock()
            .failures
            .iter()
            .any(|(o, needle)| *o == op && (path.is_empty() || path.contains(needle.as_str())))
    }

    fn seal(&self, dest: &Path, recipients: &[Recipient], plaintext: &[u8]) -> Result<()> {
        if recipients.is_empty() {
            return Err(exited("encrypt", "no valid addressees"));
        }
        {
            let state = self.lock();
            for r in recipients {
                if !state.keyring.iter().any(|k| &k.fingerprint == r.fingerprint()) {
                    return Err(exited(
                        "encrypt",
                        &format!("{}: skipped: No public key", r.fingerprint()),
                    ));
                }
            }
        }

        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        let fingerprints: Vec<&str> = recipients.iter().map(|r| r.fingerprint().as_str()).collect();
        let mut body = String::new();
        body.push_str(BEGIN);
        body.push('\n');
        body.push_str(&format!("Recipients: {}\n", fingerprints.join(",")));
        body.push_str(&format!("Nonce: {}\n", nonce));
        for line in plaintext.chunks(32) {
            for b in line {
                body.push_str(&format!("{:02x}", b));
            }
            body.push('\n');
        }
        body.push_str(END);
        body.push('\n');

        ensure_parent(dest)?;
        fs::write(dest, body)?;
        Ok(())
    }

    fn unseal(&self, src: &Path) -> Result<Zeroizing<Vec<u8>>> {
        let (recipients, plaintext) = open_envelope(&fs::read_to_string(src)?)?;
        let state = self.lock();
        let can_decrypt = recipients
            .iter()
            .any(|fpr| state.keyring.iter().any(|k| k.secret && &k.fingerprint == fpr));
        if !can_decrypt {
            return Err(exited("decrypt", "decryption failed: No secret key"));
        }
        Ok(plaintext)
    }
}

impl Backend for Fake {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn encrypt_to_file(
        &self,
        dest: &Path,
        recipients: &[Recipient],
        source: &PlaintextSource,
    ) -> Result<()> {
        let plaintext = match source {
            PlaintextSource::Text(text) => Zeroizing::new(text.as_bytes().to_vec()),
            PlaintextSource::File(path) => Zeroizing::new(fs::read(path)?),
            PlaintextSource::Stdin => {
                let mut buf = Zeroizing::new(Vec::new());
                std::io::stdin().read_to_end(&mut buf)?;
                buf
            }
        };
        self.encrypt_stream(dest, recipients, &mut plaintext.as_slice())
    }

    fn decrypt_to_bytes(&self, src: &Path) -> Result<Zeroizing<Vec<u8>>> {
        let mut out = Zeroizing::new(Vec::new());
        self.decrypt_stream(src, &mut *out)?;
        Ok(out)
    }

    fn decrypt_to_file(&self, dest: &Path, src: &Path) -> Result<()> {
        let plaintext = self.decrypt_to_bytes(src)?;
        ensure_parent(dest)?;
        fs::write(dest, plaintext.as_slice())?;
        Ok(())
    }

    fn decrypt_stream(&self, src: &Path, out: &mut dyn Write) -> Result<()> {
        let path = src.display().to_string();
        self.record(format!("decrypt {}", path));
        if self.should_fail(FakeOp::Decrypt, &path) {
            return Err(exited("decrypt", "injected decrypt failure"));
        }

        let plaintext = self.unseal(src)?;
        // small writes so the repair pipe sees several chunks
        for chunk in plaintext.chunks(4096) {
            out.write_all(chunk).map_err(BackendError::Io)?;
        }
        Ok(())
    }

    fn encrypt_stream(
        &self,
        dest: &Path,
        recipients: &[Recipient],
        input: &mut dyn Read,
    ) -> Result<()> {
        let path = dest.display().to_string();
        let targets: Vec<&str> = recipients.iter().map(|r| r.fingerprint().as_str()).collect();
        self.record(format!("encrypt {} to {}", path, targets.join(",")));

        if self.should_fail(FakeOp::Encrypt, &path) {
            // leave a torn file behind like a crashed tool would
            ensure_parent(dest)?;
            fs::write(dest, BEGIN)?;
            return Err(exited("encrypt", "injected encrypt failure"));
        }

        let mut plaintext = Zeroizing::new(Vec::new());
        input.read_to_end(&mut plaintext).map_err(BackendError::Io)?;
        self.seal(dest, recipients, &plaintext)
    }

    fn import_keys(&self, recipients: &[Recipient]) -> Result<()> {
        let targets: Vec<&str> = recipients.iter().map(|r| r.fingerprint().as_str()).collect();
        self.record(format!("import {}", targets.join(",")));
        if self.should_fail(FakeOp::Import, "") {
            return Err(exited("recv-keys", "keyserver receive failed: injected"));
        }

        let mut state = self.lock();
        for r in recipients {
            let found = state
                .keyserver
                .iter()
                .find(|k| &k.fingerprint == r.fingerprint())
                .cloned();
            match found {
                Some(key) => {
                    state.keyring.retain(|k| k.fingerprint != key.fingerprint);
                    state.keyring.push(key);
                }
                None => {
                    return Err(exited(
                        "recv-keys",
                        &format!("keyserver receive failed: No data for {}", r.fingerprint()),
                    ))
                }
            }
        }
        Ok(())
    }

    fn delete_key(&self, recipient: &Recipient) -> Result<()> {
        self.record(format!("delete-key {}", recipient.fingerprint()));
        self.lock()
            .keyring
            .retain(|k| &k.fingerprint != recipient.fingerprint());
        Ok(())
    }

    fn list_keys(&self) -> Result<Vec<KeyRecord>> {
        self.record("list-keys".to_string());
        if self.should_fail(FakeOp::List, "") {
            return Err(exited("list-keys", "injected keyring failure"));
        }
        Ok(self.lock().keyring.iter().map(FakeKey::record).collect())
    }

    fn secret_keys(&self) -> Result<Vec<KeyRecord>> {
        self.record("list-secret-keys".to_string());
        if self.should_fail(FakeOp::List, "") {
            return Err(exited("list-secret-keys", "injected keyring failure"));
        }
        Ok(self
            .lock()
            .keyring
            .iter()
            .filter(|k| k.secret)
            .map(FakeKey::record)
            .collect())
    }
}

fn exited(command: &str, stderr: &str) -> crate::error::Error {
    BackendError::Exited {
        command: format!("fake {}", command),
        status: "exit status: 2".to_string(),
        stderr: stderr.to_string(),
    }
    .into()
}

fn open_envelope(text: &str) -> Result<(Vec<Fingerprint>, Zeroizing<Vec<u8>>)> {
    let malformed = || BackendError::Malformed("not a fake pgp message".to_string());

    let mut lines = text.lines();
    if lines.next() != Some(BEGIN) {
        return Err(malformed().into());
    }
    let recipients = lines
        .next()
        .and_then(|l| l.strip_prefix("Recipients: "))
        .ok_or_else(malformed)?
        .split(',')
        .map(Fingerprint::parse)
        .collect::<Result<Vec<_>>>()?;
    lines
        .next()
        .filter(|l| l.starts_with("Nonce: "))
        .ok_or_else(malformed)?;

    let mut plaintext = Zeroizing::new(Vec::new());
    let mut terminated = false;
    for line in lines {
        if line == END {
            terminated = true;
            break;
        }
        let bytes = line.as_bytes();
        for pair in bytes.chunks(2) {
            let hex = std::str::from_utf8(pair).map_err(|_| malformed())?;
            plaintext.push(u8::from_str_radix(hex, 16).map_err(|_| malformed())?);
        }
    }
    if !terminated {
        return Err(malformed().into());
    }

    Ok((recipients, plaintext))
}
