//! GPG backend.
//!
//! Drives GnuPG through the `gpg` CLI.
//!
//! ## Requirements
//!
//! - `gpg` must be on `PATH`
//! - recipient public keys must be in the keyring (or fetchable from a keyserver)
//! - a secret key for at least one recipient is needed to decrypt
//!
//! Every invocation runs in `--batch --yes` mode, is logged before it runs,
//! and captures stderr so failures carry gpg's own diagnostic. When
//! `GNUPGHOME` is set it is passed explicitly as `--homedir`.

use std::ffi::OsString;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, trace};
use zeroize::Zeroizing;

use super::{ensure_parent, Backend};
use crate::core::constants::{GNUPGHOME_ENV, KEYSERVER_ENV};
use crate::core::domain::{KeyRecord, PlaintextSource, Recipient, TrustLevel};
use crate::core::types::Fingerprint;
use crate::error::{BackendError, Result};

/// Runtime configuration for the gpg backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GpgConfig {
    /// Keyring home passed as `--homedir`.
    pub homedir: Option<PathBuf>,
    /// Keyserver used by key imports.
    pub keyserver: Option<String>,
}

impl GpgConfig {
    /// Read `GNUPGHOME` and `GPGVAULT_KEYSERVER`; empty values count as unset.
    pub fn from_env() -> Self {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        Self {
            homedir: non_empty(GNUPGHOME_ENV).map(PathBuf::from),
            keyserver: non_empty(KEYSERVER_ENV),
        }
    }
}

/// GnuPG backend.
#[derive(Debug, Clone)]
pub struct Gpg {
    program: PathBuf,
    config: GpgConfig,
}

impl Gpg {
    /// Locate `gpg` on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotInstalled` if it cannot be found.
    pub fn new(config: GpgConfig) -> Result<Self> {
        let program = which::which("gpg").map_err(|_| BackendError::NotInstalled)?;
        debug!(program = %program.display(), "using gpg");
        Ok(Self { program, config })
    }

    /// [`Gpg::new`] with [`GpgConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        Self::new(GpgConfig::from_env())
    }

    /// Common prefix of every invocation.
    fn base_args(&self) -> Vec<OsString> {
        let mut args = Vec::new();
        if let Some(home) = &self.config.homedir {
            args.push("--homedir".into());
            args.push(home.clone().into_os_string());
        }
        args.push("--batch".into());
        args.push("--yes".into());
        args
    }

    fn invocation<I, S>(&self, args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut all = self.base_args();
        all.extend(args.into_iter().map(Into::into));
        Invocation {
            program: self.program.clone(),
            args: all,
        }
    }

    fn encrypt_args(dest: &Path, recipients: &[Recipient]) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--encrypt".into(),
            "--armor".into(),
            "--output".into(),
            dest.as_os_str().to_owned(),
        ];
        for r in recipients {
            args.push("--recipient".into());
            args.push(r.fingerprint().as_str().into());
        }
        args
    }
}

impl Backend for Gpg {
    fn name(&self) -> &'static str {
        "gpg"
    }

    fn encrypt_to_file(
        &self,
        dest: &Path,
        recipients: &[Recipient],
        source: &PlaintextSource,
    ) -> Result<()> {
        ensure_parent(dest)?;
        let mut args = Self::encrypt_args(dest, recipients);

        let result = match source {
            PlaintextSource::Text(text) => {
                self.invocation(args).output(Some(text.as_bytes())).map(drop)
            }
            PlaintextSource::File(path) => {
                args.push(path.as_os_str().to_owned());
                self.invocation(args).output(None).map(drop)
            }
            PlaintextSource::Stdin => {
                args.push("-".into());
                self.invocation(args).inherit_stdin()
            }
        };

        remove_on_error(dest, result)
    }

    fn decrypt_to_bytes(&self, src: &Path) -> Result<Zeroizing<Vec<u8>>> {
        let args: Vec<OsString> = vec![
            "--decrypt".into(),
            "--armor".into(),
            src.as_os_str().to_owned(),
        ];
        let plaintext = self.invocation(args).output(None)?;
        trace!(len = plaintext.len(), "decrypted with gpg");
        Ok(Zeroizing::new(plaintext))
    }

    fn decrypt_to_file(&self, dest: &Path, src: &Path) -> Result<()> {
        ensure_parent(dest)?;
        let args: Vec<OsString> = vec![
            "--decrypt".into(),
            "--armor".into(),
            "--output".into(),
            dest.as_os_str().to_owned(),
            src.as_os_str().to_owned(),
        ];
        let result = self.invocation(args).output(None).map(drop);
        remove_on_error(dest, result)
    }

    fn decrypt_stream(&self, src: &Path, out: &mut dyn Write) -> Result<()> {
        let args: Vec<OsString> = vec![
            "--decrypt".into(),
            "--armor".into(),
            src.as_os_str().to_owned(),
        ];
        self.invocation(args).stream_stdout(out)
    }

    fn encrypt_stream(
        &self,
        dest: &Path,
        recipients: &[Recipient],
        input: &mut dyn Read,
    ) -> Result<()> {
        ensure_parent(dest)?;
        let result = self
            .invocation(Self::encrypt_args(dest, recipients))
            .stream_stdin(input);
        remove_on_error(dest, result)
    }

    fn import_keys(&self, recipients: &[Recipient]) -> Result<()> {
        if recipients.is_empty() {
            return Ok(());
        }
        let mut args: Vec<OsString> = Vec::new();
        if let Some(keyserver) = &self.config.keyserver {
            args.push("--keyserver".into());
            args.push(keyserver.into());
        }
        args.push("--recv-keys".into());
        args.extend(recipients.iter().map(|r| r.fingerprint().as_str().into()));
        self.invocation(args).output(None).map(drop)
    }

    fn delete_key(&self, recipient: &Recipient) -> Result<()> {
        let args: Vec<OsString> = vec![
            "--delete-key".into(),
            recipient.fingerprint().as_str().into(),
        ];
        self.invocation(args).output(None).map(drop)
    }

    fn list_keys(&self) -> Result<Vec<KeyRecord>> {
        let out = self
            .invocation(["--list-keys", "--with-colons", "--fingerprint"])
            .output(None)?;
        parse_colons(&String::from_utf8_lossy(&out), "pub")
    }

    fn secret_keys(&self) -> Result<Vec<KeyRecord>> {
        let out = self
            .invocation(["--list-secret-keys", "--with-colons", "--fingerprint"])
            .output(None)?;
        parse_colons(&String::from_utf8_lossy(&out), "sec")
    }
}

/// Decode `--with-colons --fingerprint` output into key records.
///
/// A `primary` line (`pub` or `sec`) opens a record; its validity code is
/// field 2. The first `fpr` line before any subkey gives field 10 as the
/// fingerprint, the first `uid` line gives field 10 as the user id.
pub fn parse_colons(listing: &str, primary: &str) -> Result<Vec<KeyRecord>> {
    struct Open {
        trust: TrustLevel,
        fingerprint: Option<Fingerprint>,
        uid: Option<String>,
        in_primary: bool,
    }

    fn finish(open: Option<Open>, records: &mut Vec<KeyRecord>) {
        if let Some(Open {
            trust,
            fingerprint: Some(fingerprint),
            uid,
            ..
        }) = open
        {
            records.push(KeyRecord {
                fingerprint,
                trust,
                uid,
            });
        }
    }

    let mut records = Vec::new();
    let mut open: Option<Open> = None;

    for line in listing.lines() {
        let fields: Vec<&str> = line.split(':').collect();
        let field = |i: usize| fields.get(i).copied().unwrap_or("");

        match field(0) {
            tag if tag == primary => {
                finish(open.take(), &mut records);
                open = Some(Open {
                    trust: TrustLevel::from_code(field(1)),
                    fingerprint: None,
                    uid: None,
                    in_primary: true,
                });
            }
            "sub" | "ssb" => {
                if let Some(o) = open.as_mut() {
                    o.in_primary = false;
                }
            }
            "fpr" => {
                if let Some(o) = open.as_mut().filter(|o| o.in_primary && o.fingerprint.is_none()) {
                    let fpr = Fingerprint::parse(field(9)).map_err(|_| {
                        BackendError::Malformed(format!("bad fingerprint line: {}", line))
                    })?;
                    o.fingerprint = Some(fpr);
                }
            }
            "uid" => {
                if let Some(o) = open.as_mut().filter(|o| o.uid.is_none()) {
                    o.uid = Some(unescape(field(9)));
                }
            }
            _ => {}
        }
    }
    finish(open, &mut records);

    Ok(records)
}

/// Undo gpg's `\xNN` escaping in colon listings.
fn unescape(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && bytes.get(i + 1) == Some(&b'x') && i + 4 <= bytes.len() {
            let decoded = std::str::from_utf8(&bytes[i + 2..i + 4])
                .ok()
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(b) = decoded {
                out.push(b);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn remove_on_error(dest: &Path, result: Result<()>) -> Result<()> {
    if result.is_err() && dest.exists() {
        let _ = std::fs::remove_file(dest);
    }
    result
}

/// A single gpg command line.
struct Invocation {
    program: PathBuf,
    args: Vec<OsString>,
}

impl Invocation {
    fn display(&self) -> String {
        let args: Vec<String> = self
            .args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        format!("gpg {}", args.join(" "))
    }

    fn spawn(&self, stdin: Stdio, stdout: Stdio) -> Result<Child> {
        info!("running: {}", self.display());
        Command::new(&self.program)
            .args(&self.args)
            .stdin(stdin)
            .stdout(stdout)
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| {
                BackendError::Spawn {
                    program: self.program.display().to_string(),
                    source,
                }
                .into()
            })
    }

    fn check(&self, status: std::process::ExitStatus, stderr: String) -> Result<()> {
        if status.success() {
            if !stderr.trim().is_empty() {
                debug!(stderr = %stderr.trim(), "gpg diagnostics");
            }
            return Ok(());
        }
        Err(BackendError::Exited {
            command: self.display(),
            status: status.to_string(),
            stderr: stderr.trim().to_string(),
        }
        .into())
    }

    /// Run to completion, optionally feeding `input`, and return stdout.
    fn output(&self, input: Option<&[u8]>) -> Result<Vec<u8>> {
        let stdin = if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        };
        let mut child = self.spawn(stdin, Stdio::piped())?;

        // Feed stdin from a helper thread so a chatty stdout can't deadlock us.
        let feeder = match (input, child.stdin.take()) {
            (Some(bytes), Some(mut pipe)) => {
                let bytes = Zeroizing::new(bytes.to_vec());
                Some(thread::spawn(move || pipe.write_all(&bytes)))
            }
            _ => None,
        };

        let output = child.wait_with_output().map_err(BackendError::Io)?;
        if let Some(feeder) = feeder {
            match feeder.join() {
                Ok(Err(e)) if e.kind() != io::ErrorKind::BrokenPipe => {
                    return Err(BackendError::Io(e).into())
                }
                _ => {}
            }
        }

        self.check(output.status, String::from_utf8_lossy(&output.stderr).into_owned())?;
        Ok(output.stdout)
    }

    /// Run with the terminal's stdin attached.
    fn inherit_stdin(&self) -> Result<()> {
        let child = self.spawn(Stdio::inherit(), Stdio::null())?;
        let output = child.wait_with_output().map_err(BackendError::Io)?;
        self.check(output.status, String::from_utf8_lossy(&output.stderr).into_owned())
    }

    /// Run, copying stdout into `out` as it is produced.
    fn stream_stdout(&self, out: &mut dyn Write) -> Result<()> {
        let mut child = self.spawn(Stdio::null(), Stdio::piped())?;
        let stderr = drain_stderr(&mut child);

        let copied = match child.stdout.take() {
            Some(mut stdout) => io::copy(&mut stdout, out).and_then(|_| out.flush()),
            None => Err(io::Error::new(io::ErrorKind::Other, "stdout not captured")),
        };
        let status = child.wait().map_err(BackendError::Io)?;
        let stderr = join_stderr(stderr);

        self.check(status, stderr)?;
        copied.map_err(BackendError::Io)?;
        Ok(())
    }

    /// Run, copying `input` into stdin and closing it at EOF.
    fn stream_stdin(&self, input: &mut dyn Read) -> Result<()> {
        let mut child = self.spawn(Stdio::piped(), Stdio::null())?;
        let stderr = drain_stderr(&mut child);

        let copied = match child.stdin.take() {
            // stdin drops at the end of this arm, closing gpg's input
            Some(mut stdin) => io::copy(input, &mut stdin).map(drop),
            None => Err(io::Error::new(io::ErrorKind::Other, "stdin not captured")),
        };
        let status = child.wait().map_err(BackendError::Io)?;
        let stderr = join_stderr(stderr);

        self.check(status, stderr)?;
        copied.map_err(BackendError::Io)?;
        Ok(())
    }
}

fn drain_stderr(child: &mut Child) -> Option<JoinHandle<String>> {
    child.stderr.take().map(|mut stderr| {
        thread::spawn(move || {
            let mut text = String::new();
            let _ = stderr.read_to_string(&mut text);
            text
        })
    })
}

fn join_stderr(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}
