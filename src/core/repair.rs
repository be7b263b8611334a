//! Repair engine.
//!
//! Re-encrypts every object in the store for the current recipient set.
//!
//! Per object, the old ciphertext is streamed through decrypt → pipe →
//! encrypt into a staging file next to it, and the staging file is renamed
//! over the original only after both halves succeeded. A failed object keeps
//! its old ciphertext, is recorded, and the run moves on; the aggregate is
//! reported at the end. Re-running is always safe: each pass starts from the
//! current ciphertext and derives a fresh replacement.
//!
//! ```text
//! Scanning ─▶ Processing(p) for each p ─▶ Completed(ok) | Completed(with failures)
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::{debug, info, warn};

use crate::core::cipher;
use crate::core::domain::{Recipient, RepairFailure, RepairReport};
use crate::core::store::{discard, staging_path, ObjectStore};
use crate::error::{ManifestError, Result};

/// Cooperative cancellation for a repair run.
///
/// Checked before each object is started; objects already in flight run to
/// completion so no half-written replacement is left behind.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Tuning for a repair run.
#[derive(Debug, Clone)]
pub struct RepairOptions {
    /// Upper bound on concurrently repaired objects.
    pub workers: usize,
    pub cancel: CancelToken,
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self {
            workers: 1,
            cancel: CancelToken::default(),
        }
    }
}

/// One repair run over a store.
pub struct Repair<'a> {
    store: &'a ObjectStore,
    options: RepairOptions,
}

impl<'a> Repair<'a> {
    pub fn new(store: &'a ObjectStore) -> Self {
        Self::with_options(store, RepairOptions::default())
    }

    pub fn with_options(store: &'a ObjectStore, options: RepairOptions) -> Self {
        Self { store, options }
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.options.workers = workers;
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.options.cancel = token;
        self
    }

    /// Re-encrypt every object for `recipients`.
    ///
    /// Object `i` of the sorted listing goes to worker `i % workers`, so a
    /// re-run with the same worker count processes the same partitions.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::NoRecipients` before touching anything if
    /// `recipients` is empty, or an error if the store cannot be listed.
    /// Per-object failures are not errors here; they land in the report.
    pub fn run(&self, recipients: &[Recipient]) -> Result<RepairReport> {
        if recipients.is_empty() {
            return Err(ManifestError::NoRecipients.into());
        }

        debug!(root = %self.store.root().display(), "repair: scanning");
        let objects = self.store.list_all()?;
        if objects.is_empty() {
            debug!("repair: nothing to do");
            return Ok(RepairReport::default());
        }

        let workers = self.options.workers.clamp(1, objects.len());
        info!(
            objects = objects.len(),
            recipients = recipients.len(),
            workers,
            "repair: processing"
        );

        let repaired: Mutex<Vec<(usize, PathBuf)>> = Mutex::new(Vec::new());
        let skipped: Mutex<Vec<(usize, PathBuf)>> = Mutex::new(Vec::new());
        let failures: Mutex<Vec<RepairFailure>> = Mutex::new(Vec::new());

        thread::scope(|s| {
            for worker in 0..workers {
                let (objects, repaired, skipped, failures) =
                    (&objects, &repaired, &skipped, &failures);
                s.spawn(move || {
                    for (index, path) in objects.iter().enumerate().skip(worker).step_by(workers) {
                        if self.options.cancel.is_cancelled() {
                            push(skipped, (index, path.clone()));
                            continue;
                        }
                        debug!(worker, path = %path.display(), "repair: object");
                        match self.repair_one(path, recipients) {
                            Ok(()) => push(repaired, (index, path.clone())),
                            Err(e) => {
                                warn!(path = %path.display(), error = %e, "repair failed");
                                push(
                                    failures,
                                    RepairFailure {
                                        path: path.clone(),
                                        error: e.to_string(),
                                    },
                                );
                            }
                        }
                    }
                });
            }
        });

        let report = RepairReport {
            objects: objects.len(),
            repaired: in_discovery_order(repaired),
            failures: {
                let mut f = into_inner(failures);
                f.sort_by(|a, b| a.path.cmp(&b.path));
                f
            },
            skipped: in_discovery_order(skipped),
        };

        info!(
            repaired = report.repaired.len(),
            failed = report.failures.len(),
            skipped = report.skipped.len(),
            outcome = ?report.outcome(),
            "repair: completed"
        );
        Ok(report)
    }

    /// Replace one object, or leave it untouched.
    fn repair_one(&self, path: &Path, recipients: &[Recipient]) -> Result<()> {
        let staging = staging_path(path);
        if let Err(e) = cipher::reencrypt_stream(self.store.backend(), path, &staging, recipients) {
            discard(&staging);
            return Err(e);
        }
        if let Err(e) = fs::rename(&staging, path) {
            discard(&staging);
            return Err(e.into());
        }
        Ok(())
    }
}

fn push<T>(into: &Mutex<Vec<T>>, item: T) {
    into.lock().unwrap_or_else(|e| e.into_inner()).push(item);
}

fn into_inner<T>(m: Mutex<Vec<T>>) -> Vec<T> {
    m.into_inner().unwrap_or_else(|e| e.into_inner())
}

fn in_discovery_order(m: Mutex<Vec<(usize, PathBuf)>>) -> Vec<PathBuf> {
    let mut items = into_inner(m);
    items.sort_by_key(|(index, _)| *index);
    items.into_iter().map(|(_, path)| path).collect()
}
