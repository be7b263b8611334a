//! Command-line interface.

pub mod completions;
pub mod init;
pub mod objects;
pub mod output;
pub mod repair;
pub mod team;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::warn;

use crate::core::cipher::{Backend, Gpg, GpgConfig};
use crate::core::constants::{KEYSERVER_ENV, VAULT_DIR_ENV};
use crate::core::manifest::Manifest;
use crate::core::repair::{CancelToken, RepairOptions};
use crate::core::Vault;
use crate::error::{ManifestError, Result};

/// gpgvault - A git-friendly encrypted file vault for GnuPG recipients.
#[derive(Parser)]
#[command(
    name = "gpgvault",
    about = "A git-friendly encrypted file vault for GnuPG recipients",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Vault root directory
    #[arg(long, global = true, env = VAULT_DIR_ENV, default_value = ".")]
    pub vault: PathBuf,

    /// Keyserver to fetch missing recipient keys from
    #[arg(long, global = true, env = KEYSERVER_ENV)]
    pub keyserver: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Create a Vaultfile in the vault root
    Init {
        /// Don't add your own key as the first recipient
        #[arg(long)]
        empty: bool,
    },

    /// Grant a key access and re-encrypt every object
    Add {
        /// Fingerprint, long key id, or email of the key
        key: String,
        /// Display name (defaults to the key's user id)
        #[arg(short, long)]
        name: Option<String>,
        /// Parallel re-encryption workers
        #[arg(short, long, default_value_t = 1)]
        workers: usize,
    },

    /// Revoke a recipient and re-encrypt every object without them
    Rm {
        /// Fingerprint or name of the recipient
        id: String,
        /// Also delete their public key from the keyring
        #[arg(long)]
        purge_key: bool,
        /// Parallel re-encryption workers
        #[arg(short, long, default_value_t = 1)]
        workers: usize,
    },

    /// List recipients
    Recipients {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Encrypt a value or file into the vault
    Set {
        /// Object path relative to the vault root
        path: String,
        /// Plaintext, or "-" to read stdin
        #[arg(conflicts_with = "file")]
        value: Option<String>,
        /// Read plaintext from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Decrypt an object
    Get {
        /// Object path relative to the vault root
        path: String,
        /// Write plaintext to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List objects
    Ls {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Re-encrypt every object for the current recipients
    Repair {
        /// Parallel re-encryption workers
        #[arg(short, long, default_value_t = 1)]
        workers: usize,
        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Global settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub root: PathBuf,
    pub keyserver: Option<String>,
}

impl Context {
    /// Build the gpg backend, honouring `GNUPGHOME` and `--keyserver`.
    pub fn backend(&self) -> Result<Arc<dyn Backend>> {
        let mut config = GpgConfig::from_env();
        if self.keyserver.is_some() {
            config.keyserver = self.keyserver.clone();
        }
        Ok(Arc::new(Gpg::new(config)?))
    }

    /// Open the vault at the configured root.
    ///
    /// A missing Vaultfile is reported before gpg is looked up.
    pub fn open(&self) -> Result<Vault> {
        if !Manifest::exists(&self.root) {
            return Err(ManifestError::NotInitialized(self.root.clone()).into());
        }
        Vault::open(&self.root, self.backend()?)
    }
}

/// Exit status after a second Ctrl-C (128 + SIGINT).
const INTERRUPTED_EXIT: i32 = 130;

/// Repair options whose cancel token is tripped by Ctrl-C.
fn repair_options(workers: usize) -> RepairOptions {
    let options = RepairOptions {
        workers: workers.max(1),
        ..RepairOptions::default()
    };
    let token = options.cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || on_interrupt(&token)) {
        warn!(error = %e, "could not install interrupt handler");
    }
    options
}

/// The first interrupt stops new objects from starting; the second exits.
fn on_interrupt(token: &CancelToken) {
    if token.is_cancelled() {
        std::process::exit(INTERRUPTED_EXIT);
    }
    output::warn("interrupted, finishing objects in flight (Ctrl-C again to abort)");
    token.cancel();
}

/// Execute a parsed command line.
pub fn execute(cli: Cli) -> Result<()> {
    use Command::*;

    let ctx = Context {
        root: cli.vault,
        keyserver: cli.keyserver,
    };

    match cli.command {
        Init { empty } => init::execute(&ctx, empty),
        Add { key, name, workers } => {
            team::add(&ctx, &key, name.as_deref(), &repair_options(workers))
        }
        Rm {
            id,
            purge_key,
            workers,
        } => team::rm(&ctx, &id, purge_key, &repair_options(workers)),
        Recipients { json } => team::list(&ctx, json),
        Set { path, value, file } => objects::set(&ctx, &path, value.as_deref(), file),
        Get { path, output } => objects::get(&ctx, &path, output.as_deref()),
        Ls { json } => objects::list(&ctx, json),
        Repair { workers, json } => repair::execute(&ctx, &repair_options(workers), json),
        Completions { shell } => completions::execute(shell),
    }
}
