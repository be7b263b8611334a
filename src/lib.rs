//! gpgvault - A git-friendly encrypted file vault for GnuPG recipients.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── init          # Create a Vaultfile
//! │   ├── team          # add / rm / recipients
//! │   ├── objects       # set / get / ls
//! │   ├── repair        # Re-encrypt everything for the current recipients
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── cipher/       # Crypto backends
//!     │   ├── mod       # Backend trait, streaming re-encryption
//!     │   ├── gpg       # GnuPG subprocess implementation
//!     │   ├── fake      # In-memory recording backend
//!     │   └── pipe      # Bounded in-process byte pipe
//!     ├── domain/       # Recipients, keys, repair reports
//!     ├── registry      # Key validation against keyring trust
//!     ├── manifest      # Vaultfile management
//!     ├── store         # Logical path → .asc object, path confinement
//!     ├── repair        # Re-encryption engine
//!     └── vault/        # Facade tying the above together
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use gpgvault::core::cipher::Gpg;
//! use gpgvault::core::domain::PlaintextSource;
//! use gpgvault::core::repair::RepairOptions;
//! use gpgvault::core::Vault;
//!
//! # fn main() -> gpgvault::error::Result<()> {
//! let backend = Arc::new(Gpg::from_env()?);
//! let mut vault = Vault::open(Path::new("."), backend)?;
//! vault.add_recipient("alice@example.com", None, &RepairOptions::default())?;
//! vault.set("db/password", &PlaintextSource::from_arg("hunter2"))?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod core;
pub mod error;
