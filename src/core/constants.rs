//! Constants used throughout gpgvault.
//!
//! Centralizes magic strings and configuration values.

/// Recipient manifest file name, at the vault root.
pub const MANIFEST_FILE: &str = "Vaultfile";

/// Extension carried by every encrypted object.
pub const OBJECT_EXTENSION: &str = "asc";

/// Suffix for in-progress writes; hidden and never listed as objects.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Environment variable that redirects gpg to a non-default keyring home.
pub const GNUPGHOME_ENV: &str = "GNUPGHOME";

/// Environment variable naming the keyserver for key imports.
pub const KEYSERVER_ENV: &str = "GPGVAULT_KEYSERVER";

/// Environment variable overriding the vault root.
pub const VAULT_DIR_ENV: &str = "GPGVAULT_DIR";

/// Environment variable holding a tracing filter directive.
pub const LOG_ENV: &str = "GPGVAULT_LOG";

/// Lower bound for the repair pipe buffer.
pub const MIN_PIPE_BUFFER: usize = 8 * 1024;

/// Upper bound for the repair pipe buffer, whatever the object size.
pub const MAX_PIPE_BUFFER: usize = 1024 * 1024;

/// Number of in-flight chunks the repair pipe holds before blocking.
pub const PIPE_DEPTH: usize = 4;
