//! Core library components.
//!
//! The recipient-scoped object store: keyring access, the Vaultfile, object
//! paths, and the repair engine that keeps every object encrypted for the
//! current recipients.

pub mod cipher;
pub mod constants;
pub mod domain;
pub mod manifest;
pub mod registry;
pub mod repair;
pub mod store;
pub mod types;
pub mod vault;

pub use vault::Vault;
