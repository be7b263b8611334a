//! Domain types.

mod key;
mod recipient;
mod repair;
mod source;

pub use key::{KeyRecord, TrustLevel};
pub use recipient::Recipient;
pub use repair::{Mutation, RepairFailure, RepairOutcome, RepairReport};
pub use source::PlaintextSource;
