//! Repair results.

use serde::Serialize;
use std::path::PathBuf;

use crate::error::{RepairError, Result};

/// One object that could not be re-encrypted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Terminal state of a repair run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairOutcome {
    /// Every object was re-encrypted.
    Clean,
    /// The run finished but some objects still answer to the old recipients.
    WithFailures,
    /// Cancelled between objects; `skipped` were never started.
    Cancelled,
}

/// Result of a repair run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    /// Number of objects discovered.
    pub objects: usize,
    /// Objects successfully re-encrypted, in discovery order.
    pub repaired: Vec<PathBuf>,
    /// Objects that failed, sorted by path.
    pub failures: Vec<RepairFailure>,
    /// Objects not started because the run was cancelled.
    pub skipped: Vec<PathBuf>,
}

impl RepairReport {
    pub fn outcome(&self) -> RepairOutcome {
        if !self.failures.is_empty() {
            RepairOutcome::WithFailures
        } else if !self.skipped.is_empty() {
            RepairOutcome::Cancelled
        } else {
            RepairOutcome::Clean
        }
    }

    pub fn is_clean(&self) -> bool {
        self.outcome() == RepairOutcome::Clean
    }

    /// Turn per-object failures into an aggregate error.
    ///
    /// A cancelled run without failures is still `Ok`; callers check
    /// [`RepairReport::skipped`] for the remainder.
    pub fn into_result(self) -> Result<Self> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(RepairError::PartialFailure {
                failures: self.failures,
            }
            .into())
        }
    }
}

/// Result of a recipient mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Nothing changed, no repair was run.
    Unchanged,
    /// The Vaultfile was saved and repair ran with this report.
    Applied(RepairReport),
}

impl Mutation {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn report(&self) -> Option<&RepairReport> {
        match self {
            Self::Unchanged => None,
            Self::Applied(report) => Some(report),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome() {
        let mut report = RepairReport {
            objects: 2,
            repaired: vec![PathBuf::from("a.asc"), PathBuf::from("b.asc")],
            ..Default::default()
        };
        assert_eq!(report.outcome(), RepairOutcome::Clean);

        report.skipped.push(PathBuf::from("c.asc"));
        assert_eq!(report.outcome(), RepairOutcome::Cancelled);
        assert!(report.clone().into_result().is_ok());

        report.failures.push(RepairFailure {
            path: PathBuf::from("d.asc"),
            error: "boom".into(),
        });
        assert_eq!(report.outcome(), RepairOutcome::WithFailures);
        assert!(report.into_result().is_err());
    }
}
