//! Error types for maintenance parameter operations.
//!
//! # Design
//! - One variant per protocol stage so callers can tell "nothing stored"
//!   (not an error) from "lookup failed" and "stored but unreadable".
//! - Constant messages; identifiers travel as fields and sources are kept.

use cairn_manifest::{ManifestError, ManifestId};
use thiserror::Error;

/// Convenience alias for maintenance parameter results.
pub type MaintenanceResult<T> = Result<T, MaintenanceError>;

/// Failures raised while reading or writing maintenance parameters.
#[derive(Debug, Error)]
pub enum MaintenanceError {
    /// Querying the manifest index failed.
    #[error("error looking for maintenance manifest")]
    Lookup {
        /// Source manifest error.
        source: ManifestError,
    },
    /// An entry was found but could not be loaded or decoded.
    #[error("error loading maintenance manifest")]
    Load {
        /// Entry picked for loading.
        manifest_id: ManifestId,
        /// Source manifest error.
        source: ManifestError,
    },
    /// Creating the new entry failed; existing entries were left untouched.
    #[error("error writing maintenance manifest")]
    Commit {
        /// Source manifest error.
        source: ManifestError,
    },
    /// Deleting a superseded entry failed after the new entry was committed.
    #[error("error deleting stale maintenance manifest")]
    Retire {
        /// Entry that could not be removed.
        manifest_id: ManifestId,
        /// Entry that holds the committed parameters.
        committed: ManifestId,
        /// Source manifest error.
        source: ManifestError,
    },
    /// Reading parameters for the ownership check failed.
    #[error("error getting maintenance params")]
    Ownership {
        /// Read-path failure.
        source: Box<MaintenanceError>,
    },
    /// Parameters failed validation before being written.
    #[error("invalid maintenance parameter")]
    InvalidParams {
        /// Field that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
}

impl MaintenanceError {
    /// Whether the failure happened after new parameters were already durable.
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        matches!(self, Self::Retire { .. })
    }
}
