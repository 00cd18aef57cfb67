//! # Design
//!
//! - Constant error messages; identifiers, paths and operations travel as fields.
//! - Preserve source errors without interpolating context into messages.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::model::ManifestId;

/// Result alias for manifest index operations.
pub type ManifestResult<T> = Result<T, ManifestError>;

/// Errors raised by manifest index backends.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The requested manifest entry does not exist.
    #[error("manifest entry not found")]
    NotFound {
        /// Identifier that was requested.
        id: ManifestId,
    },
    /// IO failure while interacting with the backing directory.
    #[error("manifest io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Payload or document (de)serialization failed.
    #[error("manifest json failure")]
    Json {
        /// Operation that triggered the JSON failure.
        operation: &'static str,
        /// Underlying serde error.
        source: serde_json::Error,
    },
    /// Backend-specific failure without a richer source.
    #[error("manifest backend failure")]
    Backend {
        /// Operation that failed.
        operation: &'static str,
        /// Human-readable detail.
        detail: String,
    },
}

impl ManifestError {
    /// Build a backend failure for the given operation.
    #[must_use]
    pub fn backend(operation: &'static str, detail: impl Into<String>) -> Self {
        Self::Backend {
            operation,
            detail: detail.into(),
        }
    }

    /// Whether the error reports a missing entry.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
