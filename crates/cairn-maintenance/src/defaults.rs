//! Default label set, cycle intervals and log retention limits.
//!
//! # Design
//! - Centralize defaults so readers falling back on them and writers
//!   validating against them agree.
//! - Keep time-based defaults explicit for auditability.

use std::time::Duration;

/// Label key used to classify manifests.
pub const MANIFEST_TYPE_LABEL: &str = "type";
/// Label value identifying the maintenance parameters manifest.
pub const MAINTENANCE_MANIFEST_TYPE: &str = "maintenance";

/// Interval between quick maintenance cycles.
pub const QUICK_CYCLE_INTERVAL: Duration = Duration::from_secs(60 * 60);
/// Interval between full maintenance cycles.
pub const FULL_CYCLE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Upper bound on the combined size of retained maintenance logs.
pub const LOG_RETENTION_MAX_TOTAL_SIZE: u64 = 1 << 30;
/// Upper bound on the number of retained maintenance logs.
pub const LOG_RETENTION_MAX_COUNT: u32 = 10_000;
/// Maximum age of retained maintenance logs.
pub const LOG_RETENTION_MAX_AGE: Duration = Duration::from_secs(30 * 24 * 60 * 60);
