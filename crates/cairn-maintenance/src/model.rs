//! Maintenance parameter record persisted as a repository manifest.
//!
//! # Design
//! - Pure data carriers; persistence lives in `service.rs`.
//! - Durations are stored as integer nanoseconds to keep the document format
//!   compact and language neutral.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults::{
    FULL_CYCLE_INTERVAL, LOG_RETENTION_MAX_AGE, LOG_RETENTION_MAX_COUNT,
    LOG_RETENTION_MAX_TOTAL_SIZE, QUICK_CYCLE_INTERVAL,
};

/// Repository-wide maintenance configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceParams {
    /// `user@host` of the client expected to run maintenance. Advisory only.
    #[serde(default)]
    pub owner: String,
    /// Lightweight maintenance cycle. A missing section reads as disabled.
    #[serde(rename = "quick", default)]
    pub quick_cycle: CycleParams,
    /// Thorough maintenance cycle. A missing section reads as disabled.
    #[serde(rename = "full", default)]
    pub full_cycle: CycleParams,
    /// Retention limits for maintenance run logs.
    #[serde(rename = "logRetention", default)]
    pub log_retention: LogRetentionOptions,
}

impl Default for MaintenanceParams {
    /// Baseline used whenever the repository stores no parameters: both
    /// cycles enabled, quick hourly and full daily, no owner.
    fn default() -> Self {
        Self {
            owner: String::new(),
            quick_cycle: CycleParams::enabled_every(QUICK_CYCLE_INTERVAL),
            full_cycle: CycleParams::enabled_every(FULL_CYCLE_INTERVAL),
            log_retention: LogRetentionOptions::default(),
        }
    }
}

impl MaintenanceParams {
    /// Whether `username_at_host` is the recorded owner.
    #[must_use]
    pub fn is_owned_by(&self, username_at_host: &str) -> bool {
        self.owner == username_at_host
    }
}

/// Schedule for one maintenance cycle.
///
/// `Default` is the zero value stored documents fall back to for missing
/// fields: disabled, zero interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleParams {
    /// Whether the cycle runs at all.
    pub enabled: bool,
    /// Time between consecutive runs.
    #[serde(with = "duration_nanos")]
    pub interval: Duration,
}

impl CycleParams {
    /// Enabled cycle running every `interval`.
    #[must_use]
    pub const fn enabled_every(interval: Duration) -> Self {
        Self {
            enabled: true,
            interval,
        }
    }
}

/// How long maintenance logs are kept. Enforced by the log sweep, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRetentionOptions {
    /// Combined byte size above which the oldest logs are removed.
    pub max_total_size: u64,
    /// Number of logs above which the oldest are removed.
    pub max_count: u32,
    /// Age after which logs are removed.
    #[serde(with = "duration_nanos")]
    pub max_age: Duration,
}

impl Default for LogRetentionOptions {
    fn default() -> Self {
        Self {
            max_total_size: LOG_RETENTION_MAX_TOTAL_SIZE,
            max_count: LOG_RETENTION_MAX_COUNT,
            max_age: LOG_RETENTION_MAX_AGE,
        }
    }
}

mod duration_nanos {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, ser::Error as _};

    pub(super) fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let nanos = u64::try_from(value.as_nanos())
            .map_err(|_| S::Error::custom("duration exceeds u64 nanoseconds"))?;
        serializer.serialize_u64(nanos)
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_nanos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_record_matches_baseline() {
        let params = MaintenanceParams::default();
        assert!(params.owner.is_empty());
        assert!(params.quick_cycle.enabled);
        assert_eq!(params.quick_cycle.interval, Duration::from_secs(3_600));
        assert!(params.full_cycle.enabled);
        assert_eq!(params.full_cycle.interval, Duration::from_secs(86_400));
        assert_eq!(params.log_retention, LogRetentionOptions::default());
    }

    #[test]
    fn document_uses_short_keys_and_nanosecond_intervals() {
        let params = MaintenanceParams {
            owner: "alice@vault".to_string(),
            ..MaintenanceParams::default()
        };
        let value = serde_json::to_value(&params).expect("params should serialize");
        assert_eq!(value["owner"], "alice@vault");
        assert_eq!(value["quick"]["enabled"], true);
        assert_eq!(value["quick"]["interval"], 3_600_000_000_000_u64);
        assert_eq!(value["full"]["interval"], 86_400_000_000_000_u64);
        assert_eq!(value["logRetention"]["maxCount"], 10_000);
        assert_eq!(value["logRetention"]["maxTotalSize"], 1_u64 << 30);
    }

    #[test]
    fn missing_optional_sections_fall_back_to_defaults() {
        let params: MaintenanceParams = serde_json::from_value(json!({
            "quick": {"enabled": false, "interval": 1_000_000_000},
            "full": {"enabled": true, "interval": 2_000_000_000},
        }))
        .expect("params should decode");
        assert!(params.owner.is_empty());
        assert!(!params.quick_cycle.enabled);
        assert_eq!(params.full_cycle.interval, Duration::from_secs(2));
        assert_eq!(params.log_retention, LogRetentionOptions::default());
    }

    #[test]
    fn missing_cycle_sections_decode_as_disabled() {
        let params: MaintenanceParams = serde_json::from_value(json!({
            "owner": "alice@vault",
            "quick": {"interval": 60_000_000_000_u64},
        }))
        .expect("partial document should decode");
        assert!(!params.quick_cycle.enabled);
        assert_eq!(params.quick_cycle.interval, Duration::from_secs(60));
        assert_eq!(params.full_cycle, CycleParams::default());
        assert!(!params.full_cycle.enabled);
        assert_eq!(params.full_cycle.interval, Duration::ZERO);
    }

    #[test]
    fn negative_interval_is_rejected() {
        let result = serde_json::from_value::<CycleParams>(json!({
            "enabled": true,
            "interval": -5,
        }));
        assert!(result.is_err());
    }

    #[test]
    fn ownership_requires_exact_match() {
        let params = MaintenanceParams {
            owner: "alice@vault".to_string(),
            ..MaintenanceParams::default()
        };
        assert!(params.is_owned_by("alice@vault"));
        assert!(!params.is_owned_by("alice@Vault"));
        assert!(!MaintenanceParams::default().is_owned_by("alice@vault"));
    }
}
