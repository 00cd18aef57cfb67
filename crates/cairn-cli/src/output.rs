//! Output renderers and formatting helpers for CLI commands.

use std::time::Duration;

use anyhow::anyhow;
use cairn_maintenance::{CycleParams, MaintenanceParams};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

pub(crate) const BYTES_PER_MB: u64 = 1 << 20;

/// Effective maintenance state as seen by the connected client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MaintenanceInfo {
    pub(crate) params: MaintenanceParams,
    /// Whether parameters are stored, as opposed to defaults.
    pub(crate) customized: bool,
    pub(crate) client: String,
    pub(crate) owned_by_this_client: bool,
}

pub(crate) fn render_maintenance_info(
    info: &MaintenanceInfo,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(info)
                .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
            println!("{text}");
        }
        OutputFormat::Table => {
            for line in maintenance_lines(info) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn maintenance_lines(info: &MaintenanceInfo) -> Vec<String> {
    let params = &info.params;
    let retention = &params.log_retention;
    let owner = if params.owner.is_empty() {
        "<none>".to_string()
    } else if info.owned_by_this_client {
        format!("{} (this client)", params.owner)
    } else {
        params.owner.clone()
    };

    vec![
        format!("owner: {owner}"),
        format!("quick cycle: {}", describe_cycle(&params.quick_cycle)),
        format!("full cycle: {}", describe_cycle(&params.full_cycle)),
        format!(
            "log retention: count {}, age {}, total size {} MB",
            retention.max_count,
            format_duration(retention.max_age),
            retention.max_total_size / BYTES_PER_MB
        ),
        format!(
            "customized: {}",
            if info.customized { "yes" } else { "no (defaults)" }
        ),
        format!("client: {}", info.client),
    ]
}

fn describe_cycle(cycle: &CycleParams) -> String {
    if cycle.enabled {
        format!("enabled, every {}", format_duration(cycle.interval))
    } else {
        "disabled".to_string()
    }
}

/// Render a duration in the unit syntax accepted by `parse_duration`.
pub(crate) fn format_duration(duration: Duration) -> String {
    if duration.subsec_nanos() != 0 {
        return format!("{duration:?}");
    }
    let mut remaining = duration.as_secs();
    if remaining == 0 {
        return "0s".to_string();
    }

    let mut text = String::new();
    for (unit, secs) in [("d", 86_400), ("h", 3_600), ("m", 60), ("s", 1)] {
        let amount = remaining / secs;
        if amount > 0 {
            text.push_str(&amount.to_string());
            text.push_str(unit);
            remaining %= secs;
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::parse_duration;

    fn info(owner: &str, owned: bool) -> MaintenanceInfo {
        MaintenanceInfo {
            params: MaintenanceParams {
                owner: owner.to_string(),
                ..MaintenanceParams::default()
            },
            customized: !owner.is_empty(),
            client: "tester@ci-host".to_string(),
            owned_by_this_client: owned,
        }
    }

    #[test]
    fn durations_render_in_largest_units() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_secs(3_600)), "1h");
        assert_eq!(format_duration(Duration::from_secs(5_400)), "1h30m");
        assert_eq!(format_duration(Duration::from_secs(30 * 86_400)), "30d");
        assert_eq!(format_duration(Duration::from_millis(1_500)), "1.5s");
    }

    #[test]
    fn rendered_durations_parse_back() {
        for secs in [1, 59, 61, 3_601, 90_061] {
            let duration = Duration::from_secs(secs);
            assert_eq!(parse_duration(&format_duration(duration)), Ok(duration));
        }
    }

    #[test]
    fn table_marks_owner_and_defaults() {
        let lines = maintenance_lines(&info("", false));
        assert_eq!(lines[0], "owner: <none>");
        assert_eq!(lines[1], "quick cycle: enabled, every 1h");
        assert_eq!(lines[2], "full cycle: enabled, every 1d");
        assert_eq!(lines[3], "log retention: count 10000, age 30d, total size 1024 MB");
        assert_eq!(lines[4], "customized: no (defaults)");

        let owned = maintenance_lines(&info("tester@ci-host", true));
        assert_eq!(owned[0], "owner: tester@ci-host (this client)");
        assert_eq!(owned[4], "customized: yes");
    }

    #[test]
    fn disabled_cycles_omit_interval() {
        let mut info = info("", false);
        info.params.quick_cycle.enabled = false;
        assert_eq!(maintenance_lines(&info)[1], "quick cycle: disabled");
    }

    #[test]
    fn json_output_uses_stored_field_names() {
        let value = serde_json::to_value(info("a@b", false)).expect("serialize");
        assert_eq!(value["params"]["owner"], "a@b");
        assert_eq!(value["params"]["quick"]["interval"], 3_600_000_000_000_u64);
        assert_eq!(value["ownedByThisClient"], false);
        assert_eq!(value["client"], "tester@ci-host");
    }
}
