//! Command-line argument parsing and dispatch.

use std::path::PathBuf;
use std::time::Duration;

use cairn_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, log_format_from_str};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::client::{AppContext, CliResult, init_cli_logging};
use crate::commands::maintenance::{handle_maintenance_info, handle_maintenance_set};

/// Largest whole-second duration that still fits the nanosecond encoding of
/// stored parameters.
const MAX_DURATION_SECS: u64 = u64::MAX / 1_000_000_000;

/// Parses CLI arguments, executes the requested command, and reports any
/// failure on stderr. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    init_cli_logging(&cli);

    match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    let ctx = AppContext::open(&cli).await?;

    match cli.command {
        Command::Maintenance(maintenance) => match maintenance {
            MaintenanceCommand::Info => handle_maintenance_info(&ctx, cli.output).await,
            MaintenanceCommand::Set(args) => handle_maintenance_set(&ctx, &args, cli.output).await,
        },
    }
}

#[derive(Parser)]
#[command(name = "cairn", about = "Administrative CLI for Cairn repositories")]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "CAIRN_REPOSITORY",
        help = "Repository directory holding the manifest index"
    )]
    pub(crate) repository: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        env = "CAIRN_USERNAME",
        help = "Override the user name this client connects as"
    )]
    pub(crate) username: Option<String>,
    #[arg(
        long,
        global = true,
        env = "CAIRN_HOSTNAME",
        help = "Override the host name this client connects from"
    )]
    pub(crate) hostname: Option<String>,
    #[arg(long, global = true, env = "CAIRN_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub(crate) log_level: String,
    #[arg(
        long,
        global = true,
        env = "CAIRN_LOG_FORMAT",
        value_parser = parse_log_format,
        help = "Log output format (json or pretty)"
    )]
    pub(crate) log_format: Option<LogFormat>,
    #[arg(
        long = "output",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Inspect or change repository maintenance parameters.
    #[command(subcommand)]
    Maintenance(MaintenanceCommand),
}

#[derive(Subcommand)]
pub(crate) enum MaintenanceCommand {
    /// Show the effective maintenance parameters.
    Info,
    /// Change one or more maintenance parameters.
    Set(MaintenanceSetArgs),
}

#[derive(Args, Debug, Default, Clone)]
pub(crate) struct MaintenanceSetArgs {
    #[arg(long, help = "Maintenance owner: `me` or `user@host`")]
    pub(crate) owner: Option<String>,
    /// Enable or disable quick maintenance.
    #[arg(long, value_name = "BOOL")]
    pub(crate) enable_quick: Option<bool>,
    /// Interval between quick maintenance runs (e.g. `1h`, `1h30m`).
    #[arg(long, value_parser = parse_duration, value_name = "DURATION")]
    pub(crate) quick_interval: Option<Duration>,
    /// Enable or disable full maintenance.
    #[arg(long, value_name = "BOOL")]
    pub(crate) enable_full: Option<bool>,
    /// Interval between full maintenance runs (e.g. `24h`).
    #[arg(long, value_parser = parse_duration, value_name = "DURATION")]
    pub(crate) full_interval: Option<Duration>,
    /// Number of maintenance logs to keep.
    #[arg(long, value_name = "COUNT")]
    pub(crate) max_retained_log_count: Option<u32>,
    /// Age after which maintenance logs are removed (e.g. `30d`).
    #[arg(long, value_parser = parse_duration, value_name = "DURATION")]
    pub(crate) max_retained_log_age: Option<Duration>,
    /// Combined size of maintenance logs to keep, in megabytes.
    #[arg(long = "max-total-retained-log-size-mb", value_name = "MB")]
    pub(crate) max_total_retained_log_size_mb: Option<u64>,
}

impl MaintenanceSetArgs {
    pub(crate) const fn has_changes(&self) -> bool {
        self.owner.is_some()
            || self.enable_quick.is_some()
            || self.quick_interval.is_some()
            || self.enable_full.is_some()
            || self.full_interval.is_some()
            || self.max_retained_log_count.is_some()
            || self.max_retained_log_age.is_some()
            || self.max_total_retained_log_size_mb.is_some()
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Parse durations such as `90s`, `15m`, `1h30m` or `30d`.
pub(crate) fn parse_duration(raw: &str) -> Result<Duration, String> {
    let text = raw.trim();
    if text.is_empty() {
        return Err("duration must not be empty".to_string());
    }

    let mut total: u64 = 0;
    let mut digits = String::new();
    for ch in text.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        let unit_secs: u64 = match ch {
            's' => 1,
            'm' => 60,
            'h' => 3_600,
            'd' => 86_400,
            _ => return Err(format!("unknown duration unit `{ch}` in `{text}`")),
        };
        if digits.is_empty() {
            return Err(format!("missing number before `{ch}` in `{text}`"));
        }
        total = digits
            .parse::<u64>()
            .ok()
            .and_then(|amount| amount.checked_mul(unit_secs))
            .and_then(|secs| total.checked_add(secs))
            .filter(|secs| *secs <= MAX_DURATION_SECS)
            .ok_or_else(|| format!("duration `{text}` is out of range"))?;
        digits.clear();
    }
    if !digits.is_empty() {
        return Err(format!("duration `{text}` is missing a unit (s, m, h or d)"));
    }

    Ok(Duration::from_secs(total))
}

fn parse_log_format(raw: &str) -> Result<LogFormat, String> {
    log_format_from_str(raw).map_err(|err| format!("{err}: expected json or pretty"))
}
