//! Shared repository context, error types, and logging wiring for the CLI.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use anyhow::anyhow;
use cairn_maintenance::{MaintenanceError, MaintenanceService};
use cairn_manifest::{ClientIdentity, FsManifestIndex, Repository};
use cairn_telemetry::{LogFormat, LoggingConfig, init_logging};
use tracing::debug;

use crate::cli::Cli;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    /// Classify a store error: rejected parameters are the caller's fault,
    /// everything else is operational.
    pub(crate) fn from_maintenance(error: MaintenanceError) -> Self {
        match error {
            MaintenanceError::InvalidParams { field, reason } => {
                Self::validation(format!("invalid value for {field}: {reason}"))
            }
            other if other.is_committed() => Self::failure(anyhow::Error::new(other).context(
                "new maintenance parameters were saved but an older entry could not be removed",
            )),
            other => Self::failure(other),
        }
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

/// Repository connection shared by command handlers.
pub(crate) struct AppContext {
    pub(crate) service: MaintenanceService,
}

impl AppContext {
    /// Open the filesystem-backed repository named on the command line.
    pub(crate) async fn open(cli: &Cli) -> CliResult<Self> {
        let root = cli.repository.as_ref().ok_or_else(|| {
            CliError::validation(
                "repository path is required (pass --repository or set CAIRN_REPOSITORY)",
            )
        })?;

        let index = FsManifestIndex::open(root).await.map_err(|err| {
            CliError::failure(anyhow!(
                "failed to open repository at {}: {err}",
                root.display()
            ))
        })?;
        let identity = resolve_identity(cli.username.as_deref(), cli.hostname.as_deref());
        debug!(repository = %root.display(), identity = %identity, "opened repository");

        Ok(Self::new(Repository::new(Arc::new(index), identity)))
    }

    pub(crate) const fn new(repo: Repository) -> Self {
        Self {
            service: MaintenanceService::new(repo),
        }
    }

    pub(crate) const fn identity(&self) -> &ClientIdentity {
        self.service.repository().identity()
    }
}

/// Environment-discovered identity with any command-line overrides applied.
pub(crate) fn resolve_identity(username: Option<&str>, hostname: Option<&str>) -> ClientIdentity {
    let discovered = ClientIdentity::from_env();
    ClientIdentity::new(
        override_or(username, discovered.username),
        override_or(hostname, discovered.hostname),
    )
}

fn override_or(value: Option<&str>, fallback: String) -> String {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map_or(fallback, str::to_string)
}

/// Install the tracing subscriber; the CLI keeps working without logs.
pub(crate) fn init_cli_logging(cli: &Cli) {
    let config = LoggingConfig {
        level: &cli.log_level,
        format: cli.log_format.unwrap_or_else(LogFormat::infer),
        build_sha: option_env!("CAIRN_BUILD_SHA").unwrap_or("dev"),
    };
    if let Err(err) = init_logging(&config) {
        eprintln!("warning: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_manifest::ManifestError;

    #[test]
    fn exit_codes_separate_validation_from_failure() {
        let validation = CliError::validation("bad flag");
        assert_eq!(validation.exit_code(), 2);
        assert_eq!(validation.display_message(), "bad flag");

        let failure = CliError::failure(anyhow!("disk on fire"));
        assert_eq!(failure.exit_code(), 3);
        assert_eq!(failure.display_message(), "disk on fire");
    }

    #[test]
    fn invalid_params_map_to_validation_errors() {
        let err = CliError::from_maintenance(MaintenanceError::InvalidParams {
            field: "quick.interval",
            reason: "must be positive when the cycle is enabled",
        });
        assert_eq!(err.exit_code(), 2);
        assert!(err.display_message().contains("quick.interval"));
    }

    #[test]
    fn store_failures_keep_their_cause_chain() {
        let err = CliError::from_maintenance(MaintenanceError::Commit {
            source: ManifestError::backend("put", "quota exceeded"),
        });
        assert_eq!(err.exit_code(), 3);
        let message = err.display_message();
        assert!(message.starts_with("error writing maintenance manifest"));
        assert!(message.contains("manifest backend failure"));
    }

    #[test]
    fn retire_failures_say_the_write_took_effect() {
        let err = CliError::from_maintenance(MaintenanceError::Retire {
            manifest_id: "old".into(),
            committed: "new".into(),
            source: ManifestError::backend("delete", "denied"),
        });
        assert_eq!(err.exit_code(), 3);
        assert!(err.display_message().contains("were saved"));
    }

    #[test]
    fn identity_overrides_replace_discovered_parts() {
        let identity = resolve_identity(Some("ops"), Some("bastion"));
        assert_eq!(identity.username_at_host(), "ops@bastion");

        let discovered = ClientIdentity::from_env();
        let partial = resolve_identity(Some("  "), Some("bastion"));
        assert_eq!(partial.username, discovered.username);
        assert_eq!(partial.hostname, "bastion");
    }
}
