use cairn_maintenance::{MaintenanceFacade, MaintenanceParams, validate_params};
use cairn_manifest::ClientIdentity;
use tracing::info;

use crate::cli::{MaintenanceSetArgs, OutputFormat};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{BYTES_PER_MB, MaintenanceInfo, render_maintenance_info};

const OWNER_SELF: &str = "me";

pub(crate) async fn handle_maintenance_info(
    ctx: &AppContext,
    format: OutputFormat,
) -> CliResult<()> {
    let info = load_info(ctx).await?;
    render_maintenance_info(&info, format)
}

pub(crate) async fn handle_maintenance_set(
    ctx: &AppContext,
    args: &MaintenanceSetArgs,
    format: OutputFormat,
) -> CliResult<()> {
    if !args.has_changes() {
        return Err(CliError::validation(
            "no maintenance parameters specified (see `cairn maintenance set --help`)",
        ));
    }

    let current = ctx
        .service
        .get_params()
        .await
        .map_err(CliError::from_maintenance)?;
    let updated = apply_changes(current, args, ctx.identity())?;
    validate_params(&updated).map_err(CliError::from_maintenance)?;

    ctx.service
        .set_params(&updated)
        .await
        .map_err(CliError::from_maintenance)?;
    info!(owner = %updated.owner, "maintenance parameters changed from cli");

    let info = load_info(ctx).await?;
    render_maintenance_info(&info, format)
}

async fn load_info(ctx: &AppContext) -> CliResult<MaintenanceInfo> {
    let params = ctx
        .service
        .get_params()
        .await
        .map_err(CliError::from_maintenance)?;
    let customized = ctx
        .service
        .has_params()
        .await
        .map_err(CliError::from_maintenance)?;
    let owned_by_this_client = ctx
        .service
        .is_owned_by_this_user()
        .await
        .map_err(CliError::from_maintenance)?;

    Ok(MaintenanceInfo {
        params,
        customized,
        client: ctx.identity().username_at_host(),
        owned_by_this_client,
    })
}

/// Overlay the flags that were passed onto the current parameters.
fn apply_changes(
    mut params: MaintenanceParams,
    args: &MaintenanceSetArgs,
    identity: &ClientIdentity,
) -> CliResult<MaintenanceParams> {
    if let Some(owner) = args.owner.as_deref() {
        params.owner = resolve_owner(owner, identity)?;
    }
    if let Some(enabled) = args.enable_quick {
        params.quick_cycle.enabled = enabled;
    }
    if let Some(interval) = args.quick_interval {
        params.quick_cycle.interval = interval;
    }
    if let Some(enabled) = args.enable_full {
        params.full_cycle.enabled = enabled;
    }
    if let Some(interval) = args.full_interval {
        params.full_cycle.interval = interval;
    }
    if let Some(count) = args.max_retained_log_count {
        params.log_retention.max_count = count;
    }
    if let Some(age) = args.max_retained_log_age {
        params.log_retention.max_age = age;
    }
    if let Some(megabytes) = args.max_total_retained_log_size_mb {
        params.log_retention.max_total_size =
            megabytes.checked_mul(BYTES_PER_MB).ok_or_else(|| {
                CliError::validation("--max-total-retained-log-size-mb is too large")
            })?;
    }
    Ok(params)
}

/// `me` stands for the connected client; anything else must be `user@host`.
fn resolve_owner(raw: &str, identity: &ClientIdentity) -> CliResult<String> {
    let owner = raw.trim();
    if owner == OWNER_SELF {
        return Ok(identity.username_at_host());
    }
    match owner.split_once('@') {
        Some((user, host)) if !user.is_empty() && !host.is_empty() && !host.contains('@') => {
            Ok(owner.to_string())
        }
        _ => Err(CliError::validation(format!(
            "invalid owner `{owner}`: expected `{OWNER_SELF}` or `user@host`"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use cairn_test_support::fixtures::{memory_repository, test_identity};
    use clap::Parser;
    use std::time::Duration;

    fn context() -> AppContext {
        let (_, repo) = memory_repository(test_identity());
        AppContext::new(repo)
    }

    #[test]
    fn owner_me_resolves_to_connected_identity() {
        let identity = test_identity();
        assert_eq!(
            resolve_owner("me", &identity).ok().as_deref(),
            Some("tester@ci-host")
        );
        assert_eq!(
            resolve_owner("ops@bastion", &identity).ok().as_deref(),
            Some("ops@bastion")
        );
        for invalid in ["", "ops", "@host", "ops@", "a@b@c"] {
            let err = resolve_owner(invalid, &identity).expect_err("owner should be rejected");
            assert_eq!(err.exit_code(), 2);
        }
    }

    #[test]
    fn only_passed_flags_change_parameters() {
        let args = MaintenanceSetArgs {
            enable_full: Some(false),
            max_retained_log_age: Some(Duration::from_secs(7 * 86_400)),
            max_total_retained_log_size_mb: Some(64),
            ..MaintenanceSetArgs::default()
        };
        let updated = apply_changes(MaintenanceParams::default(), &args, &test_identity())
            .expect("changes apply");

        let defaults = MaintenanceParams::default();
        assert_eq!(updated.quick_cycle, defaults.quick_cycle);
        assert!(!updated.full_cycle.enabled);
        assert_eq!(updated.full_cycle.interval, defaults.full_cycle.interval);
        assert_eq!(
            updated.log_retention.max_age,
            Duration::from_secs(7 * 86_400)
        );
        assert_eq!(updated.log_retention.max_total_size, 64 * BYTES_PER_MB);
        assert_eq!(updated.log_retention.max_count, defaults.log_retention.max_count);
        assert!(updated.owner.is_empty());
    }

    #[test]
    fn oversized_log_size_is_a_validation_error() {
        let args = MaintenanceSetArgs {
            max_total_retained_log_size_mb: Some(u64::MAX),
            ..MaintenanceSetArgs::default()
        };
        let Err(err) = apply_changes(MaintenanceParams::default(), &args, &test_identity()) else {
            panic!("overflow should be rejected");
        };
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn set_persists_changes_and_claims_ownership() {
        let ctx = context();
        let args = MaintenanceSetArgs {
            owner: Some("me".to_string()),
            quick_interval: Some(Duration::from_secs(1_800)),
            ..MaintenanceSetArgs::default()
        };

        assert!(
            handle_maintenance_set(&ctx, &args, OutputFormat::Json)
                .await
                .is_ok()
        );

        let stored = ctx.service.get_params().await.expect("read back");
        assert_eq!(stored.owner, "tester@ci-host");
        assert_eq!(stored.quick_cycle.interval, Duration::from_secs(1_800));
        assert!(ctx.service.has_params().await.expect("has params"));
        assert!(ctx.service.is_owned_by_this_user().await.expect("owner"));
    }

    #[tokio::test]
    async fn set_rejects_invalid_schedule_without_writing() {
        let ctx = context();
        let args = MaintenanceSetArgs {
            quick_interval: Some(Duration::from_secs(2 * 86_400)),
            ..MaintenanceSetArgs::default()
        };

        let Err(err) = handle_maintenance_set(&ctx, &args, OutputFormat::Table).await else {
            panic!("quick slower than full should be rejected");
        };
        assert_eq!(err.exit_code(), 2);
        assert!(!ctx.service.has_params().await.expect("has params"));
    }

    #[tokio::test]
    async fn set_without_flags_is_rejected() {
        let ctx = context();
        let Err(err) =
            handle_maintenance_set(&ctx, &MaintenanceSetArgs::default(), OutputFormat::Table)
                .await
        else {
            panic!("empty set should be rejected");
        };
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn info_reports_defaults_on_empty_repository() {
        let ctx = context();
        let info = load_info(&ctx).await.expect("info");
        assert_eq!(info.params, MaintenanceParams::default());
        assert!(!info.customized);
        assert!(!info.owned_by_this_client);
        assert_eq!(info.client, "tester@ci-host");
        assert!(
            handle_maintenance_info(&ctx, OutputFormat::Table)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn filesystem_repository_is_shared_between_invocations() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = dir.path().to_string_lossy().into_owned();
        let open_as = |user: &str| {
            Cli::try_parse_from([
                "cairn",
                "--repository",
                repo.as_str(),
                "--username",
                user,
                "--hostname",
                "ci-host",
                "maintenance",
                "info",
            ])
            .expect("arguments should parse")
        };

        let alice = AppContext::open(&open_as("alice")).await.expect("open");
        let args = MaintenanceSetArgs {
            owner: Some("me".to_string()),
            ..MaintenanceSetArgs::default()
        };
        assert!(
            handle_maintenance_set(&alice, &args, OutputFormat::Table)
                .await
                .is_ok()
        );

        let bob = AppContext::open(&open_as("bob")).await.expect("open");
        let info = load_info(&bob).await.expect("info");
        assert!(info.customized);
        assert_eq!(info.params.owner, "alice@ci-host");
        assert!(!info.owned_by_this_client);
        assert!(load_info(&alice).await.expect("info").owned_by_this_client);
    }

    #[tokio::test]
    async fn missing_repository_is_a_validation_error() {
        let cli = Cli::try_parse_from(["cairn", "maintenance", "info"]).expect("parse");
        if cli.repository.is_some() {
            // CAIRN_REPOSITORY is set in the environment running the tests.
            return;
        }
        let Err(err) = AppContext::open(&cli).await else {
            panic!("opening without a repository should fail");
        };
        assert_eq!(err.exit_code(), 2);
    }
}
