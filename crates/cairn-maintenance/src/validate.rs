//! Validation applied by administrative tooling before parameters are written.

use std::time::Duration;

use crate::error::{MaintenanceError, MaintenanceResult};
use crate::model::{CycleParams, MaintenanceParams};

/// Check that `params` describe a schedule the maintenance runner can honour.
///
/// # Errors
///
/// Returns [`MaintenanceError::InvalidParams`] naming the first offending
/// field.
pub fn validate_params(params: &MaintenanceParams) -> MaintenanceResult<()> {
    validate_cycle(&params.quick_cycle, "quick.interval")?;
    validate_cycle(&params.full_cycle, "full.interval")?;

    if params.quick_cycle.enabled
        && params.full_cycle.enabled
        && params.quick_cycle.interval > params.full_cycle.interval
    {
        return Err(MaintenanceError::InvalidParams {
            field: "quick.interval",
            reason: "must not exceed the full cycle interval",
        });
    }

    if params.log_retention.max_age.is_zero() {
        return Err(MaintenanceError::InvalidParams {
            field: "logRetention.maxAge",
            reason: "must be positive",
        });
    }

    Ok(())
}

fn validate_cycle(cycle: &CycleParams, field: &'static str) -> MaintenanceResult<()> {
    if cycle.enabled && cycle.interval == Duration::ZERO {
        return Err(MaintenanceError::InvalidParams {
            field,
            reason: "must be positive when the cycle is enabled",
        });
    }
    Ok(())
}
