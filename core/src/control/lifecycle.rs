//! Shared compliance/remediation state machine.
//!
//! ```text
//! check_compliance:  get -> [SKIPPED] ............ SKIPPED
//!                        -> errors .............. FAILED(errors)
//!                        -> diff -> empty ....... COMPLIANT
//!                                -> drift ....... NON_COMPLIANT(current, desired)
//!
//! remediate:         check -> FAILED | ERROR .... FAILED(errors)
//!                          -> COMPLIANT ......... SKIPPED("Control already compliant")
//!                          -> SKIPPED ........... SKIPPED("Remediation skipped ...")
//!                          -> NON_COMPLIANT -> set -> ok ........... status(old, new)
//!                                                  -> SKIPPED+errors  SKIPPED(errors, drift)
//!                                                  -> errors ....... FAILED(errors)
//! ```
//!
//! Transport failures from `get`/`set` become reports. Comparator and
//! validation errors propagate as `ControlError`.

use tracing::{debug, info, warn};

use super::report::{ComplianceReport, RemediateReport};
use super::{is_skip_sentinel, Control};
use crate::compare;
use crate::error::ControlError;
use crate::types::status::{ComplianceStatus, RemediateStatus};
use crate::types::value::ConfigValue;

pub const ALREADY_COMPLIANT: &str = "Control already compliant";
pub const CHECK_SKIPPED: &str = "Remediation skipped as check compliance is skipped";

pub fn check_compliance<C, T>(
    control: &T,
    ctx: &mut C,
    desired: &ConfigValue,
) -> Result<ComplianceReport, ControlError>
where
    C: ?Sized,
    T: Control<C> + ?Sized,
{
    let descriptor = control.descriptor();
    control.validate_desired(desired)?;

    debug!(control = %descriptor.name, product = %descriptor.product, "fetching current configuration");
    let (current, errors) = control.get(ctx);

    if is_skip_sentinel(&errors) {
        info!(control = %descriptor.name, product = %descriptor.product, "control not applicable, skipping");
        return Ok(ComplianceReport::skipped());
    }
    if !errors.is_empty() {
        warn!(control = %descriptor.name, product = %descriptor.product, ?errors, "fetching current configuration failed");
        return Ok(ComplianceReport::failed(errors));
    }

    let drift = compare::diff(&current, desired, &control.compare_options())?;
    let report = if drift.is_empty() {
        ComplianceReport::compliant()
    } else {
        ComplianceReport::non_compliant(drift)
    };
    info!(control = %descriptor.name, product = %descriptor.product, status = %report.status, "compliance checked");
    Ok(report)
}

pub fn remediate<C, T>(
    control: &T,
    ctx: &mut C,
    desired: &ConfigValue,
) -> Result<RemediateReport, ControlError>
where
    C: ?Sized,
    T: Control<C> + ?Sized,
{
    let descriptor = control.descriptor();
    let previous = control.check_compliance(ctx, desired)?;

    match previous.status {
        ComplianceStatus::Failed | ComplianceStatus::Error => {
            Ok(RemediateReport::failed(previous.errors))
        }
        ComplianceStatus::Compliant => Ok(RemediateReport::skipped(vec![ALREADY_COMPLIANT.to_string()])),
        ComplianceStatus::Skipped => Ok(RemediateReport::skipped(vec![CHECK_SKIPPED.to_string()])),
        ComplianceStatus::NonCompliant => {
            if previous.current.is_none() && previous.desired.is_none() {
                return Err(ControlError::Terminal {
                    control: descriptor.qualified_name(),
                    message: "NON_COMPLIANT reported without any drift".to_string(),
                });
            }

            info!(control = %descriptor.name, product = %descriptor.product, "applying desired configuration");
            let (status, errors) = control.set(ctx, desired);

            if errors.is_empty() {
                info!(control = %descriptor.name, product = %descriptor.product, %status, "remediation finished");
                Ok(RemediateReport::applied(status, previous.current, previous.desired))
            } else if status == RemediateStatus::Skipped {
                info!(control = %descriptor.name, product = %descriptor.product, ?errors, "remediation skipped by control");
                Ok(RemediateReport {
                    errors,
                    current: previous.current,
                    desired: previous.desired,
                    ..RemediateReport::with_status(RemediateStatus::Skipped)
                })
            } else {
                warn!(control = %descriptor.name, product = %descriptor.product, ?errors, "remediation failed");
                Ok(RemediateReport::failed(errors))
            }
        }
    }
}
