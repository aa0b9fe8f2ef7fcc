//! Desired-state validation helpers for controls.

use std::collections::BTreeSet;

use crate::compare::{CompareOptions, ComparisonPolicy};
use crate::error::ControlError;
use crate::types::value::ConfigValue;

/// Checks the comparison options imply for `desired`: identity-keyed
/// controls need unique instance keys.
pub fn validate_for_options(
    control: &str,
    desired: &ConfigValue,
    options: &CompareOptions,
) -> Result<(), ControlError> {
    if options.policy == ComparisonPolicy::IdentityKeyed {
        ensure_unique_instance_keys(control, desired, &options.instance_key)?;
    }
    Ok(())
}

/// Reject a desired sequence of records whose instance keys repeat.
///
/// Identity-keyed comparison matches records by key, so duplicates would make
/// the drift ambiguous. Non-sequence values and records without the key pass;
/// the comparator reports missing keys itself.
pub fn ensure_unique_instance_keys(
    control: &str,
    desired: &ConfigValue,
    instance_key: &str,
) -> Result<(), ControlError> {
    let Some(records) = desired.as_sequence() else {
        return Ok(());
    };
    let mut seen = BTreeSet::new();
    for key in records.iter().filter_map(|r| r.get(instance_key)) {
        if !seen.insert(key) {
            return Err(ControlError::Validation {
                control: control.to_string(),
                message: format!("duplicate {} '{}' in desired state", instance_key, key),
            });
        }
    }
    Ok(())
}
