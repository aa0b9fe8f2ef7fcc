use std::collections::BTreeSet;

use tracing::trace;

use super::{keyed, ComparisonPolicy, Drift};
use crate::error::ComparisonError;
use crate::types::value::{ConfigValue, Mapping};

/// Recursive dispatch on the shapes of both nodes.
pub(crate) fn diff_node(
    current: &ConfigValue,
    desired: &ConfigValue,
    policy: ComparisonPolicy,
    instance_key: &str,
) -> Result<Drift, ComparisonError> {
    match (current, desired) {
        (ConfigValue::Mapping(c), ConfigValue::Mapping(d)) => {
            diff_mappings(c, d, policy, instance_key)
        }
        (ConfigValue::Sequence(c), ConfigValue::Sequence(d)) => {
            diff_sequences(c, d, policy, instance_key)
        }
        (ConfigValue::Scalar(c), ConfigValue::Scalar(d)) if c.kind() == d.kind() => {
            if current == desired {
                Ok(Drift::none())
            } else {
                Ok(Drift::replace(current, desired))
            }
        }
        _ => {
            trace!(current = %current.kind(), desired = %desired.kind(), "type mismatch");
            Ok(Drift::replace(current, desired))
        }
    }
}

fn diff_mappings(
    current: &Mapping,
    desired: &Mapping,
    policy: ComparisonPolicy,
    instance_key: &str,
) -> Result<Drift, ComparisonError> {
    if current.is_empty() && desired.is_empty() {
        return Ok(Drift::none());
    }

    let nested = policy.nested();
    let keys: BTreeSet<&String> = current.keys().chain(desired.keys()).collect();
    let mut current_out = Mapping::new();
    let mut desired_out = Mapping::new();
    let mut identity: Option<(&String, &ConfigValue, &ConfigValue)> = None;
    let mut identity_differs = false;

    for key in keys {
        match (current.get(key), desired.get(key)) {
            (Some(c), Some(d)) => {
                if policy == ComparisonPolicy::IdentityKeyed && key == instance_key {
                    identity = Some((key, c, d));
                    identity_differs = c != d;
                    continue;
                }
                let (c_drift, d_drift) = diff_node(c, d, nested, instance_key)?.into_parts();
                if c_drift.is_some() || d_drift.is_some() {
                    current_out.insert(key.clone(), c_drift.unwrap_or_else(ConfigValue::null));
                    desired_out.insert(key.clone(), d_drift.unwrap_or_else(ConfigValue::null));
                }
            }
            (Some(c), None) => {
                current_out.insert(key.clone(), c.clone());
            }
            (None, Some(d)) => {
                desired_out.insert(key.clone(), d.clone());
            }
            (None, None) => {}
        }
    }

    if current_out.is_empty() && desired_out.is_empty() && !identity_differs {
        return Ok(Drift::none());
    }

    // The instance key identifies the record; it rides along only when the
    // record drifted. A differing key is itself drift.
    if let Some((key, c, d)) = identity {
        current_out.insert(key.clone(), c.clone());
        desired_out.insert(key.clone(), d.clone());
    }

    Ok(Drift {
        current: non_empty(current_out),
        desired: non_empty(desired_out),
    })
}

fn non_empty(map: Mapping) -> Option<ConfigValue> {
    if map.is_empty() {
        None
    } else {
        Some(ConfigValue::Mapping(map))
    }
}

fn diff_sequences(
    current: &[ConfigValue],
    desired: &[ConfigValue],
    policy: ComparisonPolicy,
    instance_key: &str,
) -> Result<Drift, ComparisonError> {
    if current.is_empty() && desired.is_empty() {
        return Ok(Drift::none());
    }

    match policy {
        ComparisonPolicy::IdentityKeyed
            if current.iter().chain(desired).all(ConfigValue::is_mapping) =>
        {
            keyed::merge_by_instance_key(current, desired, instance_key)
        }
        ComparisonPolicy::CompareInOrder => {
            if current == desired {
                Ok(Drift::none())
            } else {
                Ok(Drift::replace(
                    &ConfigValue::Sequence(current.to_vec()),
                    &ConfigValue::Sequence(desired.to_vec()),
                ))
            }
        }
        _ => {
            if sorted_copy(current) == sorted_copy(desired) {
                Ok(Drift::none())
            } else {
                Ok(Drift::replace(
                    &ConfigValue::Sequence(current.to_vec()),
                    &ConfigValue::Sequence(desired.to_vec()),
                ))
            }
        }
    }
}

fn sorted_copy(items: &[ConfigValue]) -> Vec<ConfigValue> {
    let mut sorted: Vec<ConfigValue> = items.iter().map(ConfigValue::deep_sorted).collect();
    sorted.sort();
    sorted
}
