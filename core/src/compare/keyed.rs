//! Identity-keyed merge of two sequences of records.
//!
//! Both sides are sorted by instance key and walked like a sorted merge-join.
//! The outputs are positionally aligned: a `null` placeholder on one side
//! lines up with the contributing record on the other. Records present on only
//! one side come first, in ascending key order, followed by the records that
//! exist on both sides but drifted, also in ascending key order.

use std::cmp::Ordering;

use super::structural::diff_node;
use super::{ComparisonPolicy, Drift, Side};
use crate::error::ComparisonError;
use crate::types::value::ConfigValue;

/// A record together with its instance-key value.
type Keyed<'a> = (&'a ConfigValue, &'a ConfigValue);

pub(crate) fn merge_by_instance_key(
    current: &[ConfigValue],
    desired: &[ConfigValue],
    instance_key: &str,
) -> Result<Drift, ComparisonError> {
    let mut current = keyed_records(current, instance_key, Side::Current)?;
    let mut desired = keyed_records(desired, instance_key, Side::Desired)?;
    ensure_single_key_kind(&current, &desired, instance_key)?;

    // Stable sorts: duplicates keep their input order.
    current.sort_by(|a, b| a.0.cmp(b.0));
    desired.sort_by(|a, b| a.0.cmp(b.0));

    let mut current_out = Vec::new();
    let mut desired_out = Vec::new();
    let mut changed_current = Vec::new();
    let mut changed_desired = Vec::new();
    let (mut i, mut j) = (0, 0);

    loop {
        let ordering = match (current.get(i), desired.get(j)) {
            (None, None) => break,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some((ck, _)), Some((dk, _))) => ck.cmp(dk),
        };
        match ordering {
            Ordering::Less => {
                current_out.push(current[i].1.clone());
                desired_out.push(ConfigValue::null());
                i += 1;
            }
            Ordering::Greater => {
                current_out.push(ConfigValue::null());
                desired_out.push(desired[j].1.clone());
                j += 1;
            }
            Ordering::Equal => {
                let (c, d) = (current[i].1, desired[j].1);
                if c != d {
                    // Mapping-level identity handling keeps the key in both
                    // fragments; anything nested compares sorted.
                    let drift = diff_node(c, d, ComparisonPolicy::IdentityKeyed, instance_key)?;
                    if let (Some(c_drift), Some(d_drift)) = drift.into_parts() {
                        changed_current.push(c_drift);
                        changed_desired.push(d_drift);
                    }
                }
                i += 1;
                j += 1;
            }
        }
    }

    current_out.extend(changed_current);
    desired_out.extend(changed_desired);

    if current_out.is_empty() {
        return Ok(Drift::none());
    }
    Ok(Drift {
        current: Some(ConfigValue::Sequence(current_out)),
        desired: Some(ConfigValue::Sequence(desired_out)),
    })
}

fn keyed_records<'a>(
    records: &'a [ConfigValue],
    instance_key: &str,
    side: Side,
) -> Result<Vec<Keyed<'a>>, ComparisonError> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            record
                .get(instance_key)
                .map(|key| (key, record))
                .ok_or_else(|| ComparisonError::MissingInstanceKey {
                    key: instance_key.to_string(),
                    side,
                    index,
                })
        })
        .collect()
}

/// Keys of different kinds (say a number and a string) have no meaningful
/// relative order, so the merge refuses them instead of inventing one.
fn ensure_single_key_kind(
    current: &[Keyed<'_>],
    desired: &[Keyed<'_>],
    instance_key: &str,
) -> Result<(), ComparisonError> {
    let mut kinds = current.iter().chain(desired).map(|(key, _)| key.kind());
    let Some(first) = kinds.next() else {
        return Ok(());
    };
    match kinds.find(|kind| *kind != first) {
        Some(other) => Err(ComparisonError::IncomparableInstanceKeys {
            key: instance_key.to_string(),
            left: first,
            right: other,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::value::ValueKind;
    use serde_json::json;

    fn records(value: serde_json::Value) -> Vec<ConfigValue> {
        match ConfigValue::from(value) {
            ConfigValue::Sequence(items) => items,
            other => panic!("expected a sequence, got {}", other),
        }
    }

    fn v(value: serde_json::Value) -> ConfigValue {
        ConfigValue::from(value)
    }

    #[test]
    fn equal_records_contribute_nothing() {
        let current = records(json!([{"name": "b", "v": 1}, {"name": "a", "v": 1}]));
        let desired = records(json!([{"name": "a", "v": 1.0}, {"name": "b", "v": 1}]));
        assert!(merge_by_instance_key(&current, &desired, "name").unwrap().is_empty());
    }

    #[test]
    fn records_equal_up_to_nested_order_contribute_nothing() {
        let current = records(json!([{"name": "a", "tags": ["x", "y"]}]));
        let desired = records(json!([{"name": "a", "tags": ["y", "x"]}]));
        assert!(merge_by_instance_key(&current, &desired, "name").unwrap().is_empty());
    }

    #[test]
    fn drifted_record_is_pruned_but_keeps_identity() {
        let current = records(json!([{"name": "pool", "size": 4, "mode": "auto"}]));
        let desired = records(json!([{"name": "pool", "size": 8, "mode": "auto"}]));
        let drift = merge_by_instance_key(&current, &desired, "name").unwrap();
        assert_eq!(drift.current, Some(v(json!([{"name": "pool", "size": 4}]))));
        assert_eq!(drift.desired, Some(v(json!([{"name": "pool", "size": 8}]))));
    }

    #[test]
    fn one_sided_records_align_with_null() {
        let current = records(json!([]));
        let desired = records(json!([{"name": "b"}, {"name": "a"}]));
        let drift = merge_by_instance_key(&current, &desired, "name").unwrap();
        assert_eq!(drift.current, Some(v(json!([null, null]))));
        assert_eq!(drift.desired, Some(v(json!([{"name": "a"}, {"name": "b"}]))));
    }

    #[test]
    fn numeric_keys_order_naturally() {
        let current = records(json!([{"id": 10}, {"id": 2}]));
        let desired = records(json!([{"id": 2}]));
        let drift = merge_by_instance_key(&current, &desired, "id").unwrap();
        assert_eq!(drift.current, Some(v(json!([{"id": 10}]))));
        assert_eq!(drift.desired, Some(v(json!([null]))));
    }

    #[test]
    fn missing_key_on_desired_side() {
        let current = records(json!([{"name": "a"}]));
        let desired = records(json!([{"name": "a"}, {"label": "b"}]));
        let err = merge_by_instance_key(&current, &desired, "name").unwrap_err();
        assert_eq!(
            err,
            ComparisonError::MissingInstanceKey { key: "name".into(), side: Side::Desired, index: 1 }
        );
    }

    #[test]
    fn mixed_key_kinds_are_rejected() {
        let current = records(json!([{"id": 1}]));
        let desired = records(json!([{"id": "1"}]));
        let err = merge_by_instance_key(&current, &desired, "id").unwrap_err();
        assert_eq!(
            err,
            ComparisonError::IncomparableInstanceKeys {
                key: "id".into(),
                left: ValueKind::Number,
                right: ValueKind::String,
            }
        );
    }

    #[test]
    fn int_and_float_keys_match() {
        let current = records(json!([{"id": 1, "v": "x"}]));
        let desired = records(json!([{"id": 1.0, "v": "x"}]));
        assert!(merge_by_instance_key(&current, &desired, "id").unwrap().is_empty());
    }
}
