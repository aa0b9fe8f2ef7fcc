//! Configuration value tree: the shape both fetched and desired
//! configuration fragments take.
//!
//! `ConfigValue` is a sum type over mappings, sequences and scalars. Equality
//! and ordering are *semantic*: integer and floating-point numbers are the same
//! kind and compare by value, while booleans never compare equal to numbers.
//! The ordering is total so that sequences can be deep-sorted before they are
//! compared.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Keyed children of a mapping node. Keys are unique and unordered from the
/// caller's point of view; the `BTreeMap` keeps them sorted for output.
pub type Mapping = BTreeMap<String, ConfigValue>;

// ---------------------------------------------------------------------------
// ValueKind
// ---------------------------------------------------------------------------

/// The comparison kind of a node. Two nodes of different kinds always drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Sequence,
    Mapping,
}

impl ValueKind {
    fn rank(self) -> u8 {
        match self {
            ValueKind::Null => 0,
            ValueKind::Bool => 1,
            ValueKind::Number => 2,
            ValueKind::String => 3,
            ValueKind::Sequence => 4,
            ValueKind::Mapping => 5,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Sequence => "sequence",
            ValueKind::Mapping => "mapping",
        };
        write!(f, "{}", s)
    }
}

// ---------------------------------------------------------------------------
// Number / Scalar
// ---------------------------------------------------------------------------

/// A numeric scalar. Integer- and float-shaped numbers are interchangeable
/// for comparison: `1800` equals `1800.0`. Comparison is exact, so integers
/// beyond 2^53 never collapse onto a nearby float. `UInt` holds only values
/// above `i64::MAX`.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Int(i64),
    UInt(u64),
    Float(f64),
}

/// 2^127: every float in `[-2^127, 2^127)` truncates into an `i128` exactly.
const I128_BOUND: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0;

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::UInt(u) => u as f64,
            Number::Float(f) => f,
        }
    }

    fn as_i128(self) -> Option<i128> {
        match self {
            Number::Int(i) => Some(i as i128),
            Number::UInt(u) => Some(u as i128),
            Number::Float(_) => None,
        }
    }

    fn cmp_value(self, other: Number) -> Ordering {
        match (self, other) {
            (Number::Float(a), Number::Float(b)) => a.partial_cmp(&b).unwrap_or_else(|| a.total_cmp(&b)),
            (Number::Float(f), n) => cmp_int_float(n.as_i128().unwrap_or_default(), f).reverse(),
            (n, Number::Float(f)) => cmp_int_float(n.as_i128().unwrap_or_default(), f),
            (a, b) => a.as_i128().cmp(&b.as_i128()),
        }
    }
}

/// Exact order of an integer against a float. NaN sorts by sign, as in
/// `f64::total_cmp`.
fn cmp_int_float(i: i128, f: f64) -> Ordering {
    if f.is_nan() {
        return if f.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    if f >= I128_BOUND {
        return Ordering::Less;
    }
    if f < -I128_BOUND {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    match i.cmp(&(whole as i128)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&(f - whole)).unwrap_or(Ordering::Equal),
        ord => ord,
    }
}

/// A leaf value.
#[derive(Debug, Clone)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl Scalar {
    pub fn kind(&self) -> ValueKind {
        match self {
            Scalar::Null => ValueKind::Null,
            Scalar::Bool(_) => ValueKind::Bool,
            Scalar::Number(_) => ValueKind::Number,
            Scalar::String(_) => ValueKind::String,
        }
    }

    fn cmp_value(&self, other: &Scalar) -> Ordering {
        match (self, other) {
            (Scalar::Null, Scalar::Null) => Ordering::Equal,
            (Scalar::Bool(a), Scalar::Bool(b)) => a.cmp(b),
            (Scalar::Number(a), Scalar::Number(b)) => a.cmp_value(*b),
            (Scalar::String(a), Scalar::String(b)) => a.cmp(b),
            (a, b) => a.kind().rank().cmp(&b.kind().rank()),
        }
    }
}

// ---------------------------------------------------------------------------
// ConfigValue
// ---------------------------------------------------------------------------

/// A configuration tree: mapping, sequence or scalar.
///
/// Serializes as plain JSON/YAML (no variant tags). Non-finite floats have no
/// JSON representation and serialize as `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum ConfigValue {
    Mapping(Mapping),
    Sequence(Vec<ConfigValue>),
    Scalar(Scalar),
}

impl ConfigValue {
    pub fn null() -> Self {
        ConfigValue::Scalar(Scalar::Null)
    }

    pub fn empty_mapping() -> Self {
        ConfigValue::Mapping(Mapping::new())
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            ConfigValue::Mapping(_) => ValueKind::Mapping,
            ConfigValue::Sequence(_) => ValueKind::Sequence,
            ConfigValue::Scalar(s) => s.kind(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Scalar(Scalar::Null))
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, ConfigValue::Mapping(_))
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            ConfigValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Child of a mapping node by key.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Walk nested mappings along `path`.
    pub fn pointer(&self, path: &[&str]) -> Option<&ConfigValue> {
        path.iter().try_fold(self, |node, key| node.get(key))
    }

    /// True for `{}` and `[]`.
    pub fn is_empty_container(&self) -> bool {
        match self {
            ConfigValue::Mapping(m) => m.is_empty(),
            ConfigValue::Sequence(items) => items.is_empty(),
            ConfigValue::Scalar(_) => false,
        }
    }

    /// A copy with every nested sequence sorted by the canonical order.
    /// `self` is left untouched.
    pub fn deep_sorted(&self) -> ConfigValue {
        match self {
            ConfigValue::Mapping(m) => ConfigValue::Mapping(
                m.iter()
                    .map(|(k, v)| (k.clone(), v.deep_sorted()))
                    .collect(),
            ),
            ConfigValue::Sequence(items) => {
                let mut sorted: Vec<ConfigValue> =
                    items.iter().map(ConfigValue::deep_sorted).collect();
                sorted.sort();
                ConfigValue::Sequence(sorted)
            }
            ConfigValue::Scalar(s) => ConfigValue::Scalar(s.clone()),
        }
    }

    /// Canonical total order: kinds rank `null < bool < number < string <
    /// sequence < mapping`; sequences compare element-wise in their current
    /// order; mappings compare their sorted `(key, value)` pairs.
    fn canonical_cmp(&self, other: &ConfigValue) -> Ordering {
        let by_kind = self.kind().rank().cmp(&other.kind().rank());
        if by_kind != Ordering::Equal {
            return by_kind;
        }
        match (self, other) {
            (ConfigValue::Scalar(a), ConfigValue::Scalar(b)) => a.cmp_value(b),
            (ConfigValue::Sequence(a), ConfigValue::Sequence(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    let ord = x.canonical_cmp(y);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            (ConfigValue::Mapping(a), ConfigValue::Mapping(b)) => {
                for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
                    let ord = ka.cmp(kb).then_with(|| va.canonical_cmp(vb));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => Ordering::Equal,
        }
    }
}

impl PartialEq for ConfigValue {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_cmp(other) == Ordering::Equal
    }
}

impl Eq for ConfigValue {}

impl PartialOrd for ConfigValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ConfigValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical_cmp(other)
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json: serde_json::Value = self.clone().into();
        write!(f, "{}", json)
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<serde_json::Value> for ConfigValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => ConfigValue::null(),
            Value::Bool(b) => ConfigValue::Scalar(Scalar::Bool(b)),
            Value::Number(n) => {
                let number = if let Some(i) = n.as_i64() {
                    Number::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Number::UInt(u)
                } else {
                    Number::Float(n.as_f64().unwrap_or(f64::NAN))
                };
                ConfigValue::Scalar(Scalar::Number(number))
            }
            Value::String(s) => ConfigValue::Scalar(Scalar::String(s)),
            Value::Array(items) => {
                ConfigValue::Sequence(items.into_iter().map(ConfigValue::from).collect())
            }
            Value::Object(map) => ConfigValue::Mapping(
                map.into_iter()
                    .map(|(k, v)| (k, ConfigValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<ConfigValue> for serde_json::Value {
    fn from(value: ConfigValue) -> Self {
        use serde_json::Value;
        match value {
            ConfigValue::Scalar(Scalar::Null) => Value::Null,
            ConfigValue::Scalar(Scalar::Bool(b)) => Value::Bool(b),
            ConfigValue::Scalar(Scalar::Number(Number::Int(i))) => Value::from(i),
            ConfigValue::Scalar(Scalar::Number(Number::UInt(u))) => Value::from(u),
            ConfigValue::Scalar(Scalar::Number(Number::Float(f))) => {
                serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number)
            }
            ConfigValue::Scalar(Scalar::String(s)) => Value::String(s),
            ConfigValue::Sequence(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            ConfigValue::Mapping(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::Scalar(Scalar::String(s.to_string()))
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::Scalar(Scalar::String(s))
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for ConfigValue {
    fn from(i: i64) -> Self {
        ConfigValue::Scalar(Scalar::Number(Number::Int(i)))
    }
}

impl From<f64> for ConfigValue {
    fn from(f: f64) -> Self {
        ConfigValue::Scalar(Scalar::Number(Number::Float(f)))
    }
}

impl From<Vec<ConfigValue>> for ConfigValue {
    fn from(items: Vec<ConfigValue>) -> Self {
        ConfigValue::Sequence(items)
    }
}

impl From<Mapping> for ConfigValue {
    fn from(map: Mapping) -> Self {
        ConfigValue::Mapping(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v(value: serde_json::Value) -> ConfigValue {
        ConfigValue::from(value)
    }

    #[test]
    fn int_and_float_are_equal() {
        assert_eq!(v(json!(1800)), v(json!(1800.0)));
        assert_eq!(v(json!(1800)).kind(), v(json!(1800.5)).kind());
        assert_ne!(v(json!(1800)), v(json!(1800.5)));
    }

    #[test]
    fn large_integers_compare_exactly() {
        let two_53 = 9_007_199_254_740_992_i64;
        assert_ne!(v(json!(two_53 + 1)), v(json!(9_007_199_254_740_992.0)));
        assert_eq!(v(json!(two_53)), v(json!(9_007_199_254_740_992.0)));
        assert!(v(json!(two_53 + 1)) > v(json!(9_007_199_254_740_992.0)));
        assert!(v(json!(two_53)) < v(json!(two_53 + 1)));
    }

    #[test]
    fn fractional_floats_sit_between_integers() {
        assert!(v(json!(1)) < v(json!(1.5)));
        assert!(v(json!(1.5)) < v(json!(2)));
        assert!(v(json!(-1)) > v(json!(-1.5)));
        assert!(v(json!(i64::MAX)) < v(json!(1e300)));
        assert!(v(json!(i64::MIN)) > v(json!(-1e300)));
    }

    #[test]
    fn unsigned_beyond_i64_round_trips() {
        let value = v(json!(u64::MAX));
        let back: serde_json::Value = value.clone().into();
        assert_eq!(back, json!(u64::MAX));
        assert_ne!(value, v(json!(u64::MAX as f64)));
        assert!(value > v(json!(i64::MAX)));
    }

    #[test]
    fn bool_is_never_a_number() {
        assert_ne!(v(json!(true)), v(json!(1)));
        assert_ne!(v(json!(false)), v(json!(0)));
        assert_eq!(v(json!(true)).kind(), ValueKind::Bool);
    }

    #[test]
    fn mapping_equality_ignores_insertion_order() {
        let a = v(json!({"a": 1, "b": [1, 2]}));
        let b = v(json!({"b": [1, 2], "a": 1.0}));
        assert_eq!(a, b);
    }

    #[test]
    fn sequences_compare_positionally() {
        assert_ne!(v(json!([1, 2])), v(json!([2, 1])));
    }

    #[test]
    fn deep_sorted_sorts_nested_and_leaves_input() {
        let original = v(json!({"servers": ["ntp2", "ntp1"], "pools": [[3, 1], [2]]}));
        let sorted = original.deep_sorted();
        assert_eq!(sorted, v(json!({"servers": ["ntp1", "ntp2"], "pools": [[1, 3], [2]]})));
        assert_eq!(original.get("servers"), Some(&v(json!(["ntp2", "ntp1"]))));
    }

    #[test]
    fn kinds_order_before_values() {
        let mut items = vec![
            v(json!({"a": 1})),
            v(json!("x")),
            v(json!([1])),
            v(json!(2)),
            v(json!(true)),
            v(json!(null)),
        ];
        items.sort();
        let kinds: Vec<ValueKind> = items.iter().map(ConfigValue::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ValueKind::Null,
                ValueKind::Bool,
                ValueKind::Number,
                ValueKind::String,
                ValueKind::Sequence,
                ValueKind::Mapping,
            ]
        );
    }

    #[test]
    fn mappings_sort_by_pairs() {
        let mut items = vec![v(json!({"name": "b"})), v(json!({"name": "a", "x": 1}))];
        items.sort();
        assert_eq!(items[0].get("name").and_then(ConfigValue::as_str), Some("a"));
    }

    #[test]
    fn json_round_trip_keeps_number_shape() {
        let value = v(json!({"port": 514, "ratio": 0.5, "tags": ["a", null, false]}));
        let text = serde_json::to_string(&value).unwrap();
        let back: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back, json!({"port": 514, "ratio": 0.5, "tags": ["a", null, false]}));
    }

    #[test]
    fn yaml_deserializes_into_tree() {
        let value: ConfigValue = serde_yaml::from_str("servers:\n  - a\n  - b\nport: 123\n").unwrap();
        assert_eq!(value, v(json!({"servers": ["a", "b"], "port": 123})));
    }

    #[test]
    fn non_finite_float_serializes_as_null() {
        let json: serde_json::Value = ConfigValue::from(f64::INFINITY).into();
        assert!(json.is_null());
    }

    #[test]
    fn pointer_walks_mappings() {
        let value = v(json!({"vcenter": {"ntp": {"servers": ["a"]}}}));
        assert_eq!(value.pointer(&["vcenter", "ntp", "servers"]), Some(&v(json!(["a"]))));
        assert!(value.pointer(&["vcenter", "syslog"]).is_none());
    }

    #[test]
    fn empty_containers() {
        assert!(v(json!({})).is_empty_container());
        assert!(v(json!([])).is_empty_container());
        assert!(!v(json!(null)).is_empty_container());
    }
}
