//! Structural comparator. Computes the minimal bidirectional drift between a
//! current and a desired configuration tree.
//!
//! The comparator is pure: it never mutates its inputs (sorting happens on
//! copies) and performs no I/O. The `structural` module handles the
//! mapping/sequence/scalar recursion; `keyed` implements the identity-keyed
//! merge of sequences of records.

mod keyed;
mod structural;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ComparisonError, ParseEnumError};
use crate::types::value::ConfigValue;

/// Instance key used when a control does not name one.
pub const DEFAULT_INSTANCE_KEY: &str = "name";

// ---------------------------------------------------------------------------
// ComparisonPolicy
// ---------------------------------------------------------------------------

/// How sequences are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonPolicy {
    /// Deep-sort copies of both sequences first; element order never drifts.
    #[default]
    SortThenCompare,
    /// Compare positionally; any difference replaces the whole sequence.
    CompareInOrder,
    /// Match records of two sequences of mappings by their instance key.
    IdentityKeyed,
}

impl ComparisonPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ComparisonPolicy::SortThenCompare => "sort_then_compare",
            ComparisonPolicy::CompareInOrder => "compare_in_order",
            ComparisonPolicy::IdentityKeyed => "identity_keyed",
        }
    }

    /// Policy applied to containers nested below the current node. Identity
    /// matching is only defined for the outermost sequence.
    pub(crate) fn nested(self) -> ComparisonPolicy {
        match self {
            ComparisonPolicy::IdentityKeyed => ComparisonPolicy::SortThenCompare,
            other => other,
        }
    }
}

impl fmt::Display for ComparisonPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComparisonPolicy {
    type Err = ParseEnumError;

    /// Accepts `sort_then_compare`, `SORT_THEN_COMPARE` or `sort-then-compare`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "sort_then_compare" => Ok(ComparisonPolicy::SortThenCompare),
            "compare_in_order" => Ok(ComparisonPolicy::CompareInOrder),
            "identity_keyed" => Ok(ComparisonPolicy::IdentityKeyed),
            _ => Err(ParseEnumError {
                what: "comparison policy",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// CompareOptions
// ---------------------------------------------------------------------------

/// Per-control comparison parameters, fixed when the control is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareOptions {
    #[serde(default)]
    pub policy: ComparisonPolicy,
    #[serde(default = "default_instance_key")]
    pub instance_key: String,
}

fn default_instance_key() -> String {
    DEFAULT_INSTANCE_KEY.to_string()
}

impl CompareOptions {
    pub fn new(policy: ComparisonPolicy, instance_key: impl Into<String>) -> Self {
        CompareOptions {
            policy,
            instance_key: instance_key.into(),
        }
    }

    pub fn in_order() -> Self {
        CompareOptions::new(ComparisonPolicy::CompareInOrder, DEFAULT_INSTANCE_KEY)
    }

    pub fn identity_keyed(instance_key: impl Into<String>) -> Self {
        CompareOptions::new(ComparisonPolicy::IdentityKeyed, instance_key)
    }
}

impl Default for CompareOptions {
    fn default() -> Self {
        CompareOptions::new(ComparisonPolicy::SortThenCompare, DEFAULT_INSTANCE_KEY)
    }
}

// ---------------------------------------------------------------------------
// Drift
// ---------------------------------------------------------------------------

/// Which input a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Current,
    Desired,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Current => f.write_str("current"),
            Side::Desired => f.write_str("desired"),
        }
    }
}

/// Drift between two trees. A side is `None` when nothing differs on it;
/// otherwise it holds the pruned fragment (or the whole conflicting value).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Drift {
    #[serde(default)]
    pub current: Option<ConfigValue>,
    #[serde(default)]
    pub desired: Option<ConfigValue>,
}

impl Drift {
    pub fn none() -> Self {
        Drift::default()
    }

    /// Both values in full: "replace entirely".
    pub fn replace(current: &ConfigValue, desired: &ConfigValue) -> Self {
        Drift {
            current: Some(current.clone()),
            desired: Some(desired.clone()),
        }
    }

    /// True when neither side carries drift.
    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.desired.is_none()
    }

    pub fn into_parts(self) -> (Option<ConfigValue>, Option<ConfigValue>) {
        (self.current, self.desired)
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Compute the drift between `current` and `desired`.
///
/// Fails only for identity-keyed comparisons whose records lack the
/// instance key or mix key kinds; every other input yields a `Drift`.
pub fn diff(
    current: &ConfigValue,
    desired: &ConfigValue,
    options: &CompareOptions,
) -> Result<Drift, ComparisonError> {
    structural::diff_node(current, desired, options.policy, &options.instance_key)
}
