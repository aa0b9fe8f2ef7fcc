//! Error types for the compliance core.
//!
//! Transport failures of a control's `get`/`set` never appear here: they are
//! reported as plain strings inside compliance/remediation reports. The types
//! below cover contract violations, invalid input and file handling.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::compare::Side;
use crate::types::value::ValueKind;

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// Raised by the structural comparator. Never converted into a status by the
/// lifecycle; malformed desired state must not read as compliant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComparisonError {
    /// Identity-keyed comparison requested but a record lacks the key.
    #[error("element {index} of the {side} sequence has no instance key '{key}'")]
    MissingInstanceKey { key: String, side: Side, index: usize },

    /// Instance-key values of different kinds have no common order.
    #[error("instance key '{key}' mixes {left} and {right} values")]
    IncomparableInstanceKeys {
        key: String,
        left: ValueKind,
        right: ValueKind,
    },
}

/// A string did not name a known enum member (policy, product, format).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {what} '{value}'")]
pub struct ParseEnumError {
    pub what: &'static str,
    pub value: String,
}

// ---------------------------------------------------------------------------
// Control lifecycle
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ControlError {
    #[error(transparent)]
    Comparison(#[from] ComparisonError),

    /// The desired state was rejected before comparison was attempted.
    #[error("invalid desired state for {control}: {message}")]
    Validation { control: String, message: String },

    /// A control produced a status combination the lifecycle cannot
    /// interpret. This is a bug in the control implementation.
    #[error("control {control} violated the lifecycle contract: {message}")]
    Terminal { control: String, message: String },
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// One reason a registered descriptor was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorProblem {
    pub control: String,
    pub reason: String,
}

impl fmt::Display for DescriptorProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.control, self.reason)
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{} invalid control descriptor(s): {}", .0.len(), join_problems(.0))]
    Invalid(Vec<DescriptorProblem>),
}

fn join_problems(problems: &[DescriptorProblem]) -> String {
    problems
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// ---------------------------------------------------------------------------
// Documents and settings
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("cannot read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {}", .path.display(), .source)]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML in {}: {}", .path.display(), .source)]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("unsupported document format for {} (expected .json, .yaml or .yml)", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("malformed compliance document: {0}")]
    Shape(String),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot access {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid settings: {0}")]
    Invalid(String),
}
