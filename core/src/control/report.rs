//! Result records returned by the lifecycle. Both serialize to a mapping
//! with the fixed key vocabulary `status`, `current`, `desired`, `old`, `new`
//! and `errors`; absent members are omitted.

use serde::{Deserialize, Serialize};

use crate::compare::Drift;
use crate::types::status::{ComplianceStatus, RemediateStatus};
use crate::types::value::ConfigValue;

/// Result of `check_compliance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub status: ComplianceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<ConfigValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired: Option<ConfigValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ComplianceReport {
    fn with_status(status: ComplianceStatus) -> Self {
        ComplianceReport {
            status,
            current: None,
            desired: None,
            errors: Vec::new(),
        }
    }

    pub fn compliant() -> Self {
        ComplianceReport::with_status(ComplianceStatus::Compliant)
    }

    pub fn non_compliant(drift: Drift) -> Self {
        let (current, desired) = drift.into_parts();
        ComplianceReport {
            current,
            desired,
            ..ComplianceReport::with_status(ComplianceStatus::NonCompliant)
        }
    }

    pub fn skipped() -> Self {
        ComplianceReport::with_status(ComplianceStatus::Skipped)
    }

    pub fn failed(errors: Vec<String>) -> Self {
        ComplianceReport {
            errors,
            ..ComplianceReport::with_status(ComplianceStatus::Failed)
        }
    }

    pub fn error(errors: Vec<String>) -> Self {
        ComplianceReport {
            errors,
            ..ComplianceReport::with_status(ComplianceStatus::Error)
        }
    }

    /// Attach explanatory messages, e.g. why a control was skipped.
    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = errors;
        self
    }
}

/// Result of `remediate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemediateReport {
    pub status: RemediateStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<ConfigValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<ConfigValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<ConfigValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired: Option<ConfigValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl RemediateReport {
    pub fn with_status(status: RemediateStatus) -> Self {
        RemediateReport {
            status,
            old: None,
            new: None,
            current: None,
            desired: None,
            errors: Vec::new(),
        }
    }

    /// `set` went through: report the drift as old/new values.
    pub fn applied(status: RemediateStatus, old: Option<ConfigValue>, new: Option<ConfigValue>) -> Self {
        RemediateReport {
            old,
            new,
            ..RemediateReport::with_status(status)
        }
    }

    pub fn skipped(errors: Vec<String>) -> Self {
        RemediateReport {
            errors,
            ..RemediateReport::with_status(RemediateStatus::Skipped)
        }
    }

    pub fn failed(errors: Vec<String>) -> Self {
        RemediateReport {
            errors,
            ..RemediateReport::with_status(RemediateStatus::Failed)
        }
    }
}
