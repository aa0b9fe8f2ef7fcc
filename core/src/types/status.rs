use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ComplianceStatus
// ---------------------------------------------------------------------------

/// Outcome of a compliance check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
    Failed,
    Skipped,
    Error,
}

impl ComplianceStatus {
    /// Fold per-control statuses into one.
    ///
    /// Skipped entries do not count; if nothing else remains the result is
    /// `Skipped`. Otherwise the worst status wins, in the order
    /// `Error > Failed > NonCompliant > Compliant`.
    pub fn aggregate<I>(statuses: I) -> ComplianceStatus
    where
        I: IntoIterator<Item = ComplianceStatus>,
    {
        statuses
            .into_iter()
            .filter(|s| *s != ComplianceStatus::Skipped)
            .max_by_key(|s| s.severity())
            .unwrap_or(ComplianceStatus::Skipped)
    }

    fn severity(self) -> u8 {
        match self {
            ComplianceStatus::Skipped => 0,
            ComplianceStatus::Compliant => 1,
            ComplianceStatus::NonCompliant => 2,
            ComplianceStatus::Failed => 3,
            ComplianceStatus::Error => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ComplianceStatus::Compliant => "COMPLIANT",
            ComplianceStatus::NonCompliant => "NON_COMPLIANT",
            ComplianceStatus::Failed => "FAILED",
            ComplianceStatus::Skipped => "SKIPPED",
            ComplianceStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RemediateStatus
// ---------------------------------------------------------------------------

/// Outcome of a remediation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemediateStatus {
    Success,
    Failed,
    Skipped,
    Partial,
}

impl RemediateStatus {
    /// Fold the outcomes of independent sub-items into one status.
    ///
    /// Skipped items are ignored. Nothing left -> `Skipped`; every item
    /// succeeded -> `Success`; every item failed -> `Failed`; any other mix
    /// (including an item that was itself partial) -> `Partial`.
    pub fn aggregate<I>(statuses: I) -> RemediateStatus
    where
        I: IntoIterator<Item = RemediateStatus>,
    {
        let mut seen_success = false;
        let mut seen_failure = false;
        let mut seen_partial = false;
        for status in statuses {
            match status {
                RemediateStatus::Success => seen_success = true,
                RemediateStatus::Failed => seen_failure = true,
                RemediateStatus::Partial => seen_partial = true,
                RemediateStatus::Skipped => {}
            }
        }
        match (seen_success, seen_failure, seen_partial) {
            (false, false, false) => RemediateStatus::Skipped,
            (true, false, false) => RemediateStatus::Success,
            (false, true, false) => RemediateStatus::Failed,
            _ => RemediateStatus::Partial,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RemediateStatus::Success => "SUCCESS",
            RemediateStatus::Failed => "FAILED",
            RemediateStatus::Skipped => "SKIPPED",
            RemediateStatus::Partial => "PARTIAL",
        }
    }
}

impl fmt::Display for RemediateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
