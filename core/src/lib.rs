//! Compliance-as-code engine: structural comparison of configuration trees
//! and a check/remediate lifecycle for per-product compliance controls.

pub mod compare;
pub mod control;
pub mod data;
pub mod error;
pub mod runner;
pub mod snapshot;
pub mod types;

pub use compare::{diff, CompareOptions, ComparisonPolicy, Drift};
pub use control::{
    ComplianceReport, Control, ControlDescriptor, ControlId, ControlRegistry, Product,
    RemediateReport, SKIPPED,
};
pub use error::{ComparisonError, ControlError, DocumentError, RegistryError, SettingsError};
pub use runner::{CheckRun, RemediationRun, Runner};
pub use snapshot::{SnapshotContext, SnapshotControl};
pub use types::{ComplianceStatus, ConfigValue, RemediateStatus};
