//! Controls and their lifecycle.
//!
//! A control is anything implementing [`Control`]: it knows how to fetch the
//! current configuration of one compliance rule (`get`) and how to push a
//! desired configuration (`set`). The provided `check_compliance` and
//! `remediate` methods run the shared state machine in [`lifecycle`]; controls
//! whose reconciliation is not a single full-value replace override them.

pub mod descriptor;
pub mod lifecycle;
pub mod mock;
pub mod registry;
pub mod report;
pub mod validate;

pub use descriptor::{ControlDescriptor, ControlId, Product};
pub use registry::{ControlRegistry, RegistryBuilder};
pub use report::{ComplianceReport, RemediateReport};

use crate::compare::CompareOptions;
use crate::error::ControlError;
use crate::types::status::RemediateStatus;
use crate::types::value::ConfigValue;

/// Sole entry of a `get` error list meaning "this control does not apply in
/// the current context". Not a failure.
pub const SKIPPED: &str = "SKIPPED";

/// True when `errors` is exactly the skip sentinel.
pub fn is_skip_sentinel(errors: &[String]) -> bool {
    matches!(errors, [only] if only == SKIPPED)
}

/// Capability every compliance control provides.
///
/// `C` is the opaque per-product context (connection or session handle).
pub trait Control<C: ?Sized> {
    fn descriptor(&self) -> &ControlDescriptor;

    /// Comparison policy and instance key, fixed at construction.
    fn compare_options(&self) -> CompareOptions {
        CompareOptions::default()
    }

    /// Reject malformed desired state before anything is fetched.
    fn validate_desired(&self, _desired: &ConfigValue) -> Result<(), ControlError> {
        Ok(())
    }

    /// Fetch the current configuration. A non-empty error list means the
    /// value is not usable.
    fn get(&self, ctx: &mut C) -> (ConfigValue, Vec<String>);

    /// Push the desired configuration.
    fn set(&self, ctx: &mut C, desired: &ConfigValue) -> (RemediateStatus, Vec<String>);

    fn check_compliance(
        &self,
        ctx: &mut C,
        desired: &ConfigValue,
    ) -> Result<ComplianceReport, ControlError> {
        lifecycle::check_compliance(self, ctx, desired)
    }

    fn remediate(&self, ctx: &mut C, desired: &ConfigValue) -> Result<RemediateReport, ControlError> {
        lifecycle::remediate(self, ctx, desired)
    }
}
