//! Snapshot-backed controls. These run the lifecycle against a captured
//! configuration document instead of a live product.
//!
//! The context holds the captured "current" document. `get` reads one
//! `product.control` entry from it (an absent entry means the control does not
//! apply and yields the skip sentinel) and `set` replaces that entry.

use tracing::debug;

use crate::compare::CompareOptions;
use crate::control::validate::validate_for_options;
use crate::control::{Control, ControlDescriptor, ControlId, ControlRegistry, Product, SKIPPED};
use crate::data::document::ComplianceDocument;
use crate::error::{ControlError, RegistryError};
use crate::types::config::Settings;
use crate::types::status::RemediateStatus;
use crate::types::value::ConfigValue;

// ---------------------------------------------------------------------------
// SnapshotContext
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct SnapshotContext {
    document: ComplianceDocument,
    modified: bool,
}

impl SnapshotContext {
    pub fn new(document: ComplianceDocument) -> Self {
        SnapshotContext {
            document,
            modified: false,
        }
    }

    pub fn document(&self) -> &ComplianceDocument {
        &self.document
    }

    pub fn into_document(self) -> ComplianceDocument {
        self.document
    }

    /// Whether any `set` has replaced an entry since the context was built.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    fn lookup(&self, product: Product, control: &str) -> Option<&ConfigValue> {
        self.document.get(product, control)
    }

    fn replace(&mut self, product: Product, control: &str, value: ConfigValue) {
        self.document.insert(product, control, value);
        self.modified = true;
    }
}

// ---------------------------------------------------------------------------
// SnapshotControl
// ---------------------------------------------------------------------------

pub struct SnapshotControl {
    descriptor: ControlDescriptor,
    options: CompareOptions,
}

impl SnapshotControl {
    pub fn new(descriptor: ControlDescriptor, options: CompareOptions) -> Self {
        SnapshotControl {
            descriptor,
            options,
        }
    }

    /// One control per entry of `desired`, numbered from 1 in product then
    /// control order, with comparison options taken from `settings`.
    pub fn catalog(desired: &ComplianceDocument, settings: &Settings) -> Vec<SnapshotControl> {
        desired
            .entries()
            .enumerate()
            .map(|(index, (product, name, _))| {
                let descriptor =
                    ControlDescriptor::new(product, name, ControlId::Numeric(index as u64 + 1));
                SnapshotControl::new(descriptor, settings.compare_options_for(product, name))
            })
            .collect()
    }

    /// Validated registry over [`SnapshotControl::catalog`].
    pub fn registry(
        desired: &ComplianceDocument,
        settings: &Settings,
    ) -> Result<ControlRegistry<SnapshotContext>, RegistryError> {
        let controls = SnapshotControl::catalog(desired, settings)
            .into_iter()
            .map(|c| Box::new(c) as Box<dyn Control<SnapshotContext>>);
        ControlRegistry::builder().register_all(controls).build()
    }
}

impl Control<SnapshotContext> for SnapshotControl {
    fn descriptor(&self) -> &ControlDescriptor {
        &self.descriptor
    }

    fn compare_options(&self) -> CompareOptions {
        self.options.clone()
    }

    fn validate_desired(&self, desired: &ConfigValue) -> Result<(), ControlError> {
        validate_for_options(&self.descriptor.qualified_name(), desired, &self.options)
    }

    fn get(&self, ctx: &mut SnapshotContext) -> (ConfigValue, Vec<String>) {
        match ctx.lookup(self.descriptor.product, &self.descriptor.name) {
            Some(value) => (value.clone(), Vec::new()),
            None => {
                debug!(control = %self.descriptor.qualified_name(), "not present in snapshot");
                (ConfigValue::null(), vec![SKIPPED.to_string()])
            }
        }
    }

    fn set(&self, ctx: &mut SnapshotContext, desired: &ConfigValue) -> (RemediateStatus, Vec<String>) {
        ctx.replace(self.descriptor.product, &self.descriptor.name, desired.clone());
        (RemediateStatus::Success, Vec::new())
    }
}
