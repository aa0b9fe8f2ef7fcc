//! Batch runner. Drives every control named in a desired-state document
//! through the lifecycle and folds the results per product and per run.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::control::{ComplianceReport, Control, ControlRegistry, Product, RemediateReport};
use crate::data::document::ComplianceDocument;
use crate::error::ControlError;
use crate::types::status::{ComplianceStatus, RemediateStatus};
use crate::types::value::ConfigValue;

pub const CONTROL_DISABLED: &str = "Control is disabled";

/// A per-control report the runner knows how to aggregate.
pub trait Outcome {
    type Status: Copy + fmt::Debug + fmt::Display + PartialEq + Serialize;

    fn status(&self) -> Self::Status;
    fn aggregate(statuses: Vec<Self::Status>) -> Self::Status;
}

impl Outcome for ComplianceReport {
    type Status = ComplianceStatus;

    fn status(&self) -> ComplianceStatus {
        self.status
    }

    fn aggregate(statuses: Vec<ComplianceStatus>) -> ComplianceStatus {
        ComplianceStatus::aggregate(statuses)
    }
}

impl Outcome for RemediateReport {
    type Status = RemediateStatus;

    fn status(&self) -> RemediateStatus {
        self.status
    }

    fn aggregate(statuses: Vec<RemediateStatus>) -> RemediateStatus {
        RemediateStatus::aggregate(statuses)
    }
}

// ---------------------------------------------------------------------------
// Run reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound(serialize = "R: Serialize"))]
pub struct ProductRun<R: Outcome> {
    pub status: R::Status,
    pub controls: BTreeMap<String, R>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound(serialize = "R: Serialize"))]
pub struct RunReport<R: Outcome> {
    pub status: R::Status,
    pub products: BTreeMap<Product, ProductRun<R>>,
}

pub type CheckRun = RunReport<ComplianceReport>;
pub type RemediationRun = RunReport<RemediateReport>;

impl<R: Outcome> RunReport<R> {
    fn fold(results: BTreeMap<Product, BTreeMap<String, R>>) -> Self {
        let products: BTreeMap<Product, ProductRun<R>> = results
            .into_iter()
            .map(|(product, controls)| {
                let status = R::aggregate(controls.values().map(R::status).collect());
                (product, ProductRun { status, controls })
            })
            .collect();
        let status = R::aggregate(products.values().map(|p| p.status).collect());
        RunReport { status, products }
    }

    /// Report for one control, if it ran.
    pub fn control(&self, product: Product, name: &str) -> Option<&R> {
        self.products.get(&product).and_then(|p| p.controls.get(name))
    }

    /// Number of controls that ran.
    pub fn len(&self) -> usize {
        self.products.values().map(|p| p.controls.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

enum Step<'a, C: ?Sized> {
    Run(&'a dyn Control<C>),
    Disabled,
    Unknown,
}

pub struct Runner<'r, C: ?Sized> {
    registry: &'r ControlRegistry<C>,
}

impl<'r, C: ?Sized> Runner<'r, C> {
    pub fn new(registry: &'r ControlRegistry<C>) -> Self {
        Runner { registry }
    }

    /// Check every control named in `desired`, in product then control order.
    pub fn check_compliance(&self, ctx: &mut C, desired: &ComplianceDocument) -> CheckRun {
        let run = self.each(desired, |step, product, name, value| match step {
            Step::Unknown => ComplianceReport::error(vec![unknown_control(product, name)]),
            Step::Disabled => ComplianceReport::skipped().with_errors(vec![CONTROL_DISABLED.into()]),
            Step::Run(control) => control
                .check_compliance(ctx, value)
                .unwrap_or_else(|e| ComplianceReport::error(vec![control_failed(product, name, e)])),
        });
        info!(status = %run.status, controls = run.len(), "compliance check finished");
        run
    }

    /// Remediate every control named in `desired`, in product then control order.
    pub fn remediate(&self, ctx: &mut C, desired: &ComplianceDocument) -> RemediationRun {
        let run = self.each(desired, |step, product, name, value| match step {
            Step::Unknown => RemediateReport::failed(vec![unknown_control(product, name)]),
            Step::Disabled => RemediateReport::skipped(vec![CONTROL_DISABLED.into()]),
            Step::Run(control) => control
                .remediate(ctx, value)
                .unwrap_or_else(|e| RemediateReport::failed(vec![control_failed(product, name, e)])),
        });
        info!(status = %run.status, controls = run.len(), "remediation finished");
        run
    }

    fn each<R, F>(&self, desired: &ComplianceDocument, mut step: F) -> RunReport<R>
    where
        R: Outcome,
        F: FnMut(Step<'_, C>, Product, &str, &ConfigValue) -> R,
    {
        let mut results: BTreeMap<Product, BTreeMap<String, R>> = BTreeMap::new();
        for (product, name, value) in desired.entries() {
            let next = match self.registry.get(product, name) {
                None => Step::Unknown,
                Some(control) if !control.descriptor().enabled => {
                    info!(control = %name, product = %product, "control disabled, skipping");
                    Step::Disabled
                }
                Some(control) => Step::Run(control),
            };
            let report = step(next, product, name, value);
            results
                .entry(product)
                .or_default()
                .insert(name.to_string(), report);
        }
        RunReport::fold(results)
    }
}

fn unknown_control(product: Product, name: &str) -> String {
    warn!(control = %name, product = %product, "no such control registered");
    format!("Unknown control {}.{}", product, name)
}

fn control_failed(product: Product, name: &str, err: ControlError) -> String {
    error!(control = %name, product = %product, error = %err, "control raised an error");
    err.to_string()
}
