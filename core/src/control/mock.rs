//! Mock control for testing.
//!
//! Serves a scripted current value, records every call and every value
//! pushed through `set`, so lifecycle consumers can be tested without a
//! product transport.

use std::cell::{Cell, RefCell};

use super::validate::validate_for_options;
use super::{Control, ControlDescriptor};
use crate::compare::CompareOptions;
use crate::error::ControlError;
use crate::types::status::RemediateStatus;
use crate::types::value::ConfigValue;

/// A test double implementing [`Control`] for any context type.
pub struct MockControl {
    descriptor: ControlDescriptor,
    options: CompareOptions,
    current: RefCell<ConfigValue>,
    get_errors: Vec<String>,
    set_result: (RemediateStatus, Vec<String>),
    get_calls: Cell<usize>,
    applied: RefCell<Vec<ConfigValue>>,
}

impl MockControl {
    /// A control whose `get` returns `current` and whose `set` succeeds.
    pub fn new(descriptor: ControlDescriptor, current: ConfigValue) -> Self {
        MockControl {
            descriptor,
            options: CompareOptions::default(),
            current: RefCell::new(current),
            get_errors: Vec::new(),
            set_result: (RemediateStatus::Success, Vec::new()),
            get_calls: Cell::new(0),
            applied: RefCell::new(Vec::new()),
        }
    }

    pub fn with_options(mut self, options: CompareOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_get_errors(mut self, errors: Vec<String>) -> Self {
        self.get_errors = errors;
        self
    }

    pub fn with_set_result(mut self, status: RemediateStatus, errors: Vec<String>) -> Self {
        self.set_result = (status, errors);
        self
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.get()
    }

    pub fn set_calls(&self) -> usize {
        self.applied.borrow().len()
    }

    /// Every value passed to `set`, in call order.
    pub fn applied(&self) -> Vec<ConfigValue> {
        self.applied.borrow().clone()
    }

    pub fn current(&self) -> ConfigValue {
        self.current.borrow().clone()
    }
}

impl<C: ?Sized> Control<C> for MockControl {
    fn descriptor(&self) -> &ControlDescriptor {
        &self.descriptor
    }

    fn compare_options(&self) -> CompareOptions {
        self.options.clone()
    }

    fn validate_desired(&self, desired: &ConfigValue) -> Result<(), ControlError> {
        validate_for_options(&self.descriptor.qualified_name(), desired, &self.options)
    }

    fn get(&self, _ctx: &mut C) -> (ConfigValue, Vec<String>) {
        self.get_calls.set(self.get_calls.get() + 1);
        (self.current.borrow().clone(), self.get_errors.clone())
    }

    fn set(&self, _ctx: &mut C, desired: &ConfigValue) -> (RemediateStatus, Vec<String>) {
        self.applied.borrow_mut().push(desired.clone());
        let (status, errors) = self.set_result.clone();
        if status == RemediateStatus::Success && errors.is_empty() {
            *self.current.borrow_mut() = desired.clone();
        }
        (status, errors)
    }
}
