use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{info, warn};

use super::{Control, ControlDescriptor, ControlId, Product};
use crate::error::{DescriptorProblem, RegistryError};

// ---------------------------------------------------------------------------
// RegistryBuilder
// ---------------------------------------------------------------------------

/// Collects controls at startup. Nothing registered here is reachable until
/// [`RegistryBuilder::build`] has validated every descriptor.
pub struct RegistryBuilder<C: ?Sized> {
    controls: Vec<Box<dyn Control<C>>>,
}

impl<C: ?Sized> RegistryBuilder<C> {
    pub fn new() -> Self {
        RegistryBuilder {
            controls: Vec::new(),
        }
    }

    pub fn register(mut self, control: Box<dyn Control<C>>) -> Self {
        self.controls.push(control);
        self
    }

    pub fn register_all<I>(mut self, controls: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn Control<C>>>,
    {
        self.controls.extend(controls);
        self
    }

    /// Validate all descriptors and produce the registry.
    ///
    /// Rules:
    /// 1. Names are non-empty lowercase snake_case (`[a-z][a-z0-9_]*`).
    /// 2. Text ids are non-empty.
    /// 3. `(product, name)` is unique.
    /// 4. Ids are unique across all products.
    ///
    /// Every problem found is reported at once.
    pub fn build(self) -> Result<ControlRegistry<C>, RegistryError> {
        let descriptors: Vec<&ControlDescriptor> =
            self.controls.iter().map(|c| c.descriptor()).collect();
        let problems = validate_descriptors(&descriptors);
        if !problems.is_empty() {
            for problem in &problems {
                warn!(control = %problem.control, reason = %problem.reason, "rejected control descriptor");
            }
            return Err(RegistryError::Invalid(problems));
        }

        let mut controls = BTreeMap::new();
        for control in self.controls {
            let d = control.descriptor();
            controls.insert((d.product, d.name.clone()), control);
        }
        info!(controls = controls.len(), "control registry validated");
        Ok(ControlRegistry { controls })
    }
}

impl<C: ?Sized> Default for RegistryBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_descriptors(descriptors: &[&ControlDescriptor]) -> Vec<DescriptorProblem> {
    let mut problems = Vec::new();
    let mut names: BTreeSet<(Product, &str)> = BTreeSet::new();
    let mut ids: HashMap<&ControlId, String> = HashMap::new();

    for d in descriptors {
        let label = d.qualified_name();
        let mut problem = |reason: String| {
            problems.push(DescriptorProblem {
                control: label.clone(),
                reason,
            })
        };

        if !is_snake_case(&d.name) {
            problem(format!("name '{}' is not lowercase snake_case", d.name));
        }
        if matches!(&d.id, ControlId::Text(s) if s.trim().is_empty()) {
            problem("empty control id".to_string());
        }
        if !names.insert((d.product, d.name.as_str())) {
            problem("registered more than once".to_string());
        }
        match ids.get(&d.id) {
            Some(owner) if *owner != label => {
                problem(format!("id {} already used by {}", d.id, owner));
            }
            Some(_) => {}
            None => {
                ids.insert(&d.id, label.clone());
            }
        }
    }
    problems
}

fn is_snake_case(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

// ---------------------------------------------------------------------------
// ControlRegistry
// ---------------------------------------------------------------------------

/// Validated set of controls, keyed by product and control name.
pub struct ControlRegistry<C: ?Sized> {
    controls: BTreeMap<(Product, String), Box<dyn Control<C>>>,
}

impl<C: ?Sized> ControlRegistry<C> {
    pub fn builder() -> RegistryBuilder<C> {
        RegistryBuilder::new()
    }

    pub fn get(&self, product: Product, name: &str) -> Option<&dyn Control<C>> {
        self.controls
            .get(&(product, name.to_string()))
            .map(|c| c.as_ref())
    }

    /// All controls, ordered by product then name.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Control<C>> {
        self.controls.values().map(|c| c.as_ref())
    }

    pub fn descriptors(&self) -> Vec<&ControlDescriptor> {
        self.iter().map(|c| c.descriptor()).collect()
    }

    /// Products with at least one registered control.
    pub fn products(&self) -> Vec<Product> {
        let set: BTreeSet<Product> = self.controls.keys().map(|(p, _)| *p).collect();
        set.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::mock::MockControl;
    use crate::types::value::ConfigValue;

    fn mock(product: Product, name: &str, id: impl Into<ControlId>) -> Box<dyn Control<()>> {
        Box::new(MockControl::new(
            ControlDescriptor::new(product, name, id),
            ConfigValue::null(),
        ))
    }

    #[test]
    fn valid_registry_builds() {
        let registry = ControlRegistry::builder()
            .register(mock(Product::Vcenter, "ntp", 1u64))
            .register(mock(Product::Esxi, "ntp", 2u64))
            .register(mock(Product::Esxi, "ssh_service", "ESXI-9X-000001"))
            .build()
            .unwrap();
        assert_eq!(registry.len(), 3);
        assert!(registry.get(Product::Esxi, "ssh_service").is_some());
        assert!(registry.get(Product::Vsan, "ntp").is_none());
        assert_eq!(registry.products(), vec![Product::Vcenter, Product::Esxi]);
    }

    #[test]
    fn iteration_is_ordered_by_product_then_name() {
        let registry = ControlRegistry::builder()
            .register(mock(Product::Esxi, "syslog", 3u64))
            .register(mock(Product::Vcenter, "ntp", 1u64))
            .register(mock(Product::Esxi, "dns", 2u64))
            .build()
            .unwrap();
        let names: Vec<String> = registry.iter().map(|c| c.descriptor().qualified_name()).collect();
        assert_eq!(names, vec!["vcenter.ntp", "esxi.dns", "esxi.syslog"]);
    }

    #[test]
    fn invalid_descriptors_are_all_reported() {
        let err = ControlRegistry::builder()
            .register(mock(Product::Vcenter, "NTP", 1u64))
            .register(mock(Product::Vcenter, "dns", ""))
            .register(mock(Product::Esxi, "ntp", 1u64))
            .register(mock(Product::Esxi, "ntp", 5u64))
            .build()
            .err()
            .unwrap();
        let RegistryError::Invalid(problems) = err;
        let reasons: Vec<String> = problems.iter().map(|p| p.to_string()).collect();
        assert_eq!(problems.len(), 4, "{:?}", reasons);
        assert!(reasons.contains(&"vcenter.NTP: name 'NTP' is not lowercase snake_case".to_string()));
        assert!(reasons.contains(&"vcenter.dns: empty control id".to_string()));
        assert!(reasons.contains(&"esxi.ntp: id 1 already used by vcenter.NTP".to_string()));
        assert!(reasons.contains(&"esxi.ntp: registered more than once".to_string()));
    }

    #[test]
    fn empty_name_rejected() {
        assert!(!is_snake_case(""));
        assert!(!is_snake_case("1ntp"));
        assert!(is_snake_case("ntp_v2"));
    }
}
