use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseEnumError;

// ---------------------------------------------------------------------------
// Product
// ---------------------------------------------------------------------------

/// The product a control is written against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Product {
    Vcenter,
    Esxi,
    Vsan,
    NsxtManager,
    NsxtEdge,
    SddcManager,
    Vrslcm,
    Vidm,
    Vro,
    Vra,
    Vrli,
}

impl Product {
    pub const ALL: [Product; 11] = [
        Product::Vcenter,
        Product::Esxi,
        Product::Vsan,
        Product::NsxtManager,
        Product::NsxtEdge,
        Product::SddcManager,
        Product::Vrslcm,
        Product::Vidm,
        Product::Vro,
        Product::Vra,
        Product::Vrli,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Product::Vcenter => "vcenter",
            Product::Esxi => "esxi",
            Product::Vsan => "vsan",
            Product::NsxtManager => "nsxt_manager",
            Product::NsxtEdge => "nsxt_edge",
            Product::SddcManager => "sddc_manager",
            Product::Vrslcm => "vrslcm",
            Product::Vidm => "vidm",
            Product::Vro => "vro",
            Product::Vra => "vra",
            Product::Vrli => "vrli",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Product {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Product::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                what: "product",
                value: s.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// ControlId
// ---------------------------------------------------------------------------

/// Catalog identifier of a control. Older catalogs use numbers, newer ones
/// use strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlId {
    Numeric(u64),
    Text(String),
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlId::Numeric(n) => write!(f, "{}", n),
            ControlId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for ControlId {
    fn from(n: u64) -> Self {
        ControlId::Numeric(n)
    }
}

impl From<&str> for ControlId {
    fn from(s: &str) -> Self {
        ControlId::Text(s.to_string())
    }
}

impl From<String> for ControlId {
    fn from(s: String) -> Self {
        ControlId::Text(s)
    }
}

// ---------------------------------------------------------------------------
// ControlDescriptor
// ---------------------------------------------------------------------------

/// Static metadata of a control. Checked once when the registry is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlDescriptor {
    pub name: String,
    pub id: ControlId,
    pub product: Product,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

fn enabled_by_default() -> bool {
    true
}

impl ControlDescriptor {
    pub fn new(product: Product, name: impl Into<String>, id: impl Into<ControlId>) -> Self {
        ControlDescriptor {
            name: name.into(),
            id: id.into(),
            product,
            enabled: true,
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// `product.name`, e.g. `vcenter.ntp`.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.product, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_round_trips_through_str() {
        for product in Product::ALL {
            assert_eq!(product.as_str().parse::<Product>().unwrap(), product);
        }
        assert!("vcf".parse::<Product>().is_err());
    }

    #[test]
    fn product_serde_matches_as_str() {
        let json = serde_json::to_string(&Product::NsxtManager).unwrap();
        assert_eq!(json, "\"nsxt_manager\"");
    }

    #[test]
    fn control_id_untagged() {
        let numeric: ControlId = serde_json::from_str("1204").unwrap();
        assert_eq!(numeric, ControlId::Numeric(1204));
        let text: ControlId = serde_json::from_str("\"VCFA-9X-000042\"").unwrap();
        assert_eq!(text.to_string(), "VCFA-9X-000042");
    }

    #[test]
    fn descriptor_defaults_to_enabled() {
        let d: ControlDescriptor =
            serde_json::from_str(r#"{"name": "ntp", "id": 7, "product": "esxi"}"#).unwrap();
        assert!(d.enabled);
        assert_eq!(d.qualified_name(), "esxi.ntp");
        assert!(!d.clone().disabled().enabled);
    }
}
