//! Desired-state and snapshot documents.
//!
//! A compliance document keys configuration by product and control name
//! under a top-level `compliance_config` entry:
//!
//! ```yaml
//! compliance_config:
//!   vcenter:
//!     ntp:
//!       servers: [ntp1.example.com]
//!   esxi:
//!     syslog:
//!       - name: host-01
//!         loghost: udp://10.0.0.5:514
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::control::Product;
use crate::error::DocumentError;
use crate::types::value::ConfigValue;

pub type ProductConfig = BTreeMap<String, ConfigValue>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplianceDocument {
    pub compliance_config: BTreeMap<Product, ProductConfig>,
}

impl ComplianceDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        load_file(path)
    }

    pub fn from_json_str(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    pub fn from_value(value: ConfigValue) -> Result<Self, DocumentError> {
        let json: serde_json::Value = value.into();
        serde_json::from_value(json).map_err(|e| DocumentError::Shape(e.to_string()))
    }

    pub fn to_value(&self) -> ConfigValue {
        let mut products = BTreeMap::new();
        for (product, controls) in &self.compliance_config {
            products.insert(
                product.to_string(),
                ConfigValue::Mapping(controls.clone()),
            );
        }
        let mut root = BTreeMap::new();
        root.insert("compliance_config".to_string(), ConfigValue::Mapping(products));
        ConfigValue::Mapping(root)
    }

    pub fn get(&self, product: Product, control: &str) -> Option<&ConfigValue> {
        self.compliance_config.get(&product).and_then(|c| c.get(control))
    }

    pub fn insert(&mut self, product: Product, control: impl Into<String>, value: ConfigValue) {
        self.compliance_config
            .entry(product)
            .or_default()
            .insert(control.into(), value);
    }

    /// `(product, control, desired)` triples in product then control order.
    pub fn entries(&self) -> impl Iterator<Item = (Product, &str, &ConfigValue)> {
        self.compliance_config.iter().flat_map(|(product, controls)| {
            controls
                .iter()
                .map(move |(name, value)| (*product, name.as_str(), value))
        })
    }

    pub fn len(&self) -> usize {
        self.compliance_config.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read a bare configuration tree from a `.json`, `.yaml` or `.yml` file.
pub fn load_value(path: &Path) -> Result<ConfigValue, DocumentError> {
    load_file(path)
}

/// Write `document` in the format implied by the file extension.
pub fn save_document(path: &Path, document: &ComplianceDocument) -> Result<(), DocumentError> {
    let content = match Format::of(path)? {
        Format::Json => serde_json::to_string_pretty(document).map_err(|source| DocumentError::Json {
            path: path.to_path_buf(),
            source,
        })?,
        Format::Yaml => serde_yaml::to_string(document).map_err(|source| DocumentError::Yaml {
            path: path.to_path_buf(),
            source,
        })?,
    };
    std::fs::write(path, content).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })
}

enum Format {
    Json,
    Yaml,
}

impl Format {
    fn of(path: &Path) -> Result<Format, DocumentError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("yaml") | Some("yml") => Ok(Format::Yaml),
            _ => Err(DocumentError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

fn load_file<T>(path: &Path) -> Result<T, DocumentError>
where
    T: for<'de> Deserialize<'de>,
{
    let format = Format::of(path)?;
    let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    match format {
        Format::Json => serde_json::from_str(&content).map_err(|source| DocumentError::Json {
            path: path.to_path_buf(),
            source,
        }),
        Format::Yaml => serde_yaml::from_str(&content).map_err(|source| DocumentError::Yaml {
            path: path.to_path_buf(),
            source,
        }),
    }
}
