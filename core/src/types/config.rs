use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::compare::{CompareOptions, ComparisonPolicy, DEFAULT_INSTANCE_KEY};
use crate::control::Product;
use crate::error::ParseEnumError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            _ => Err(ParseEnumError {
                what: "output format",
                value: s.to_string(),
            }),
        }
    }
}

/// Per-control comparison override; unset fields fall back to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<ComparisonPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub default_policy: ComparisonPolicy,
    #[serde(default = "default_instance_key")]
    pub instance_key: String,
    #[serde(default)]
    pub output: OutputFormat,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Keyed by `product.control`, e.g. `esxi.syslog`.
    #[serde(default)]
    pub controls: BTreeMap<String, ControlOverride>,
}

fn default_instance_key() -> String {
    DEFAULT_INSTANCE_KEY.to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Settings {
    /// Comparison options for one control, overrides applied.
    pub fn compare_options_for(&self, product: Product, control: &str) -> CompareOptions {
        let key = format!("{}.{}", product, control);
        let over = self.controls.get(&key);
        CompareOptions {
            policy: over
                .and_then(|o| o.policy)
                .unwrap_or(self.default_policy),
            instance_key: over
                .and_then(|o| o.instance_key.clone())
                .unwrap_or_else(|| self.instance_key.clone()),
        }
    }
}
