use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::compare::{ComparisonPolicy, DEFAULT_INSTANCE_KEY};
use crate::control::Product;
use crate::error::SettingsError;
use crate::types::config::{OutputFormat, Settings};


/// File name looked up inside the configuration directory.
pub const SETTINGS_FILE: &str = "settings.yaml";


/// Returns sensible defaults for all settings fields.
pub fn default_settings() -> Settings {
    Settings {
        version: "0.1.0".into(),
        default_policy: ComparisonPolicy::SortThenCompare,
        instance_key: DEFAULT_INSTANCE_KEY.into(),
        output: OutputFormat::Json,
        log_filter: "info".into(),
        controls: BTreeMap::new(),
    }
}


/// Load `Settings` from a YAML file.
pub fn load(path: &Path) -> Result<Settings, SettingsError> {
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content)
}


/// Like [`load`], but a missing file yields the defaults.
pub fn load_or_default(path: &Path) -> Result<Settings, SettingsError> {
    if path.exists() {
        load(path)
    } else {
        debug!(path = %path.display(), "no settings file, using defaults");
        Ok(default_settings())
    }
}


/// Save `Settings` as YAML.
pub fn save(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    let content = serde_yaml::to_string(settings)?;
    std::fs::write(path, content).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })
}


/// Parse and validate settings from a YAML string. An empty document yields
/// the defaults.
pub fn parse(content: &str) -> Result<Settings, SettingsError> {
    if content.trim().is_empty() {
        return Ok(default_settings());
    }
    let mut settings: Settings = serde_yaml::from_str(content)?;
    if settings.version.is_empty() {
        settings.version = default_settings().version;
    }
    validate(&settings)?;
    Ok(settings)
}


fn validate(settings: &Settings) -> Result<(), SettingsError> {
    if settings.instance_key.trim().is_empty() {
        return Err(SettingsError::Invalid("instance_key must not be empty".into()));
    }
    for (key, over) in &settings.controls {
        let Some((product, control)) = key.split_once('.') else {
            return Err(SettingsError::Invalid(format!(
                "control override '{}' must be written as product.control",
                key
            )));
        };
        product
            .parse::<Product>()
            .map_err(|e| SettingsError::Invalid(format!("control override '{}': {}", key, e)))?;
        if control.is_empty() {
            return Err(SettingsError::Invalid(format!(
                "control override '{}' has no control name",
                key
            )));
        }
        if over.instance_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            return Err(SettingsError::Invalid(format!(
                "control override '{}' has an empty instance_key",
                key
            )));
        }
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::config::ControlOverride;

    #[test]
    fn empty_content_is_default() {
        assert_eq!(parse("").unwrap(), default_settings());
        assert_eq!(parse("  \n").unwrap(), default_settings());
    }

    #[test]
    fn parse_full_settings() {
        let s = parse(
            "default_policy: compare_in_order\n\
             instance_key: id\n\
             output: yaml\n\
             log_filter: debug\n\
             controls:\n\
             \x20 esxi.syslog:\n\
             \x20   policy: identity_keyed\n",
        )
        .unwrap();
        assert_eq!(s.default_policy, ComparisonPolicy::CompareInOrder);
        assert_eq!(s.instance_key, "id");
        assert_eq!(s.output, OutputFormat::Yaml);
        assert_eq!(s.log_filter, "debug");
        assert_eq!(s.version, "0.1.0");
        assert_eq!(
            s.controls.get("esxi.syslog"),
            Some(&ControlOverride { policy: Some(ComparisonPolicy::IdentityKeyed), instance_key: None })
        );
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(matches!(parse("default_policy: fuzzy\n"), Err(SettingsError::Yaml(_))));
    }

    #[test]
    fn bad_override_key_is_rejected() {
        let err = parse("controls:\n  syslog:\n    policy: identity_keyed\n").unwrap_err();
        assert!(err.to_string().contains("product.control"));
        let err = parse("controls:\n  vcf.syslog: {}\n").unwrap_err();
        assert!(err.to_string().contains("unknown product 'vcf'"));
    }

    #[test]
    fn empty_instance_key_is_rejected() {
        assert!(matches!(parse("instance_key: ''\n"), Err(SettingsError::Invalid(_))));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        let mut settings = default_settings();
        settings.output = OutputFormat::Yaml;
        settings.controls.insert(
            "vcenter.ntp".into(),
            ControlOverride { policy: Some(ComparisonPolicy::CompareInOrder), instance_key: None },
        );
        save(&path, &settings).unwrap();
        assert_eq!(load(&path).unwrap(), settings);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_or_default(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(settings, default_settings());
        assert!(matches!(load(&dir.path().join("absent.yaml")), Err(SettingsError::Io { .. })));
    }
}
