pub mod document;
pub mod settings;

use std::path::{Path, PathBuf};

pub use document::{load_value, save_document, ComplianceDocument, ProductConfig};

/// Location of the settings file inside `config_dir`.
pub fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join(settings::SETTINGS_FILE)
}
