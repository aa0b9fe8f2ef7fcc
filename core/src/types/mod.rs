pub mod config;
pub mod status;
pub mod value;

pub use config::{ControlOverride, OutputFormat, Settings};
pub use status::{ComplianceStatus, RemediateStatus};
pub use value::{ConfigValue, Mapping, Number, Scalar, ValueKind};
