//! ccheck: the command-line entry point for config-compliance.
//!
//! # Usage
//!
//! ```text
//! ccheck diff current.json desired.json --policy identity_keyed
//! ccheck check --snapshot current.yaml --desired desired.yaml
//! ccheck remediate --snapshot current.yaml --desired desired.yaml --write
//! ccheck controls --desired desired.yaml
//! ```

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config_compliance_core::data::{settings, settings_path};
use config_compliance_core::types::{OutputFormat, Settings};

use commands::{codes, Commands};

/// Check and remediate configuration drift against a desired-state document
#[derive(Parser, Debug)]
#[command(name = "ccheck", version)]
struct Cli {
    /// Settings file (default: $CCHECK_CONFIG_DIR/settings.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format: json or yaml (default: from settings)
    #[arg(long, global = true)]
    output: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("ccheck: {:#}", e);
            ExitCode::from(codes::ERROR)
        }
    }
}

fn run(cli: Cli) -> Result<u8> {
    let settings = load_settings(cli.config.as_deref())?;
    init_tracing(&settings);
    let output = cli.output.unwrap_or(settings.output);
    commands::execute(cli.command, &settings, output)
}

/// An explicit `--config` must exist; the default location may be absent.
fn load_settings(explicit: Option<&std::path::Path>) -> Result<Settings> {
    match explicit {
        Some(path) => settings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display())),
        None => match resolve_config_dir() {
            Some(dir) => {
                let path = settings_path(&dir);
                settings::load_or_default(&path)
                    .with_context(|| format!("failed to load settings from {}", path.display()))
            }
            None => Ok(settings::default_settings()),
        },
    }
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// `None` when neither `CCHECK_CONFIG_DIR` nor `HOME` is set; settings then
/// come from the defaults alone.
fn resolve_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("CCHECK_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }
    let home = std::env::var_os("HOME")?;
    Some(PathBuf::from(home).join(".config").join("config-compliance"))
}
