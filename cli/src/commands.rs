//! Subcommands. Each returns the process exit code on success; failures
//! bubble up as `anyhow::Error` and exit with [`codes::ERROR`].

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use tracing::info;

use config_compliance_core::compare::{self, CompareOptions, ComparisonPolicy};
use config_compliance_core::control::{Control, ControlId, Product};
use config_compliance_core::data::{load_value, save_document, ComplianceDocument};
use config_compliance_core::runner::Runner;
use config_compliance_core::snapshot::{SnapshotContext, SnapshotControl};
use config_compliance_core::types::{ComplianceStatus, OutputFormat, RemediateStatus, Settings};

pub mod codes {
    /// Compliant, skipped, or remediated.
    pub const SUCCESS: u8 = 0;

    /// Bad input, unreadable file, or a control that raised an error.
    pub const ERROR: u8 = 1;

    /// Drift remains: non-compliant, failed, or partially remediated.
    pub const DRIFT: u8 = 2;
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare two configuration files and print the drift
    Diff(DiffArgs),
    /// Check a snapshot against a desired-state document
    Check(CheckArgs),
    /// Remediate a snapshot towards a desired-state document
    Remediate(RemediateArgs),
    /// List the controls a desired-state document defines
    Controls(ControlsArgs),
}

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Current configuration (.json, .yaml or .yml)
    pub current: PathBuf,
    /// Desired configuration (.json, .yaml or .yml)
    pub desired: PathBuf,
    /// compare_in_order, sort_then_compare or identity_keyed
    #[arg(long)]
    pub policy: Option<ComparisonPolicy>,
    /// Record field identifying instances under identity_keyed
    #[arg(long)]
    pub instance_key: Option<String>,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Captured current-state document
    #[arg(long)]
    pub snapshot: PathBuf,
    /// Desired-state document
    #[arg(long)]
    pub desired: PathBuf,
}

#[derive(Args, Debug)]
pub struct RemediateArgs {
    /// Captured current-state document
    #[arg(long)]
    pub snapshot: PathBuf,
    /// Desired-state document
    #[arg(long)]
    pub desired: PathBuf,
    /// Write the remediated snapshot back to its file
    #[arg(long)]
    pub write: bool,
}

#[derive(Args, Debug)]
pub struct ControlsArgs {
    /// Desired-state document
    #[arg(long)]
    pub desired: PathBuf,
}

pub fn execute(command: Commands, settings: &Settings, output: OutputFormat) -> Result<u8> {
    match command {
        Commands::Diff(args) => diff(args, settings, output),
        Commands::Check(args) => check(args, settings, output),
        Commands::Remediate(args) => remediate(args, settings, output),
        Commands::Controls(args) => controls(args, settings, output),
    }
}

// ---- Commands ----

fn diff(args: DiffArgs, settings: &Settings, output: OutputFormat) -> Result<u8> {
    let current = load_value(&args.current)
        .with_context(|| format!("failed to read {}", args.current.display()))?;
    let desired = load_value(&args.desired)
        .with_context(|| format!("failed to read {}", args.desired.display()))?;
    let options = CompareOptions::new(
        args.policy.unwrap_or(settings.default_policy),
        args.instance_key
            .unwrap_or_else(|| settings.instance_key.clone()),
    );

    let drift = compare::diff(&current, &desired, &options)?;
    render(&drift, output)?;
    Ok(if drift.is_empty() { codes::SUCCESS } else { codes::DRIFT })
}

fn check(args: CheckArgs, settings: &Settings, output: OutputFormat) -> Result<u8> {
    let desired = load_document(&args.desired)?;
    let mut ctx = SnapshotContext::new(load_document(&args.snapshot)?);
    let registry = SnapshotControl::registry(&desired, settings)?;

    let run = Runner::new(&registry).check_compliance(&mut ctx, &desired);
    render(&run, output)?;
    Ok(match run.status {
        ComplianceStatus::Compliant | ComplianceStatus::Skipped => codes::SUCCESS,
        ComplianceStatus::NonCompliant | ComplianceStatus::Failed => codes::DRIFT,
        ComplianceStatus::Error => codes::ERROR,
    })
}

fn remediate(args: RemediateArgs, settings: &Settings, output: OutputFormat) -> Result<u8> {
    let desired = load_document(&args.desired)?;
    let mut ctx = SnapshotContext::new(load_document(&args.snapshot)?);
    let registry = SnapshotControl::registry(&desired, settings)?;

    let run = Runner::new(&registry).remediate(&mut ctx, &desired);
    if args.write && ctx.is_modified() {
        save_document(&args.snapshot, ctx.document())
            .with_context(|| format!("failed to write {}", args.snapshot.display()))?;
        info!(path = %args.snapshot.display(), "snapshot updated");
    }
    render(&run, output)?;
    Ok(match run.status {
        RemediateStatus::Success | RemediateStatus::Skipped => codes::SUCCESS,
        RemediateStatus::Failed | RemediateStatus::Partial => codes::DRIFT,
    })
}

#[derive(Serialize)]
struct ControlListing<'a> {
    product: Product,
    name: &'a str,
    id: &'a ControlId,
    enabled: bool,
    #[serde(flatten)]
    options: CompareOptions,
}

fn controls(args: ControlsArgs, settings: &Settings, output: OutputFormat) -> Result<u8> {
    let desired = load_document(&args.desired)?;
    let registry = SnapshotControl::registry(&desired, settings)?;

    let listing: Vec<ControlListing<'_>> = registry
        .iter()
        .map(|control| {
            let d = control.descriptor();
            ControlListing {
                product: d.product,
                name: &d.name,
                id: &d.id,
                enabled: d.enabled,
                options: control.compare_options(),
            }
        })
        .collect();
    render(&listing, output)?;
    Ok(codes::SUCCESS)
}

// ---- Helpers ----

fn load_document(path: &std::path::Path) -> Result<ComplianceDocument> {
    ComplianceDocument::load(path).with_context(|| format!("failed to read {}", path.display()))
}

fn render<T: Serialize>(value: &T, output: OutputFormat) -> Result<()> {
    let text = match output {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{}", text.trim_end());
    Ok(())
}
