// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dataflow Explorer
//!
//! Loads a domain flow graph descriptor (or builds the arithmetic demo when
//! none is given), orders it, evaluates it and logs the outcome.
//!
//! ```text
//! dataflow_explorer [DESCRIPTOR] [--settings PATH] [--init-settings]
//! ```
//!
//! `--init-settings` writes default settings to the settings path and exits.

mod demo;
mod loader;
mod settings;

use clap::Parser;
use dataflow_graph::{ConnectError, GraphSession, ImportError};
use settings::{ExplorerSettings, SettingsError, SETTINGS_FILE_NAME};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Dataflow Explorer: orders and evaluates domain flow graphs
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "dataflow_explorer", version, about, long_about = None)]
struct CliArgs {
    /// Descriptor file (`.ron` or `.json`); builds the arithmetic demo when omitted
    #[arg(value_name = "DESCRIPTOR")]
    descriptor: Option<PathBuf>,

    /// Settings file path
    #[arg(short, long, default_value = SETTINGS_FILE_NAME)]
    settings: PathBuf,

    /// Write default settings to the settings path and exit
    #[arg(long)]
    init_settings: bool,
}

/// Top-level explorer failure
#[derive(Debug, thiserror::Error)]
enum ExplorerError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Load(#[from] loader::LoadError),

    #[error("Import failed: {0}")]
    Import(#[from] ImportError),

    #[error("Demo graph could not be linked: {0}")]
    Connect(#[from] ConnectError),
}

fn init_logging(settings: &ExplorerSettings) {
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let mut rejected = Vec::new();
    for directive in ["dataflow_graph=info", settings.log_filter.as_str()] {
        match directive.parse() {
            Ok(parsed) => env_filter = env_filter.add_directive(parsed),
            Err(error) => rejected.push(format!("{directive:?}: {error}")),
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    for message in rejected {
        tracing::warn!("Ignoring log filter {message}");
    }
}

fn run(args: &CliArgs, settings: &ExplorerSettings) -> Result<(), ExplorerError> {
    let mut session = GraphSession::new(settings.graph.clone());

    match &args.descriptor {
        Some(path) => {
            let descriptor = loader::load_descriptor(path)?;
            let report = session.import(&descriptor)?;
            for (edge, reason) in &report.rejected {
                tracing::warn!(
                    "Edge {}[{}] -> {}[{}] skipped: {reason}",
                    edge.source,
                    edge.source_slot,
                    edge.sink,
                    edge.sink_slot
                );
            }
        }
        None => {
            tracing::info!("No descriptor given, building the arithmetic demo");
            let demo = demo::build_arithmetic(&mut session)?;
            tracing::debug!(
                constant = demo.constant.raw(),
                add = demo.add.raw(),
                "built arithmetic demo"
            );
        }
    }

    let order = session.sort();
    demo::log_order(&session, &order);

    if settings.evaluate_on_load {
        match session.evaluate() {
            Ok(report) => demo::log_report(&session, &report),
            Err(cycle) => tracing::warn!("Evaluation skipped: {cycle}"),
        }
    }
    Ok(())
}

fn main() {
    let args = CliArgs::parse();
    if args.init_settings {
        if let Err(e) = ExplorerSettings::default().save(&args.settings) {
            eprintln!("{e}");
            std::process::exit(1);
        }
        println!("Wrote {}", args.settings.display());
        return;
    }

    let settings = ExplorerSettings::load_or_default(&args.settings);
    init_logging(settings.as_ref().unwrap_or(&ExplorerSettings::default()));

    tracing::info!("Starting Dataflow Explorer v{}", env!("CARGO_PKG_VERSION"));

    let result = settings
        .map_err(ExplorerError::from)
        .and_then(|settings| run(&args, &settings));
    if let Err(e) = result {
        tracing::error!("Explorer failed: {e}");
        std::process::exit(1);
    }
}
