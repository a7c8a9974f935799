//! `liha-conformance`: activates the LiHa system node manager and validates
//! the resulting address space.
//!
//! Checks node identity, reference symmetry and targets, the instance
//! hierarchy and type definitions.
//!
//! **Usage:**
//! ```
//! liha-conformance [--config <file>] [--definitions <dir>] [--json]
//! ```
//!
//! Exits non-zero if any conformance check fails.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use liha_conformance::run_all;
use liha_model::NamespaceTable;
use liha_nodemanager::{
    ApplicationConfiguration, ExternalReferences, LiHaConfiguration, LiHaSystemNodeManager,
    ServerContext,
};
use tracing_subscriber::{fmt, EnvFilter};

/// Run the LiHa system conformance checks.
#[derive(Parser)]
#[command(
    name = "liha-conformance",
    about = "Validate the LiHa system address space"
)]
struct Args {
    /// Application configuration (TOML). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the definition sources; overrides the configuration.
    #[arg(long)]
    definitions: Option<PathBuf>,

    /// Print the report as JSON instead of text.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut configuration = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            ApplicationConfiguration::from_toml_str(&text)
                .with_context(|| format!("Invalid configuration {}", path.display()))?
        }
        None => ApplicationConfiguration::default(),
    };
    if let Some(root) = args.definitions {
        let mut liha = LiHaConfiguration::from_application(&configuration)?;
        liha.definition_root = root;
        configuration.set_extension(LiHaConfiguration::EXTENSION_NAME, &liha)?;
    }

    let server = ServerContext::new(NamespaceTable::shared());
    let manager = LiHaSystemNodeManager::new(&server, &configuration)
        .context("Failed to create the LiHa system node manager")?;
    let mut outbox = ExternalReferences::new();
    manager
        .create_address_space(&mut outbox)
        .context("Failed to activate the LiHa system node manager")?;

    let report = run_all(&manager, &outbox)?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize the report")?
        );
    } else {
        println!("LiHa System Conformance Report");
        println!("==============================");
        println!();
        println!("{report}");
    }

    if !report.all_passed() {
        eprintln!(
            "Conformance FAILED: {} check(s) did not pass.",
            report.failure_count()
        );
        process::exit(1);
    }

    if !args.json {
        println!("Conformance PASSED.");
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
