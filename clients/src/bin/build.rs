//! `liha-build`: activates the LiHa system node manager from its definition
//! sources and writes the resulting address space as JSON.
//!
//! **Outputs:**
//! - `<out>/liha.addressspace.json`: namespaces, nodes, references and the
//!   external-references outbox
//!
//! **Usage:**
//! ```
//! liha-build [--config <file>] [--definitions <dir>] [--out <path>]
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use liha_model::NamespaceTable;
use liha_nodemanager::serializer::json;
use liha_nodemanager::{
    ApplicationConfiguration, ExternalReferences, LiHaConfiguration, LiHaSystemNodeManager,
    ServerContext,
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Build the LiHa system address space.
#[derive(Parser)]
#[command(name = "liha-build", about = "Build the LiHa system address space")]
struct Args {
    /// Application configuration (TOML). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the definition sources; overrides the configuration.
    #[arg(long)]
    definitions: Option<PathBuf>,

    /// Output directory for generated artifacts.
    #[arg(long, default_value = "public")]
    out: PathBuf,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let configuration = load_configuration(args.config.as_ref(), args.definitions)?;

    let server = ServerContext::new(NamespaceTable::shared());
    let manager = LiHaSystemNodeManager::new(&server, &configuration)
        .context("Failed to create the LiHa system node manager")?;
    let mut outbox = ExternalReferences::new();
    let summary = manager
        .create_address_space(&mut outbox)
        .context("Failed to activate the LiHa system node manager")?;

    println!(
        "LiHa system address space: {} sources, {} nodes ({} allocated), {} external references",
        summary.sources, summary.nodes, summary.allocated, summary.external_references
    );

    let out = &args.out;
    fs::create_dir_all(out)
        .with_context(|| format!("Failed to create output directory: {}", out.display()))?;
    let json_path = out.join("liha.addressspace.json");
    let json_str = serde_json::to_string_pretty(&json::to_json(&manager, &outbox))
        .context("Failed to serialize the address space")?;
    fs::write(&json_path, &json_str)
        .with_context(|| format!("Failed to write {}", json_path.display()))?;
    info!(path = %json_path.display(), "wrote address space");
    println!("  Written: {}", json_path.display());

    println!("Build complete.");
    Ok(())
}

fn load_configuration(
    config: Option<&PathBuf>,
    definitions: Option<PathBuf>,
) -> Result<ApplicationConfiguration> {
    let mut configuration = match config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            ApplicationConfiguration::from_toml_str(&text)
                .with_context(|| format!("Invalid configuration {}", path.display()))?
        }
        None => ApplicationConfiguration::default(),
    };
    if let Some(root) = definitions {
        let mut liha = LiHaConfiguration::from_application(&configuration)?;
        liha.definition_root = root;
        configuration.set_extension(LiHaConfiguration::EXTENSION_NAME, &liha)?;
    }
    Ok(configuration)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
