//! Assemble one snapshot from a raw bundle file and print it as JSON

use anyhow::Context;
use clap::Parser;
use sitrep_engine::{EngineConfig, RawBundle, SnapshotAssembler};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Raw bundle JSON captured by the ingestion collaborator
    bundle: PathBuf,

    /// Engine configuration file; `SITREP_*` environment variables otherwise
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => EngineConfig::from_env().context("failed to load configuration from environment")?,
    };

    let content = std::fs::read_to_string(&args.bundle)
        .with_context(|| format!("failed to read bundle {}", args.bundle.display()))?;
    let bundle: RawBundle = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse bundle {}", args.bundle.display()))?;

    let assembler = SnapshotAssembler::new(config);
    let snapshot = assembler.assemble(&bundle)?;

    tracing::info!("{}", snapshot.headline());
    tracing::info!("{}", snapshot.health().summary());
    println!("{}", serde_json::to_string_pretty(&*snapshot)?);

    Ok(())
}
