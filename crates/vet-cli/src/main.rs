//! Veterinary answer service CLI
//!
//! # Usage
//!
//! ```bash
//! vet-assist ask "my cow has blisters on its hooves"
//! vet-assist build --records kb.json --out-dir ./data
//! vet-assist inspect
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/vet-assist/config.toml)
//! 3. Environment variables (VET_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use vet_cli::{init_logging, load_settings, run_ask, run_build, run_inspect, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = load_settings(cli.config.as_deref(), cli.log_level.as_deref())?;
    init_logging(&settings)?;

    match cli.command {
        Commands::Ask {
            query,
            top_k,
            mode,
            json,
        } => {
            run_ask(settings, query, top_k, mode.map(Into::into), json).await?;
        }
        Commands::Build {
            records,
            out_dir,
            batch_size,
            metric,
        } => {
            run_build(settings, &records, &out_dir, batch_size, metric.into()).await?;
        }
        Commands::Inspect { index, content } => {
            run_inspect(settings, index, content).await?;
        }
    }

    Ok(())
}
