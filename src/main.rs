//! CEP race service.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌───────────────────────────────────────────────────┐
//!                    │                      CEP RACE                     │
//!                    │                                                   │
//!   GET /cep/{cep}   │  ┌─────────┐    ┌──────────┐    ┌─────────────┐   │
//!   ─────────────────┼─▶│  http   │───▶│ handlers │───▶│    race     │   │
//!                    │  │ server  │    │          │    │ coordinator │   │
//!                    │  └─────────┘    └──────────┘    └──────┬──────┘   │
//!                    │                                ┌──────┴──────┐    │
//!                    │                                ▼             ▼    │
//!                    │                         ┌───────────┐ ┌─────────┐ │
//!                    │                         │brasil_api │ │ via_cep │ │──▶ providers
//!                    │                         └───────────┘ └─────────┘ │
//!                    │  config · observability · lifecycle               │
//!                    └───────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use cep_race::config::{load_config, ServiceConfig};
use cep_race::lifecycle;
use cep_race::observability::logging;

#[derive(Parser)]
#[command(name = "cep-race")]
#[command(about = "Resolve Brazilian postal codes by racing BrasilAPI and ViaCEP", long_about = None)]
struct Cli {
    /// TOML configuration file; watched for changes while running.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind_address: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(bind_address) = cli.bind_address {
        config.listener.bind_address = bind_address;
    }

    logging::init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "cep-race starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        timeout_ms = config.lookup.timeout_ms,
        cancel_losers = config.lookup.cancel_losers,
        "Configuration loaded"
    );

    lifecycle::run(config, cli.config.as_deref()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
