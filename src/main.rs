//! # Impresora CLI
//!
//! Binary entry point for the printer HTTP facade.
//!
//! ## Usage
//!
//! ```bash
//! # Serve against a real network printer
//! PRINTER_TYPE=network PRINTER_IP=10.0.0.20 impresora serve
//!
//! # Serve without hardware (health checks, integration environments)
//! PRINTER_TYPE=dummy impresora serve --listen 127.0.0.1:8000
//! ```
//!
//! Variables may also come from a `.env` file in the working directory.
//! `LOG_LEVEL` selects the tracing filter (default `info`).

use clap::{Parser, Subcommand};
use std::sync::Arc;

use impresora::{
    ImpresoraError, PrinterConfig, backend,
    server::{self, AppState, ServerConfig},
};

/// Impresora - ESC/POS printer HTTP facade
#[derive(Parser, Debug)]
#[command(name = "impresora")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8000")]
        listen: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ImpresoraError> {
    // .env is optional; real deployments may set variables directly.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { listen } => {
            let config = PrinterConfig::from_env()?;
            tracing::info!(transport = config.transport.kind(), "configuration loaded");

            let printer = backend::connect(&config)?;
            tracing::info!(backend = printer.name(), "printer initialized");

            let state = Arc::new(AppState::new(config, printer));
            server::serve(ServerConfig { listen_addr: listen }, state).await
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let level = std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}
