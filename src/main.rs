//! sharebridge - Azure Data Share Provisioning Tool
//!
//! A command-line tool for provisioning a pair of Azure Data Share
//! accounts and wiring a snapshot-based share between them.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod arm;
mod auth;
mod cli;
mod config;
mod error;
mod share;
mod utils;

use crate::cli::{Cli, Commands};
use crate::error::Result;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.debug);

    // Execute the command
    if let Err(e) = run(cli).await {
        error!("Error: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!("Starting sharebridge");

    // Load configuration differently based on command
    let config = match &cli.command {
        Commands::Init { .. } | Commands::Completions { .. } | Commands::Version => {
            // No configuration required
            None
        }
        Commands::Config { .. } => {
            // For config commands, load without validation
            Some(config::load_config(cli.config.as_deref()).await?)
        }
        _ => {
            // For provisioning commands, load and validate
            let config = config::load_config(cli.config.as_deref()).await?;
            config.validate()?;
            Some(config)
        }
    };

    // Execute the command
    cli.execute(config).await?;

    Ok(())
}

fn init_logging(debug: bool) {
    let default_filter = if debug {
        "sharebridge=debug"
    } else {
        "sharebridge=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
