mod main_runtime;

use box_claimer::cli::{Cli, Commands};
use box_claimer::config::AppConfig;
use box_claimer::error::{ClaimerError, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

use crate::main_runtime::{build_scheduler, init_logging};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match AppConfig::load_from(&cli.config_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration from {}: {}", cli.config_dir, e);
            return Err(e.into());
        }
    };
    if let Some(strategy) = cli.strategy {
        config.claim.strategy = strategy;
    }

    init_logging(&config.logging);

    if let Err(errors) = config.validate() {
        for e in &errors {
            error!("Configuration: {}", e);
        }
        return Err(ClaimerError::InvalidConfig(errors));
    }

    let scheduler = build_scheduler(&config).map_err(|e| {
        error!("Startup failed: {}", e);
        e
    })?;

    match cli.command() {
        Commands::Run => {
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            tokio::spawn(async move {
                match signal::ctrl_c().await {
                    Ok(()) => {
                        info!("Shutdown signal received");
                        let _ = shutdown_tx.send(true);
                    }
                    Err(e) => {
                        // Keep the sender alive so the loop is not stopped.
                        error!("Failed to listen for shutdown signal: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            });

            scheduler.run(shutdown_rx).await;
        }
        Commands::Status => {
            scheduler.status().await;
        }
        Commands::Claim => {
            let (outcome, _) = scheduler.claim_once().await;
            info!("Claim outcome: {}", outcome);
        }
    }

    Ok(())
}
