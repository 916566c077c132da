//! Roster Service
//!
//! Entry point for the live roster engine. Loads configuration, starts the
//! UpdateScheduler, logs engine events, and shuts down cleanly on Ctrl+C or
//! SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use roster_service::{
    config::save_config, graceful_shutdown, initialize_logging, initialize_logging_with_config, load_configuration,
    setup_signal_handlers, ServiceState,
};

#[derive(Parser, Debug)]
#[command(name = "roster-service", version, about = "Live cross-league fantasy roster aggregation")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scoring period to start in, overriding configuration
    #[arg(short, long)]
    period: Option<u32>,

    /// Run one visible refresh, print the view as JSON and exit
    #[arg(long)]
    once: bool,

    /// Write the effective configuration to this path and exit
    #[arg(long)]
    dump_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = load_configuration(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(period) = cli.period {
        config.service.initial_period = period;
    }

    if let Some(path) = &cli.dump_config {
        save_config(&config, path)?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    // RUST_LOG wins over the configured level
    if std::env::var_os("RUST_LOG").is_some() {
        initialize_logging()?;
    } else {
        let level = if config.service.development_mode { "debug" } else { config.logging.level.as_str() };
        initialize_logging_with_config(level, &config.logging.format)?;
    }

    info!("Starting Roster Service v{}", env!("CARGO_PKG_VERSION"));

    let service_state = Arc::new(ServiceState::new(config).await?);
    info!("Service state initialized");

    if cli.once {
        let view = service_state.refresh_once().await?;
        println!("{}", serde_json::to_string_pretty(&view).context("Failed to serialize view")?);
        return Ok(());
    }

    let shutdown_signal = setup_signal_handlers()?;
    info!("Signal handlers configured");

    let logger_handle = service_state.spawn_event_logger();

    info!("Starting UpdateScheduler...");
    let scheduler_handle = {
        let state = Arc::clone(&service_state);
        tokio::spawn(async move {
            if let Err(e) = state.start_scheduler().await {
                error!("UpdateScheduler failed: {:#}", e);
            }
        })
    };

    info!("Roster Service is running. Press Ctrl+C to shutdown gracefully.");
    let _ = shutdown_signal.await;

    info!("Shutdown signal received. Initiating graceful shutdown...");
    graceful_shutdown(service_state, scheduler_handle, logger_handle).await?;

    info!("Roster Service shutdown complete");
    Ok(())
}
