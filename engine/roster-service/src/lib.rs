//! Roster Service Library
//!
//! Wires the roster engine into a runnable service: layered configuration,
//! logging setup, the on-disk league source, and graceful shutdown handling.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub mod config;
pub mod fixture;
pub mod logging;
pub mod service;
pub mod signals;

pub use config::ServiceConfig;
pub use fixture::FixtureSource;
pub use logging::{initialize_logging, initialize_logging_with_config};
pub use service::ServiceState;
pub use signals::{graceful_shutdown, setup_signal_handlers};

/// Load configuration from an optional file (or `ROSTER_CONFIG`) and the environment
pub fn load_configuration(config_file: Option<&Path>) -> Result<ServiceConfig> {
    let from_env = std::env::var_os("ROSTER_CONFIG").map(PathBuf::from);
    let config_file = config_file.or(from_env.as_deref());
    config::load_config(config_file).context("Failed to load service configuration")
}
