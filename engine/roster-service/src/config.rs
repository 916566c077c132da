//! Service configuration management

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use roster_engine::{LeagueRef, Preferences};
use survival_ranker::RankerConfig;
use update_scheduler::SchedulerConfig;

/// Prefix for every environment override (`ROSTER_SCHEDULER__POLL_INTERVAL_MS`, ...)
pub const ENV_PREFIX: &str = "ROSTER";

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Service-level configuration
    pub service: ServiceSettings,

    /// Where league data comes from
    pub source: SourceSettings,

    /// UpdateScheduler configuration
    pub scheduler: SchedulerConfig,

    /// Engine preferences
    pub preferences: Preferences,

    /// SurvivalRanker configuration
    pub ranker: RankerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Root of the fixture tree (`<data_dir>/period_<n>/<league_id>.json`)
    pub data_dir: PathBuf,

    /// Enable development mode (more verbose logging, etc.)
    pub development_mode: bool,

    /// Season the service starts in
    pub season: u16,

    /// Scoring period the service starts in
    pub initial_period: u32,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_secs: u64,
}

/// League source settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Connected leagues listed inline
    pub leagues: Vec<LeagueRef>,

    /// JSON file with more connected leagues
    pub leagues_file: Option<PathBuf>,

    /// Player directory JSON; enrichment and full-directory search are off without it
    pub directory_file: Option<PathBuf>,

    /// NFL team codes whose games are currently live
    pub live_teams: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            development_mode: false,
            season: 2025,
            initial_period: 1,
            shutdown_timeout_secs: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

/// Load configuration: defaults, then the optional TOML file, then environment
pub fn load_config(config_file: Option<&Path>) -> Result<ServiceConfig> {
    let mut builder = Config::builder();

    if let Some(path) = config_file {
        tracing::debug!("Loading configuration from file: {:?}", path);
        builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX).prefix_separator("_").separator("__").try_parsing(true),
    );

    let mut config: ServiceConfig = builder
        .build()
        .context("Failed to read configuration sources")?
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    load_from_env(&mut config)?;
    validate_config(&config)?;

    Ok(config)
}

/// Short environment overrides for the settings changed most often
fn load_from_env(config: &mut ServiceConfig) -> Result<()> {
    if let Ok(level) = std::env::var("ROSTER_LOG_LEVEL") {
        config.logging.level = level;
    }

    if let Ok(format) = std::env::var("ROSTER_LOG_FORMAT") {
        config.logging.format = format;
    }

    if let Ok(dev_mode) = std::env::var("ROSTER_DEV_MODE") {
        config.service.development_mode = dev_mode.parse().unwrap_or(false);
    }

    if let Ok(data_dir) = std::env::var("ROSTER_DATA_DIR") {
        config.service.data_dir = PathBuf::from(data_dir);
    }

    if let Ok(period) = std::env::var("ROSTER_PERIOD") {
        config.service.initial_period =
            period.parse().with_context(|| format!("ROSTER_PERIOD is not a period number: {period}"))?;
    }

    if let Ok(teams) = std::env::var("ROSTER_LIVE_TEAMS") {
        config.source.live_teams =
            teams.split(',').map(str::trim).filter(|team| !team.is_empty()).map(str::to_string).collect();
    }

    Ok(())
}

/// Validate configuration
pub fn validate_config(config: &ServiceConfig) -> Result<()> {
    match config.logging.level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow::anyhow!("Invalid log level: {}", config.logging.level)),
    }

    match config.logging.format.as_str() {
        "json" | "pretty" | "compact" => {}
        _ => return Err(anyhow::anyhow!("Invalid log format: {}", config.logging.format)),
    }

    if config.service.initial_period == 0 {
        return Err(anyhow::anyhow!("Scoring periods start at 1"));
    }

    config.scheduler.validate().context("Invalid scheduler configuration")?;
    config.preferences.validate().context("Invalid preferences")?;
    config.ranker.validate().context("Invalid ranker configuration")?;

    Ok(())
}

/// Save configuration to a TOML file
pub fn save_config(config: &ServiceConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config).context("Failed to serialize configuration")?;
    std::fs::write(path, content).with_context(|| format!("Failed to write configuration to {path:?}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_engine::SourcePlatform;

    #[test]
    fn test_default_config_is_valid() {
        let config = ServiceConfig::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.scheduler.poll_interval_ms, 30_000);
        assert!(config.source.leagues.is_empty());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.toml");
        std::fs::write(
            &path,
            r#"
[service]
initial_period = 6

[scheduler]
max_concurrent_fetches = 4

[[source.leagues]]
league_id = "L1"
name = "Dynasty"
source = "sleeper"

[logging]
format = "json"
"#,
        )
        .unwrap();

        let config = load_config(Some(path.as_path())).unwrap();
        assert_eq!(config.service.initial_period, 6);
        assert_eq!(config.service.season, 2025);
        assert_eq!(config.scheduler.max_concurrent_fetches, 4);
        assert_eq!(config.scheduler.debounce_window_ms, 500);
        assert_eq!(config.source.leagues.len(), 1);
        assert_eq!(config.source.leagues[0].source, SourcePlatform::Sleeper);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(dir.path().join("absent.toml").as_path())).is_err());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = ServiceConfig::default();
        config.logging.format = "xml".to_string();
        assert!(validate_config(&config).is_err());

        let mut config = ServiceConfig::default();
        config.scheduler.max_concurrent_fetches = 0;
        assert!(validate_config(&config).is_err());

        let mut config = ServiceConfig::default();
        config.service.initial_period = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.toml");

        let mut config = ServiceConfig::default();
        config.source.live_teams = vec!["KC".to_string(), "BUF".to_string()];
        config.preferences.show_eliminated_survival = true;
        save_config(&config, &path).unwrap();

        let loaded = load_config(Some(path.as_path())).unwrap();
        assert_eq!(loaded.source.live_teams, vec!["KC".to_string(), "BUF".to_string()]);
        assert!(loaded.preferences.show_eliminated_survival);
    }
}
