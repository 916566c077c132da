//! Configuration for the UpdateScheduler

use crate::error::SchedulerError;
use crate::{
    DEFAULT_DEBOUNCE_WINDOW_MS, DEFAULT_FETCH_TIMEOUT_MS, DEFAULT_MAX_CONCURRENT_FETCHES, DEFAULT_POLL_INTERVAL_MS,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for the UpdateScheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Background poll interval in milliseconds
    pub poll_interval_ms: u64,

    /// Maximum number of league fetches in flight at once
    pub max_concurrent_fetches: usize,

    /// Quiet period before a burst of period-changed events triggers a refresh
    pub debounce_window_ms: u64,

    /// Silent passes republish scalar stats only when they move by more than this
    pub stat_change_epsilon: f64,

    /// Consecutive empty passes before the engine reports no data
    pub max_empty_attempts: u32,

    /// Per-league fetch timeout in milliseconds
    pub fetch_timeout_ms: u64,

    /// Capacity of the observer event channel
    pub event_channel_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            debounce_window_ms: DEFAULT_DEBOUNCE_WINDOW_MS,
            stat_change_epsilon: 0.01,
            max_empty_attempts: 3,
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            event_channel_capacity: 64,
        }
    }
}

impl SchedulerConfig {
    /// Get poll interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Get debounce window as Duration
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_window_ms)
    }

    /// Get per-league fetch timeout as Duration
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.poll_interval_ms == 0 {
            return Err(SchedulerError::Config("poll_interval_ms must be greater than 0".to_string()));
        }
        if self.max_concurrent_fetches == 0 {
            return Err(SchedulerError::Config("max_concurrent_fetches must be at least 1".to_string()));
        }
        if self.debounce_window_ms == 0 {
            return Err(SchedulerError::Config("debounce_window_ms must be greater than 0".to_string()));
        }
        if self.stat_change_epsilon < 0.0 {
            return Err(SchedulerError::Config("stat_change_epsilon must not be negative".to_string()));
        }
        if self.max_empty_attempts == 0 {
            return Err(SchedulerError::Config("max_empty_attempts must be at least 1".to_string()));
        }
        if self.event_channel_capacity == 0 {
            return Err(SchedulerError::Config("event_channel_capacity must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SchedulerError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| SchedulerError::Config(format!("failed to read {:?}: {e}", path.as_ref())))?;
        let config: SchedulerConfig =
            toml::from_str(&content).map_err(|e| SchedulerError::Config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SchedulerError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| SchedulerError::Config(format!("failed to encode: {e}")))?;
        std::fs::write(path.as_ref(), content)
            .map_err(|e| SchedulerError::Config(format!("failed to write {:?}: {e}", path.as_ref())))?;
        Ok(())
    }
}
