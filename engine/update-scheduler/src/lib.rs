//! # UpdateScheduler
//!
//! Keeps the roster engine current. Polls every connected league on a fixed
//! interval, fans fetches out over a bounded pool, refuses to commit a pass
//! unless every expected league arrived, and publishes what changed to
//! observers.
//!
//! Two named entry points share one pipeline: [`UpdateScheduler::refresh_visible`]
//! for first loads and explicit refreshes, and [`UpdateScheduler::refresh_silent`]
//! for background polls. Scoring-period changes arrive as messages, are
//! debounced, and cancel whatever pass is in flight.

pub mod config;
pub mod error;
pub mod events;
pub mod metrics;
pub mod provider;
pub mod scheduler;


#[cfg(test)]
mod integration_tests;

pub use config::SchedulerConfig;
pub use error::SchedulerError;
pub use events::{AbortReason, EngineEvent};
pub use metrics::{MetricsCollector, SchedulerMetrics};
pub use provider::{MatchupSourceProvider, ScoringPeriod};
pub use scheduler::{CancelHandle, UpdateScheduler};

/// Re-export commonly used types
pub use roster_engine::{CommitReport, EngineStatus, UpdateMode};

/// Current version of the UpdateScheduler
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default background poll interval (30 seconds)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 30_000;

/// Default cap on in-flight league fetches
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 2;

/// Default quiet period for period-changed events
pub const DEFAULT_DEBOUNCE_WINDOW_MS: u64 = 500;

/// Default per-league fetch timeout
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 15_000;

/// Buffered period-changed events before senders wait
pub const PERIOD_CHANNEL_CAPACITY: usize = 16;
