//! Metrics collection for the UpdateScheduler

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Metrics collected by the UpdateScheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerMetrics {
    /// Passes that claimed a generation
    pub passes_started: u64,

    /// Passes committed to the engine, by mode
    pub visible_commits: u64,
    pub silent_commits: u64,

    /// Passes dropped because some league contexts were missing
    pub partial_aborts: u64,

    /// Passes cancelled while fetching
    pub cancelled_passes: u64,

    /// Passes that finished after a newer generation was claimed
    pub superseded_passes: u64,

    /// Update attempts rejected because another was in flight
    pub rejected_concurrent: u64,

    /// Individual league fetch failures, timeouts included
    pub source_failures: u64,

    /// Committed passes with no snapshots
    pub empty_passes: u64,

    /// Player count of the last committed pass
    pub last_player_count: u64,

    /// Duration of the last completed pass in milliseconds
    pub last_pass_duration_ms: u64,

    /// Maximum pass duration in milliseconds
    pub max_pass_duration_ms: u64,

    /// Scheduler uptime in seconds
    pub uptime_seconds: u64,
}

impl SchedulerMetrics {
    pub fn total_commits(&self) -> u64 {
        self.visible_commits + self.silent_commits
    }
}

/// Metrics collector for the UpdateScheduler
pub struct MetricsCollector {
    passes_started: AtomicU64,
    visible_commits: AtomicU64,
    silent_commits: AtomicU64,
    partial_aborts: AtomicU64,
    cancelled_passes: AtomicU64,
    superseded_passes: AtomicU64,
    rejected_concurrent: AtomicU64,
    source_failures: AtomicU64,
    empty_passes: AtomicU64,
    last_player_count: AtomicU64,

    // Timing
    last_pass_duration_ms: AtomicU64,
    max_pass_duration_ms: AtomicU64,
    start_time: Instant,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            passes_started: AtomicU64::new(0),
            visible_commits: AtomicU64::new(0),
            silent_commits: AtomicU64::new(0),
            partial_aborts: AtomicU64::new(0),
            cancelled_passes: AtomicU64::new(0),
            superseded_passes: AtomicU64::new(0),
            rejected_concurrent: AtomicU64::new(0),
            source_failures: AtomicU64::new(0),
            empty_passes: AtomicU64::new(0),
            last_player_count: AtomicU64::new(0),
            last_pass_duration_ms: AtomicU64::new(0),
            max_pass_duration_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_pass_started(&self) {
        self.passes_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a committed pass
    pub fn record_commit(&self, visible: bool, player_count: usize, duration: Duration) {
        if visible {
            self.visible_commits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.silent_commits.fetch_add(1, Ordering::Relaxed);
        }
        if player_count == 0 {
            self.empty_passes.fetch_add(1, Ordering::Relaxed);
        }
        self.last_player_count.store(player_count as u64, Ordering::Relaxed);
        self.record_duration(duration);
    }

    pub fn record_partial_abort(&self) {
        self.partial_aborts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancelled(&self) {
        self.cancelled_passes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_superseded(&self) {
        self.superseded_passes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected_concurrent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_source_failures(&self, count: usize) {
        self.source_failures.fetch_add(count as u64, Ordering::Relaxed);
    }

    fn record_duration(&self, duration: Duration) {
        let duration_ms = duration.as_millis() as u64;
        self.last_pass_duration_ms.store(duration_ms, Ordering::Relaxed);
        self.max_pass_duration_ms.fetch_max(duration_ms, Ordering::Relaxed);
    }

    /// Get current metrics
    pub fn get_metrics(&self) -> SchedulerMetrics {
        SchedulerMetrics {
            passes_started: self.passes_started.load(Ordering::Relaxed),
            visible_commits: self.visible_commits.load(Ordering::Relaxed),
            silent_commits: self.silent_commits.load(Ordering::Relaxed),
            partial_aborts: self.partial_aborts.load(Ordering::Relaxed),
            cancelled_passes: self.cancelled_passes.load(Ordering::Relaxed),
            superseded_passes: self.superseded_passes.load(Ordering::Relaxed),
            rejected_concurrent: self.rejected_concurrent.load(Ordering::Relaxed),
            source_failures: self.source_failures.load(Ordering::Relaxed),
            empty_passes: self.empty_passes.load(Ordering::Relaxed),
            last_player_count: self.last_player_count.load(Ordering::Relaxed),
            last_pass_duration_ms: self.last_pass_duration_ms.load(Ordering::Relaxed),
            max_pass_duration_ms: self.max_pass_duration_ms.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        for counter in [
            &self.passes_started,
            &self.visible_commits,
            &self.silent_commits,
            &self.partial_aborts,
            &self.cancelled_passes,
            &self.superseded_passes,
            &self.rejected_concurrent,
            &self.source_failures,
            &self.empty_passes,
            &self.last_player_count,
            &self.last_pass_duration_ms,
            &self.max_pass_duration_ms,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
