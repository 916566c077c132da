//! Error types for the UpdateScheduler

use roster_engine::SourceFetchError;
use thiserror::Error;

/// Errors that can occur while scheduling or running an update pass
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulerError {
    #[error("Only {available} of {expected} league contexts available, keeping previous result")]
    PartialData { expected: usize, available: usize },

    #[error("Pass {generation} superseded by pass {current}")]
    Superseded { generation: u64, current: u64 },

    #[error("Pass cancelled before completion")]
    Cancelled,

    #[error("Another update is already in progress")]
    UpdateInProgress,

    #[error("No data after {attempts} attempts")]
    NoData { attempts: u32 },

    #[error("Source error: {0}")]
    Source(#[from] SourceFetchError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scheduler is already running")]
    AlreadyRunning,

    #[error("Scheduler is not running")]
    NotRunning,
}

impl SchedulerError {
    /// Soft errors leave the last good state in place and need no user action
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            SchedulerError::PartialData { .. }
                | SchedulerError::Superseded { .. }
                | SchedulerError::Cancelled
                | SchedulerError::UpdateInProgress
                | SchedulerError::Source(_)
        )
    }
}
