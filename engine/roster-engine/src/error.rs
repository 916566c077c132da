//! Error types for the roster engine

use thiserror::Error;

/// Errors raised by the roster engine itself
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    InvalidConfig(String),
}

/// A single league's fetch failed; that league is left out of the pass
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceFetchError {
    #[error("League {league_id} request failed: {message}")]
    Request { league_id: String, message: String },

    #[error("League {league_id} returned an undecodable payload: {message}")]
    Decode { league_id: String, message: String },

    #[error("League {league_id} timed out")]
    Timeout { league_id: String },
}

impl SourceFetchError {
    pub fn league_id(&self) -> &str {
        match self {
            SourceFetchError::Request { league_id, .. }
            | SourceFetchError::Decode { league_id, .. }
            | SourceFetchError::Timeout { league_id } => league_id,
        }
    }
}
