//! Persisted user preferences the engine reads but never writes

use crate::error::EngineError;
use crate::filter::FilterState;
use serde::{Deserialize, Serialize};

/// Default cap on full-directory search results
pub const DEFAULT_DIRECTORY_SEARCH_LIMIT: usize = 25;

/// Preferences loaded from the settings store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Show teams already knocked out of survival leagues
    pub show_eliminated_survival: bool,

    /// Show head-to-head leagues where the user missed the playoffs
    pub show_eliminated_playoffs: bool,

    /// Filter state applied when the engine starts
    pub default_filters: FilterState,

    /// Maximum number of full-directory search results
    pub directory_search_limit: usize,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            show_eliminated_survival: false,
            show_eliminated_playoffs: false,
            default_filters: FilterState::default(),
            directory_search_limit: DEFAULT_DIRECTORY_SEARCH_LIMIT,
        }
    }
}

impl Preferences {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.directory_search_limit == 0 {
            return Err(EngineError::InvalidConfig(
                "directory_search_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
