//! Source of per-league matchup data

use async_trait::async_trait;
use roster_engine::{LeagueRef, MatchupContext, SourceFetchError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Season and scoring period (NFL week) being aggregated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScoringPeriod {
    pub season: u16,
    pub period: u32,
}

impl ScoringPeriod {
    pub fn new(season: u16, period: u32) -> Self {
        Self { season, period }
    }
}

impl fmt::Display for ScoringPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} week {}", self.season, self.period)
    }
}

/// Fetches matchup contexts from the fantasy platforms
///
/// Implementations wrap platform clients; the scheduler owns concurrency,
/// timeouts and retries.
#[async_trait]
pub trait MatchupSourceProvider: Send + Sync {
    /// Leagues the user has connected; their count is the expected context count
    async fn connected_leagues(&self) -> Result<Vec<LeagueRef>, SourceFetchError>;

    /// Fetch one league's context for a scoring period
    async fn fetch_matchup(&self, league: &LeagueRef, period: ScoringPeriod)
        -> Result<MatchupContext, SourceFetchError>;
}
