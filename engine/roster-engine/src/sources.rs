//! Read-only collaborators the engine consults while building views

use crate::position::Position;
use crate::types::SourcePlatform;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Canonical player record from the player directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryPlayer {
    pub player_id: String,
    pub full_name: String,
    pub position: Position,
    pub nfl_team: Option<String>,
    pub jersey_number: Option<u32>,
    pub injury_status: Option<String>,
}

/// Lookup into the wider player universe, not limited to rostered players
pub trait PlayerDirectoryLookup: Send + Sync {
    /// Resolve a platform player id to its canonical record
    fn resolve(&self, source: &SourcePlatform, player_id: &str) -> Option<DirectoryPlayer>;

    /// Fuzzy match by name, optionally narrowed by team and position
    fn find_fuzzy(
        &self,
        name: &str,
        team: Option<&str>,
        position: Option<&Position>,
    ) -> Option<DirectoryPlayer>;

    /// Free-text search, capped at `limit` results
    fn search(&self, query: &str, limit: usize) -> Vec<DirectoryPlayer>;
}

/// Live/not-live status per NFL team code
pub trait GameStatusLookup: Send + Sync {
    fn is_live(&self, team_code: &str) -> bool;
}

/// Game status backed by a fixed set of live team codes
#[derive(Debug, Clone, Default)]
pub struct StaticGameStatus {
    live_teams: HashSet<String>,
}

impl StaticGameStatus {
    pub fn new<I, S>(live_teams: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self { live_teams: live_teams.into_iter().map(|t| t.as_ref().to_ascii_uppercase()).collect() }
    }

    pub fn set_live(&mut self, team_code: &str, live: bool) {
        let code = team_code.to_ascii_uppercase();
        if live {
            self.live_teams.insert(code);
        } else {
            self.live_teams.remove(&code);
        }
    }
}

impl GameStatusLookup for StaticGameStatus {
    fn is_live(&self, team_code: &str) -> bool {
        self.live_teams.contains(&team_code.to_ascii_uppercase())
    }
}
