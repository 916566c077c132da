//! Domain types shared by every stage of the roster pipeline

use crate::position::Position;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// League label attached to synthesized full-directory search entries
pub const SEARCH_LEAGUE_LABEL: &str = "Player Search";

/// Matchup id used by search entries when no real matchup exists to borrow
pub const SEARCH_MATCHUP_ID: &str = "search";

/// Fantasy platform a league is hosted on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SourcePlatform {
    Sleeper,
    Espn,
    Yahoo,
    Other(String),
}

impl SourcePlatform {
    pub fn as_str(&self) -> &str {
        match self {
            SourcePlatform::Sleeper => "sleeper",
            SourcePlatform::Espn => "espn",
            SourcePlatform::Yahoo => "yahoo",
            SourcePlatform::Other(name) => name,
        }
    }
}

impl From<String> for SourcePlatform {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sleeper" => SourcePlatform::Sleeper,
            "espn" => SourcePlatform::Espn,
            "yahoo" => SourcePlatform::Yahoo,
            _ => SourcePlatform::Other(raw),
        }
    }
}

impl From<SourcePlatform> for String {
    fn from(source: SourcePlatform) -> Self {
        source.as_str().to_string()
    }
}

impl fmt::Display for SourcePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// League identity as reported by a source adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueRef {
    pub league_id: String,
    pub name: String,
    pub source: SourcePlatform,
}

/// One player on a platform roster, exactly as the adapter decoded it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterPlayer {
    /// Platform player id
    pub player_id: String,

    #[serde(default)]
    pub full_name: String,

    /// Raw platform position, normalized during extraction
    #[serde(default)]
    pub position: String,

    /// NFL team code (e.g. "BAL")
    #[serde(default)]
    pub nfl_team: Option<String>,

    /// Lineup slot label (e.g. "QB", "FLEX", "BN")
    #[serde(default)]
    pub slot: String,

    pub is_starter: bool,

    #[serde(default)]
    pub score: f64,

    #[serde(default)]
    pub projected_score: f64,
}

/// A fantasy team's roster for one scoring period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRoster {
    pub team_id: String,
    pub team_name: String,
    #[serde(default)]
    pub players: Vec<RosterPlayer>,
}

impl TeamRoster {
    /// Players in active lineup slots
    pub fn starters(&self) -> impl Iterator<Item = &RosterPlayer> {
        self.players.iter().filter(|player| player.is_starter)
    }
}

/// Head-to-head matchup as seen from the user's side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadToHeadPair {
    pub user: TeamRoster,
    pub opponent: TeamRoster,
}

/// One team in a survival league's shared weekly pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingTeam {
    pub team_id: String,
    pub team_name: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub projected_score: f64,
    /// Roster players usable this period; zero means the team was chopped
    #[serde(default)]
    pub valid_player_count: u32,
    #[serde(default)]
    pub is_eliminated: bool,
}

/// The user's entry in a ranked (survival) league
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub team: TeamRoster,
    pub rank: u32,
    #[serde(default)]
    pub is_eliminated: bool,
    /// Every team in the league pool, used by the survival ranker
    #[serde(default)]
    pub standings: Vec<StandingTeam>,
    #[serde(default)]
    pub weeks_remaining: u32,
    #[serde(default = "default_start_period")]
    pub start_period: u32,
}

fn default_start_period() -> u32 {
    1
}

/// One league's roster view for one scoring period
///
/// Exactly one of `head_to_head` / `ranked_entry` is normally populated.
/// Neither being present means the adapter only fetched part of the league.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupContext {
    pub league: LeagueRef,
    pub season: u16,
    pub period: u32,
    pub matchup_id: String,
    #[serde(default)]
    pub head_to_head: Option<HeadToHeadPair>,
    #[serde(default)]
    pub ranked_entry: Option<RankedEntry>,
    #[serde(default)]
    pub playoff_eliminated: bool,
}

impl MatchupContext {
    pub fn is_survival(&self) -> bool {
        self.head_to_head.is_none() && self.ranked_entry.is_some()
    }

    pub fn is_partial(&self) -> bool {
        self.head_to_head.is_none() && self.ranked_entry.is_none()
    }
}

/// Quartile classification of a score within its distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PerformanceTier {
    Elite,
    Good,
    Average,
    Struggling,
}

impl PerformanceTier {
    /// Lower is better
    pub fn rank(self) -> u8 {
        match self {
            PerformanceTier::Elite => 0,
            PerformanceTier::Good => 1,
            PerformanceTier::Average => 2,
            PerformanceTier::Struggling => 3,
        }
    }
}

/// Where a snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotOrigin {
    /// Extracted from a real league roster
    Rostered,
    /// Synthesized from a full-directory search hit
    DirectorySearch,
}

/// Reconciliation key: the same player scores independently in each matchup
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotKey {
    pub player_id: String,
    pub matchup_id: String,
}

impl SnapshotKey {
    pub fn new(player_id: impl Into<String>, matchup_id: impl Into<String>) -> Self {
        Self { player_id: player_id.into(), matchup_id: matchup_id.into() }
    }
}

/// One rostered player in one league for one poll cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub player_id: String,
    pub matchup_id: String,
    /// Lineup slot the player occupies
    pub slot: String,

    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub position: Position,
    pub nfl_team: Option<String>,
    pub score: f64,
    pub projected_score: f64,

    pub league_id: String,
    pub league_name: String,
    pub source: SourcePlatform,
    pub is_starter: bool,

    /// Derived from the distribution of the pass that produced this snapshot
    pub percentage_of_top: f64,
    pub tier: PerformanceTier,

    pub previous_score: f64,
    pub accumulated_delta: f64,
    pub last_activity_time: Option<DateTime<Utc>>,

    pub origin: SnapshotOrigin,
}

impl PlayerSnapshot {
    pub fn key(&self) -> SnapshotKey {
        SnapshotKey::new(self.player_id.clone(), self.matchup_id.clone())
    }

    /// Fresh change since the previous cycle
    pub fn fresh_delta(&self) -> f64 {
        self.score - self.previous_score
    }

    pub fn is_search_result(&self) -> bool {
        self.origin == SnapshotOrigin::DirectorySearch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_platform_parsing() {
        assert_eq!(SourcePlatform::from("Sleeper".to_string()), SourcePlatform::Sleeper);
        assert_eq!(SourcePlatform::from("ESPN".to_string()), SourcePlatform::Espn);
        assert_eq!(
            SourcePlatform::from("fleaflicker".to_string()),
            SourcePlatform::Other("fleaflicker".to_string())
        );
    }

    #[test]
    fn test_tier_ordering_matches_rank() {
        assert!(PerformanceTier::Elite < PerformanceTier::Good);
        assert!(PerformanceTier::Average < PerformanceTier::Struggling);
        assert_eq!(PerformanceTier::Struggling.rank(), 3);
    }

    #[test]
    fn test_matchup_context_shape_from_json() {
        let json = r#"{
            "league": {"league_id": "L1", "name": "Chop Shop", "source": "sleeper"},
            "season": 2025,
            "period": 4,
            "matchup_id": "L1-4-7"
        }"#;
        let context: MatchupContext = serde_json::from_str(json).unwrap();
        assert!(context.is_partial());
        assert!(!context.is_survival());
        assert!(!context.playoff_eliminated);
    }
}
