use roster_engine::SourcePlatform;
use serde::{Deserialize, Serialize};

/// Elimination risk, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EliminationStatus {
    /// Last team standing
    Champion,
    Safe,
    Warning,
    Danger,
    /// Currently holding the elimination spot
    Critical,
}

/// How close an elimination was
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DramaLevel {
    Low,
    Moderate,
    High,
    /// Bottom two finished tied
    Extreme,
}

/// One active team's place in the survival ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStanding {
    pub team_id: String,
    pub team_name: String,

    /// 1-based, best first
    pub rank: u32,
    pub score: f64,
    pub projected_score: f64,

    /// Score once scoring has started, projection before kickoff
    pub effective_score: f64,
    pub status: EliminationStatus,

    /// Estimated probability of surviving, in [0, 1]
    pub safety_percentage: f64,

    /// Points above the elimination cutoff; negative for the team holding it
    pub safety_margin: f64,
}

/// Immutable ledger entry for a team knocked out in a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EliminationRecord {
    pub team_id: String,
    pub team_name: String,
    pub period: u32,
    pub score: f64,

    /// Points between this team and the next-lowest score
    pub margin: f64,
    pub drama: DramaLevel,
}

/// Survival ranking for one league and scoring period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurvivalRanking {
    pub league_id: String,
    pub league_name: String,
    pub source: SourcePlatform,
    pub season: u16,
    pub period: u32,

    /// False until any active team has posted points this period
    pub scoring_started: bool,

    /// Active teams, best first
    pub standings: Vec<TeamStanding>,

    /// Ids of teams already out of the league
    pub eliminated_team_ids: Vec<String>,

    /// The user's team in this league
    pub user_team_id: String,
    pub weeks_alive: u32,
    pub weeks_remaining: u32,

    /// Ledger of every elimination seen so far, oldest first
    pub history: Vec<EliminationRecord>,
}

impl SurvivalRanking {
    pub fn user_standing(&self) -> Option<&TeamStanding> {
        self.standings.iter().find(|standing| standing.team_id == self.user_team_id)
    }

    pub fn is_user_eliminated(&self) -> bool {
        self.eliminated_team_ids.iter().any(|id| *id == self.user_team_id)
    }
}
