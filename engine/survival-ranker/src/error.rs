use thiserror::Error;

/// Errors raised while ranking a survival league
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RankerError {
    #[error("League {league_id} has no active teams for period {period}")]
    EmptyLeague { league_id: String, period: u32 },

    #[error("League {league_id} period {period} is older than the last ranked period {latest}")]
    StalePeriod { league_id: String, period: u32, latest: u32 },

    #[error("League {0} is not a survival league")]
    NotSurvival(String),

    #[error("Invalid ranker configuration: {0}")]
    InvalidConfig(String),
}
