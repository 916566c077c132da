//! Roster positions
//!
//! Platforms disagree on how they spell lineup positions ("DST", "D/ST",
//! "DEFENSE", ...). Everything entering the engine is parsed into a closed
//! [`Position`] once, so filters and sort keys never compare raw strings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A normalized fantasy roster position
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Position {
    QB,
    RB,
    WR,
    TE,
    /// Any flex slot (FLEX, SUPER_FLEX, W/R/T)
    Flex,
    /// Team defense / special teams
    Def,
    K,
    /// A position the engine has no special handling for (e.g. "LB", "IDP")
    Other(String),
    /// Platform sent no position at all
    Unknown,
}

impl Position {
    /// Parse a raw platform position string
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Position::Unknown;
        }

        match trimmed.to_ascii_uppercase().as_str() {
            "QB" => Position::QB,
            "RB" => Position::RB,
            "WR" => Position::WR,
            "TE" => Position::TE,
            "K" | "PK" => Position::K,
            "DEF" | "DST" | "D/ST" | "D-ST" | "DEFENSE" => Position::Def,
            "FLEX" | "SUPER_FLEX" | "SFLEX" | "W/R/T" | "WRT" | "REC_FLEX" => Position::Flex,
            other => Position::Other(other.to_string()),
        }
    }

    /// Sort priority used for team and position ordering
    ///
    /// QB > RB > WR > TE > FLEX > DEF > K > everything else.
    pub fn sort_priority(&self) -> u8 {
        match self {
            Position::QB => 0,
            Position::RB => 1,
            Position::WR => 2,
            Position::TE => 3,
            Position::Flex => 4,
            Position::Def => 5,
            Position::K => 6,
            Position::Other(_) | Position::Unknown => 7,
        }
    }

    /// Whether this position identifies a real player slot
    ///
    /// Flex and missing positions are what platforms report for emptied
    /// rosters, so they do not count as evidence of a live team.
    pub fn is_concrete(&self) -> bool {
        !matches!(self, Position::Flex | Position::Unknown)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Position::QB => "QB",
            Position::RB => "RB",
            Position::WR => "WR",
            Position::TE => "TE",
            Position::Flex => "FLEX",
            Position::Def => "DEF",
            Position::K => "K",
            Position::Other(other) => other,
            Position::Unknown => "",
        }
    }
}

impl From<String> for Position {
    fn from(raw: String) -> Self {
        Position::parse(&raw)
    }
}

impl From<&str> for Position {
    fn from(raw: &str) -> Self {
        Position::parse(raw)
    }
}

impl From<Position> for String {
    fn from(position: Position) -> Self {
        position.as_str().to_string()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
