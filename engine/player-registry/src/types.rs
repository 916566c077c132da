use roster_engine::{DirectoryPlayer, Position};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// One player as stored in the directory file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryRecord {
    /// Canonical directory id
    pub player_id: String,

    /// Player name (e.g., "Lamar Jackson")
    pub name: String,

    /// Raw position label; normalized on load
    pub position: String,

    /// Team abbreviation (e.g., "BAL"); absent for free agents
    #[serde(default)]
    pub team: Option<String>,

    #[serde(default)]
    pub jersey_number: Option<u32>,

    #[serde(default)]
    pub injury_status: Option<String>,

    /// Season projected fantasy points, used to rank search results
    #[serde(default)]
    pub projected_points: f64,

    /// Platform name (e.g., "sleeper") to that platform's player id
    #[serde(default)]
    pub platform_ids: HashMap<String, String>,
}

impl DirectoryRecord {
    pub fn to_directory_player(&self) -> DirectoryPlayer {
        DirectoryPlayer {
            player_id: self.player_id.clone(),
            full_name: self.name.clone(),
            position: Position::parse(&self.position),
            nfl_team: self.team.clone().filter(|team| !team.trim().is_empty()),
            jersey_number: self.jersey_number,
            injury_status: self.injury_status.clone(),
        }
    }
}

/// Top-level layout of a directory JSON file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryFile {
    #[serde(default)]
    pub season: Option<u16>,
    pub players: Vec<DirectoryRecord>,
}

/// Errors that can occur while loading or querying the directory
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Player '{0}' not found in directory")]
    PlayerNotFound(String),

    #[error("Failed to read directory file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse directory file: {0}")]
    Parse(#[from] serde_json::Error),
}
