use crate::hashing::IdentityHasher;
use crate::types::{DirectoryError, DirectoryFile, DirectoryRecord};
use roster_engine::{DirectoryPlayer, PlayerDirectoryLookup, Position, SourcePlatform};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Player Registry - the full player universe, not only rostered players
///
/// Loaded once from a JSON directory file and then read concurrently by the
/// extractor (identity enrichment) and the filter pipeline (directory search).
pub struct PlayerRegistry {
    /// Map from canonical id to record
    players_by_id: HashMap<String, DirectoryRecord>,

    /// Map from (platform, platform player id) to canonical id
    platform_index: HashMap<(String, String), String>,

    /// Map from name/team/position identity key to canonical id
    identity_index: HashMap<u64, String>,

    /// Map from normalized name key to every canonical id sharing it
    name_index: HashMap<u64, Vec<String>>,
}

impl PlayerRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            players_by_id: HashMap::new(),
            platform_index: HashMap::new(),
            identity_index: HashMap::new(),
            name_index: HashMap::new(),
        }
    }

    /// Load a directory JSON file, replacing any previous contents
    pub async fn load_from_file<P: AsRef<Path>>(&mut self, file_path: P) -> Result<usize, DirectoryError> {
        info!("Loading player directory from: {:?}", file_path.as_ref());

        let json_content = tokio::fs::read_to_string(&file_path).await?;
        let directory: DirectoryFile = serde_json::from_str(&json_content)?;

        info!("Loaded {} players from file", directory.players.len());
        self.index_records(directory.players);
        Ok(self.len())
    }

    /// Build a registry from records already in memory
    pub fn from_records(records: Vec<DirectoryRecord>) -> Self {
        let mut registry = Self::new();
        registry.index_records(records);
        registry
    }

    fn index_records(&mut self, records: Vec<DirectoryRecord>) {
        self.players_by_id.clear();
        self.platform_index.clear();
        self.identity_index.clear();
        self.name_index.clear();

        for record in records {
            if record.player_id.trim().is_empty() || record.name.trim().is_empty() {
                warn!("Skipping directory record without id or name: {:?}", record.name);
                continue;
            }
            if self.players_by_id.contains_key(&record.player_id) {
                warn!("Duplicate directory id {}, keeping first record", record.player_id);
                continue;
            }

            let position = Position::parse(&record.position);
            if let Some(team) = record.team.as_deref() {
                let key = IdentityHasher::identity_key(&record.name, team, &position);
                if let Some(existing) = self.identity_index.insert(key, record.player_id.clone()) {
                    debug!("Identity collision between {} and {}", existing, record.player_id);
                }
            }

            self.name_index
                .entry(IdentityHasher::name_key(&record.name))
                .or_default()
                .push(record.player_id.clone());

            for (platform, platform_id) in &record.platform_ids {
                self.platform_index
                    .insert((platform.to_lowercase(), platform_id.clone()), record.player_id.clone());
            }

            self.players_by_id.insert(record.player_id.clone(), record);
        }

        info!("Indexed {} directory players", self.players_by_id.len());
    }

    /// Get a record by canonical id
    pub fn get_by_id(&self, player_id: &str) -> Result<&DirectoryRecord, DirectoryError> {
        self.players_by_id.get(player_id).ok_or_else(|| DirectoryError::PlayerNotFound(player_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.players_by_id.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.players_by_id.is_empty()
    }

    /// Search for players whose name contains every query token
    ///
    /// Results are ranked by season projection so the fantasy-relevant
    /// player comes first when names collide.
    pub fn search_players(&self, query: &str) -> Vec<&DirectoryRecord> {
        let tokens: Vec<String> =
            IdentityHasher::normalize_name(query).split_whitespace().map(str::to_string).collect();
        if tokens.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<&DirectoryRecord> = self
            .players_by_id
            .values()
            .filter(|record| {
                let name = IdentityHasher::normalize_name(&record.name);
                tokens.iter().all(|token| name.contains(token.as_str()))
            })
            .collect();

        matches.sort_by(|a, b| {
            b.projected_points
                .total_cmp(&a.projected_points)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.player_id.cmp(&b.player_id))
        });
        matches
    }

    fn best_of<'a>(&'a self, ids: impl Iterator<Item = &'a String>) -> Option<&'a DirectoryRecord> {
        ids.filter_map(|id| self.players_by_id.get(id))
            .max_by(|a, b| a.projected_points.total_cmp(&b.projected_points).then_with(|| b.player_id.cmp(&a.player_id)))
    }
}

impl Default for PlayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn team_matches(record: &DirectoryRecord, team: Option<&str>) -> bool {
    match team {
        Some(team) => record.team.as_deref().is_some_and(|own| own.eq_ignore_ascii_case(team.trim())),
        None => true,
    }
}

fn position_matches(record: &DirectoryRecord, position: Option<&Position>) -> bool {
    match position {
        Some(position) if position.is_concrete() => Position::parse(&record.position) == *position,
        _ => true,
    }
}

impl PlayerDirectoryLookup for PlayerRegistry {
    fn resolve(&self, source: &SourcePlatform, player_id: &str) -> Option<DirectoryPlayer> {
        let key = (source.as_str().to_lowercase(), player_id.to_string());
        self.platform_index
            .get(&key)
            .and_then(|id| self.players_by_id.get(id))
            .or_else(|| self.players_by_id.get(player_id))
            .map(DirectoryRecord::to_directory_player)
    }

    fn find_fuzzy(&self, name: &str, team: Option<&str>, position: Option<&Position>) -> Option<DirectoryPlayer> {
        if let (Some(team), Some(position)) = (team, position) {
            let key = IdentityHasher::identity_key(name, team, position);
            if let Some(record) = self.identity_index.get(&key).and_then(|id| self.players_by_id.get(id)) {
                return Some(record.to_directory_player());
            }
        }

        let by_name = self.name_index.get(&IdentityHasher::name_key(name)).and_then(|ids| {
            let filtered = ids.iter().filter(|id| {
                self.players_by_id
                    .get(*id)
                    .is_some_and(|record| team_matches(record, team) && position_matches(record, position))
            });
            self.best_of(filtered)
        });
        if let Some(record) = by_name {
            return Some(record.to_directory_player());
        }

        // Last name plus team, for platforms that abbreviate first names
        let normalized = IdentityHasher::normalize_name(name);
        let last = normalized.split_whitespace().last()?;
        if team.is_none() {
            return None;
        }
        let candidates: Vec<&DirectoryRecord> = self
            .players_by_id
            .values()
            .filter(|record| {
                IdentityHasher::normalize_name(&record.name).split_whitespace().last() == Some(last)
                    && team_matches(record, team)
                    && position_matches(record, position)
            })
            .collect();

        match candidates.as_slice() {
            [only] => Some(only.to_directory_player()),
            _ => {
                debug!("No unambiguous directory match for {name}");
                None
            }
        }
    }

    fn search(&self, query: &str, limit: usize) -> Vec<DirectoryPlayer> {
        self.search_players(query).into_iter().take(limit).map(DirectoryRecord::to_directory_player).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str, position: &str, team: &str, projected: f64) -> DirectoryRecord {
        DirectoryRecord {
            player_id: id.to_string(),
            name: name.to_string(),
            position: position.to_string(),
            team: Some(team.to_string()),
            jersey_number: None,
            injury_status: None,
            projected_points: projected,
            platform_ids: HashMap::new(),
        }
    }

    fn create_test_registry() -> PlayerRegistry {
        let mut lamar = record("2560757", "Lamar Jackson", "QB", "BAL", 351.96);
        lamar.platform_ids.insert("sleeper".to_string(), "4881".to_string());
        lamar.platform_ids.insert("espn".to_string(), "3916387".to_string());

        PlayerRegistry::from_records(vec![
            lamar,
            record("2560955", "Josh Allen", "QB", "BUF", 341.48),
            record("3000001", "Josh Allen", "LB", "JAX", 0.0),
            record("4000002", "D.J. Moore", "WR", "CHI", 210.0),
            record("4000003", "Kenneth Walker III", "RB", "SEA", 190.0),
            record("4000004", "Ravens", "DEF", "BAL", 120.0),
        ])
    }

    #[test]
    fn test_registry_creation() {
        let registry = create_test_registry();
        assert_eq!(registry.len(), 6);
        assert!(!registry.is_empty());
        assert!(matches!(registry.get_by_id("nope"), Err(DirectoryError::PlayerNotFound(_))));
    }

    #[test]
    fn test_resolve_by_platform_id() {
        let registry = create_test_registry();

        let lamar = registry.resolve(&SourcePlatform::Sleeper, "4881").unwrap();
        assert_eq!(lamar.full_name, "Lamar Jackson");
        assert_eq!(lamar.position, Position::QB);

        let by_espn = registry.resolve(&SourcePlatform::Espn, "3916387").unwrap();
        assert_eq!(by_espn.player_id, "2560757");

        // Canonical id works for any platform
        assert!(registry.resolve(&SourcePlatform::Yahoo, "2560955").is_some());
        assert!(registry.resolve(&SourcePlatform::Yahoo, "4881").is_none());
    }

    #[test]
    fn test_fuzzy_handles_punctuation_and_suffix() {
        let registry = create_test_registry();

        let moore = registry.find_fuzzy("DJ Moore", Some("CHI"), Some(&Position::WR)).unwrap();
        assert_eq!(moore.player_id, "4000002");

        let walker = registry.find_fuzzy("Kenneth Walker", None, None).unwrap();
        assert_eq!(walker.player_id, "4000003");
    }

    #[test]
    fn test_fuzzy_disambiguates_by_team_and_projection() {
        let registry = create_test_registry();

        let jaguar = registry.find_fuzzy("Josh Allen", Some("JAX"), None).unwrap();
        assert_eq!(jaguar.player_id, "3000001");

        let fantasy_relevant = registry.find_fuzzy("Josh Allen", None, None).unwrap();
        assert_eq!(fantasy_relevant.player_id, "2560955");
    }

    #[test]
    fn test_fuzzy_last_name_and_team() {
        let registry = create_test_registry();

        let lamar = registry.find_fuzzy("L. Jackson", Some("BAL"), Some(&Position::QB)).unwrap();
        assert_eq!(lamar.player_id, "2560757");

        assert!(registry.find_fuzzy("L. Jackson", None, None).is_none());
        assert!(registry.find_fuzzy("Nobody Here", Some("BAL"), None).is_none());
    }

    #[test]
    fn test_search_players() {
        let registry = create_test_registry();

        let results = registry.search_players("josh");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].player_id, "2560955");

        let limited = registry.search("josh", 1);
        assert_eq!(limited.len(), 1);

        assert!(registry.search("   ", 10).is_empty());
        assert_eq!(registry.search("ravens", 5)[0].position, Position::Def);
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("directory.json");
        std::fs::write(
            &path,
            r#"{
                "season": 2025,
                "players": [
                    {"player_id": "1", "name": "Puka Nacua", "position": "WR", "team": "LAR",
                     "projected_points": 250.0, "platform_ids": {"sleeper": "9493"}},
                    {"player_id": "2", "name": "", "position": "WR"}
                ]
            }"#,
        )
        .unwrap();

        let mut registry = PlayerRegistry::new();
        let count = registry.load_from_file(&path).await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(registry.resolve(&SourcePlatform::Sleeper, "9493").unwrap().full_name, "Puka Nacua");
    }

    #[tokio::test]
    async fn test_load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let mut registry = PlayerRegistry::new();
        assert!(matches!(registry.load_from_file(&path).await, Err(DirectoryError::Parse(_))));
        assert!(matches!(
            registry.load_from_file(dir.path().join("missing.json")).await,
            Err(DirectoryError::Io(_))
        ));
    }
}
