//! League source backed by JSON files on disk
//!
//! Layout: `<data_dir>/period_<n>/<league_id>.json`, one serialized
//! `MatchupContext` per league and period. A missing or unreadable file is a
//! per-league fetch failure, so the scheduler's completeness gate sees it.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use roster_engine::{LeagueRef, MatchupContext, SourceFetchError};
use update_scheduler::{MatchupSourceProvider, ScoringPeriod};

use crate::config::SourceSettings;

pub struct FixtureSource {
    data_dir: PathBuf,
    leagues: Vec<LeagueRef>,
}

impl FixtureSource {
    pub fn new(data_dir: impl Into<PathBuf>, leagues: Vec<LeagueRef>) -> Self {
        Self { data_dir: data_dir.into(), leagues }
    }

    /// Build from configuration: inline leagues first, then the leagues file
    pub fn from_settings(data_dir: &Path, settings: &SourceSettings) -> Result<Self> {
        let mut leagues = settings.leagues.clone();
        if let Some(path) = &settings.leagues_file {
            leagues.extend(load_leagues(path)?);
        }

        let mut seen = std::collections::HashSet::new();
        leagues.retain(|league| seen.insert(league.league_id.clone()));

        info!(leagues = leagues.len(), data_dir = ?data_dir, "Configured fixture league source");
        Ok(Self::new(data_dir, leagues))
    }

    pub fn leagues(&self) -> &[LeagueRef] {
        &self.leagues
    }

    pub fn context_path(&self, league_id: &str, period: ScoringPeriod) -> PathBuf {
        self.data_dir.join(format!("period_{}", period.period)).join(format!("{league_id}.json"))
    }
}

/// Read a JSON array of leagues
pub fn load_leagues(path: &Path) -> Result<Vec<LeagueRef>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read leagues file {path:?}"))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse leagues file {path:?}"))
}

#[async_trait]
impl MatchupSourceProvider for FixtureSource {
    async fn connected_leagues(&self) -> Result<Vec<LeagueRef>, SourceFetchError> {
        Ok(self.leagues.clone())
    }

    async fn fetch_matchup(&self, league: &LeagueRef, period: ScoringPeriod) -> Result<MatchupContext, SourceFetchError> {
        let path = self.context_path(&league.league_id, period);
        debug!(league_id = %league.league_id, path = ?path, "Reading matchup fixture");

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| SourceFetchError::Request {
            league_id: league.league_id.clone(),
            message: format!("{}: {e}", path.display()),
        })?;

        let context: MatchupContext = serde_json::from_str(&content).map_err(|e| SourceFetchError::Decode {
            league_id: league.league_id.clone(),
            message: e.to_string(),
        })?;

        if context.league.league_id != league.league_id {
            return Err(SourceFetchError::Decode {
                league_id: league.league_id.clone(),
                message: format!("fixture belongs to league {}", context.league.league_id),
            });
        }
        if context.season != period.season || context.period != period.period {
            return Err(SourceFetchError::Decode {
                league_id: league.league_id.clone(),
                message: format!(
                    "fixture is for season {} period {}, expected season {} period {}",
                    context.season, context.period, period.season, period.period
                ),
            });
        }

        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_engine::SourcePlatform;
    use tokio_test::assert_ok;

    fn league(id: &str) -> LeagueRef {
        LeagueRef { league_id: id.to_string(), name: format!("League {id}"), source: SourcePlatform::Espn }
    }

    fn fixture(league_id: &str, period: u32) -> String {
        format!(
            r#"{{
                "league": {{ "league_id": "{league_id}", "name": "League {league_id}", "source": "espn" }},
                "season": 2025,
                "period": {period},
                "matchup_id": "{league_id}-{period}",
                "head_to_head": {{
                    "user": {{
                        "team_id": "1",
                        "team_name": "Mine",
                        "players": [
                            {{ "player_id": "3918298", "full_name": "Josh Allen", "position": "QB",
                               "nfl_team": "BUF", "slot": "QB", "is_starter": true, "score": 24.3 }}
                        ]
                    }},
                    "opponent": {{ "team_id": "2", "team_name": "Theirs" }}
                }}
            }}"#
        )
    }

    fn write_fixture(root: &Path, league_id: &str, period: u32, content: &str) {
        let dir = root.join(format!("period_{period}"));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("{league_id}.json")), content).unwrap();
    }

    #[tokio::test]
    async fn test_reads_matchup_fixture() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), "E1", 3, &fixture("E1", 3));

        let source = FixtureSource::new(dir.path(), vec![league("E1")]);
        let context = assert_ok!(source.fetch_matchup(&league("E1"), ScoringPeriod::new(2025, 3)).await);
        assert_eq!(context.matchup_id, "E1-3");
        assert_eq!(context.league.source, SourcePlatform::Espn);
        let pair = context.head_to_head.unwrap();
        assert_eq!(pair.user.players[0].score, 24.3);
        assert!(pair.opponent.players.is_empty());
    }

    #[tokio::test]
    async fn test_missing_and_malformed_fixtures_fail_per_league() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), "E2", 1, "{ not json");
        let source = FixtureSource::new(dir.path(), vec![league("E1"), league("E2")]);
        let period = ScoringPeriod::new(2025, 1);

        let missing = source.fetch_matchup(&league("E1"), period).await;
        assert!(matches!(missing, Err(SourceFetchError::Request { ref league_id, .. }) if league_id == "E1"));

        let malformed = source.fetch_matchup(&league("E2"), period).await;
        assert!(matches!(malformed, Err(SourceFetchError::Decode { ref league_id, .. }) if league_id == "E2"));
    }

    #[tokio::test]
    async fn test_fixture_for_wrong_period_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), "E1", 4, &fixture("E1", 3));
        let source = FixtureSource::new(dir.path(), vec![league("E1")]);

        let result = source.fetch_matchup(&league("E1"), ScoringPeriod::new(2025, 4)).await;
        assert!(matches!(result, Err(SourceFetchError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_fixture_from_previous_season_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), "E1", 3, &fixture("E1", 3));
        let source = FixtureSource::new(dir.path(), vec![league("E1")]);

        let result = source.fetch_matchup(&league("E1"), ScoringPeriod::new(2026, 3)).await;
        assert!(matches!(result, Err(SourceFetchError::Decode { ref message, .. }) if message.contains("season 2025")));
    }

    #[test]
    fn test_leagues_from_settings_are_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let leagues_file = dir.path().join("leagues.json");
        std::fs::write(
            &leagues_file,
            r#"[{"league_id": "E1", "name": "Dup", "source": "espn"},
                {"league_id": "Y1", "name": "Office", "source": "yahoo"}]"#,
        )
        .unwrap();

        let settings = SourceSettings {
            leagues: vec![league("E1")],
            leagues_file: Some(leagues_file),
            ..Default::default()
        };
        let source = FixtureSource::from_settings(dir.path(), &settings).unwrap();

        let ids: Vec<&str> = source.leagues().iter().map(|l| l.league_id.as_str()).collect();
        assert_eq!(ids, vec!["E1", "Y1"]);
        assert_eq!(source.leagues()[0].name, "League E1");
    }
}
