use crate::calculator::SurvivalCalculator;
use crate::config::RankerConfig;
use crate::error::RankerError;
use crate::models::{EliminationRecord, SurvivalRanking, TeamStanding};
use dashmap::DashMap;
use roster_engine::{MatchupContext, StandingTeam};
use tracing::{debug, info, warn};

/// What the ranker remembers about one league between passes
#[derive(Debug, Clone, Default)]
struct LeagueHistory {
    last_period: u32,
    last_standings: Vec<TeamStanding>,
    ledger: Vec<EliminationRecord>,
}

impl LeagueHistory {
    fn has_record(&self, team_id: &str, period: u32) -> bool {
        self.ledger.iter().any(|record| record.team_id == team_id && record.period == period)
    }
}

/// Survival ranker with per-league elimination history
///
/// Safe to share across tasks; each league's history is updated under its
/// own map entry.
pub struct SurvivalRanker {
    calculator: SurvivalCalculator,
    histories: DashMap<String, LeagueHistory>,
}

impl SurvivalRanker {
    pub fn new(config: RankerConfig) -> Result<Self, RankerError> {
        config.validate()?;
        Ok(Self { calculator: SurvivalCalculator::new(config), histories: DashMap::new() })
    }

    /// Rank one survival league for the context's period
    pub fn rank_league(&self, context: &MatchupContext) -> Result<SurvivalRanking, RankerError> {
        let league_id = context.league.league_id.clone();
        let entry = context.ranked_entry.as_ref().ok_or_else(|| RankerError::NotSurvival(league_id.clone()))?;

        if let Some(history) = self.histories.get(&league_id) {
            if context.period < history.last_period {
                return Err(RankerError::StalePeriod {
                    league_id,
                    period: context.period,
                    latest: history.last_period,
                });
            }
        }

        let (active, eliminated): (Vec<&StandingTeam>, Vec<&StandingTeam>) =
            entry.standings.iter().partition(|team| !team.is_eliminated && team.valid_player_count > 0);

        if active.is_empty() {
            return Err(RankerError::EmptyLeague { league_id, period: context.period });
        }

        let standings = self.calculator.rank(&active, entry.weeks_remaining);
        let scoring_started = SurvivalCalculator::scoring_started(&active);

        let mut history = self.histories.entry(league_id.clone()).or_default();
        self.record_eliminations(&league_id, &mut history, &eliminated);
        history.last_period = context.period;
        history.last_standings = standings.clone();
        let ledger = history.ledger.clone();
        drop(history);

        let weeks_alive =
            if context.period >= entry.start_period { context.period - entry.start_period + 1 } else { 0 };

        debug!(
            league_id = %league_id,
            period = context.period,
            active = standings.len(),
            eliminated = eliminated.len(),
            "Ranked survival league"
        );

        Ok(SurvivalRanking {
            league_id,
            league_name: context.league.name.clone(),
            source: context.league.source.clone(),
            season: context.season,
            period: context.period,
            scoring_started,
            standings,
            eliminated_team_ids: eliminated.iter().map(|team| team.team_id.clone()).collect(),
            user_team_id: entry.team.team_id.clone(),
            weeks_alive,
            weeks_remaining: entry.weeks_remaining,
            history: ledger,
        })
    }

    /// Rank every survival league in a pass, skipping leagues that fail
    pub fn rank_all(&self, contexts: &[MatchupContext]) -> Vec<SurvivalRanking> {
        contexts
            .iter()
            .filter(|context| context.is_survival())
            .filter_map(|context| match self.rank_league(context) {
                Ok(ranking) => Some(ranking),
                Err(e) => {
                    warn!(league_id = %context.league.league_id, "Skipping survival ranking: {e}");
                    None
                }
            })
            .collect()
    }

    /// Elimination ledger for a league, oldest first
    pub fn history(&self, league_id: &str) -> Vec<EliminationRecord> {
        self.histories.get(league_id).map(|history| history.ledger.clone()).unwrap_or_default()
    }

    /// Teams that were active in the last ranking and are now out get one
    /// ledger entry each, scored from that last ranking
    fn record_eliminations(&self, league_id: &str, history: &mut LeagueHistory, eliminated: &[&StandingTeam]) {
        let period = history.last_period;

        for team in eliminated {
            let Some(previous) = history.last_standings.iter().find(|s| s.team_id == team.team_id) else {
                continue;
            };
            if history.has_record(&team.team_id, period) {
                continue;
            }

            let next_lowest = history
                .last_standings
                .iter()
                .filter(|s| s.team_id != team.team_id)
                .map(|s| s.effective_score)
                .min_by(|a, b| a.total_cmp(b));
            let margin = next_lowest.map(|other| other - previous.effective_score).unwrap_or(0.0);

            let record = EliminationRecord {
                team_id: team.team_id.clone(),
                team_name: team.team_name.clone(),
                period,
                score: previous.effective_score,
                margin,
                drama: self.calculator.drama(margin),
            };

            info!(
                league_id,
                team_id = %record.team_id,
                period,
                margin = record.margin,
                drama = ?record.drama,
                "Recorded elimination"
            );
            history.ledger.push(record);
        }
    }
}

impl Default for SurvivalRanker {
    fn default() -> Self {
        Self { calculator: SurvivalCalculator::new(RankerConfig::default()), histories: DashMap::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DramaLevel, EliminationStatus};
    use roster_engine::{LeagueRef, RankedEntry, SourcePlatform, TeamRoster};

    fn standing(id: &str, score: f64, eliminated: bool) -> StandingTeam {
        StandingTeam {
            team_id: id.to_string(),
            team_name: format!("Team {id}"),
            score,
            projected_score: 100.0,
            valid_player_count: if eliminated { 0 } else { 9 },
            is_eliminated: eliminated,
        }
    }

    fn context(period: u32, standings: Vec<StandingTeam>) -> MatchupContext {
        MatchupContext {
            league: LeagueRef {
                league_id: "G1".to_string(),
                name: "Guillotine".to_string(),
                source: SourcePlatform::Sleeper,
            },
            season: 2025,
            period,
            matchup_id: format!("G1-{period}"),
            head_to_head: None,
            ranked_entry: Some(RankedEntry {
                team: TeamRoster { team_id: "a".to_string(), team_name: "Team a".to_string(), players: vec![] },
                rank: 1,
                is_eliminated: false,
                standings,
                weeks_remaining: 14 - period,
                start_period: 1,
            }),
            playoff_eliminated: false,
        }
    }

    #[test]
    fn test_ranks_active_teams_only() {
        let ranker = SurvivalRanker::default();
        let ranking = ranker
            .rank_league(&context(3, vec![standing("a", 90.0, false), standing("b", 80.0, false), standing("z", 0.0, true)]))
            .unwrap();

        assert_eq!(ranking.standings.len(), 2);
        assert_eq!(ranking.eliminated_team_ids, vec!["z".to_string()]);
        assert_eq!(ranking.weeks_alive, 3);
        assert_eq!(ranking.user_standing().unwrap().rank, 1);
        assert!(!ranking.is_user_eliminated());
    }

    #[test]
    fn test_zero_valid_players_counts_as_eliminated() {
        let ranker = SurvivalRanker::default();
        let mut chopped = standing("c", 0.0, false);
        chopped.valid_player_count = 0;

        let ranking =
            ranker.rank_league(&context(2, vec![standing("a", 90.0, false), standing("b", 80.0, false), chopped])).unwrap();
        assert_eq!(ranking.eliminated_team_ids, vec!["c".to_string()]);
    }

    #[test]
    fn test_elimination_ledger_is_append_only_and_deduplicated() {
        let ranker = SurvivalRanker::default();
        ranker
            .rank_league(&context(
                4,
                vec![standing("a", 110.0, false), standing("b", 95.0, false), standing("c", 94.0, false)],
            ))
            .unwrap();

        let next = context(5, vec![standing("a", 0.0, false), standing("b", 0.0, false), standing("c", 0.0, true)]);
        let ranking = ranker.rank_league(&next).unwrap();
        assert_eq!(ranking.history.len(), 1);
        let record = &ranking.history[0];
        assert_eq!(record.team_id, "c");
        assert_eq!(record.period, 4);
        assert_eq!(record.score, 94.0);
        assert!((record.margin - 1.0).abs() < 1e-9);
        assert_eq!(record.drama, DramaLevel::High);

        // Polling the same period again does not duplicate the entry
        ranker.rank_league(&next).unwrap();
        assert_eq!(ranker.history("G1").len(), 1);
    }

    #[test]
    fn test_bottom_tie_is_extreme_drama() {
        let ranker = SurvivalRanker::default();
        ranker
            .rank_league(&context(
                6,
                vec![standing("a", 120.0, false), standing("b", 88.0, false), standing("c", 88.0, false)],
            ))
            .unwrap();
        let ranking = ranker
            .rank_league(&context(7, vec![standing("a", 0.0, false), standing("b", 0.0, false), standing("c", 0.0, true)]))
            .unwrap();
        assert_eq!(ranking.history[0].drama, DramaLevel::Extreme);
    }

    #[test]
    fn test_stale_period_is_rejected() {
        let ranker = SurvivalRanker::default();
        ranker.rank_league(&context(8, vec![standing("a", 1.0, false), standing("b", 2.0, false)])).unwrap();

        let stale = ranker.rank_league(&context(7, vec![standing("a", 1.0, false), standing("b", 2.0, false)]));
        assert!(matches!(stale, Err(RankerError::StalePeriod { period: 7, latest: 8, .. })));
    }

    #[test]
    fn test_empty_league_and_non_survival() {
        let ranker = SurvivalRanker::default();
        let empty = ranker.rank_league(&context(2, vec![standing("a", 0.0, true)]));
        assert!(matches!(empty, Err(RankerError::EmptyLeague { .. })));

        let mut h2h = context(2, vec![]);
        h2h.ranked_entry = None;
        assert!(matches!(ranker.rank_league(&h2h), Err(RankerError::NotSurvival(_))));
        assert!(ranker.rank_all(&[h2h]).is_empty());
    }

    #[test]
    fn test_champion_when_one_team_left() {
        let ranker = SurvivalRanker::default();
        let ranking = ranker
            .rank_league(&context(13, vec![standing("a", 100.0, false), standing("b", 0.0, true)]))
            .unwrap();
        assert_eq!(ranking.standings[0].status, EliminationStatus::Champion);
    }

    #[test]
    fn test_ranking_serializes() {
        let ranker = SurvivalRanker::default();
        let ranking = ranker.rank_league(&context(2, vec![standing("a", 10.0, false), standing("b", 5.0, false)])).unwrap();
        let json = serde_json::to_string(&ranking).unwrap();
        assert!(json.contains("\"status\":\"Critical\""));
    }
}
