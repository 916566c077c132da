//! Integration tests: scheduler, engine, player directory and survival ranker together

use std::collections::HashMap;
use std::sync::Arc;

use player_registry::{DirectoryRecord, PlayerRegistry};
use roster_engine::{
    FilterState, LeagueRef, MatchupContext, PositionFilter, Position, Preferences, RankedEntry, RosterPlayer,
    SearchMode, SearchQuery, SnapshotOrigin, SourcePlatform, StandingTeam, StaticGameStatus, TeamRoster,
    SEARCH_LEAGUE_LABEL,
};
use survival_ranker::{EliminationStatus, SurvivalRanker};
use tokio_test::assert_ok;

use crate::tests::{h2h_context, starter, MockProvider};
use crate::{EngineEvent, SchedulerConfig, ScoringPeriod, UpdateScheduler};

fn record(id: &str, name: &str, position: &str, team: &str, projected: f64) -> DirectoryRecord {
    DirectoryRecord {
        player_id: id.to_string(),
        name: name.to_string(),
        position: position.to_string(),
        team: Some(team.to_string()),
        jersey_number: None,
        injury_status: None,
        projected_points: projected,
        platform_ids: HashMap::from([("sleeper".to_string(), id.to_string())]),
    }
}

fn directory() -> Arc<PlayerRegistry> {
    Arc::new(PlayerRegistry::from_records(vec![
        record("4984", "Josh Allen", "QB", "BUF", 380.0),
        record("1479", "Keenan Allen", "WR", "CHI", 190.0),
        record("6794", "Justin Jefferson", "WR", "MIN", 290.0),
    ]))
}

fn standing(id: &str, score: f64, eliminated: bool) -> StandingTeam {
    StandingTeam {
        team_id: id.to_string(),
        team_name: format!("Team {id}"),
        score,
        projected_score: 110.0,
        valid_player_count: if eliminated { 0 } else { 9 },
        is_eliminated: eliminated,
    }
}

fn survival_context(league_id: &str, players: Vec<RosterPlayer>, standings: Vec<StandingTeam>) -> MatchupContext {
    MatchupContext {
        league: LeagueRef {
            league_id: league_id.to_string(),
            name: "Guillotine".to_string(),
            source: SourcePlatform::Sleeper,
        },
        season: 2025,
        period: 1,
        matchup_id: format!("{league_id}-pool"),
        head_to_head: None,
        ranked_entry: Some(RankedEntry {
            team: TeamRoster { team_id: "me".to_string(), team_name: "Team me".to_string(), players },
            rank: 1,
            is_eliminated: false,
            standings,
            weeks_remaining: 12,
            start_period: 1,
        }),
        playoff_eliminated: false,
    }
}

fn create_full_scheduler(provider: Arc<MockProvider>) -> Arc<UpdateScheduler> {
    let scheduler = UpdateScheduler::new(
        SchedulerConfig::default(),
        Preferences::default(),
        provider,
        Arc::new(StaticGameStatus::new(["BUF"])),
        ScoringPeriod::new(2025, 1),
    );
    Arc::new(assert_ok!(scheduler).with_directory(directory()).with_ranker(Arc::new(SurvivalRanker::default())))
}

#[tokio::test]
async fn test_directory_enriches_rosters_and_serves_search() {
    let provider = Arc::new(MockProvider::new());
    let mut unnamed = starter("4984", "", "QB", "BUF", 22.5);
    unnamed.nfl_team = None;
    provider.add_league(h2h_context(
        "L1",
        vec![unnamed, starter("6794", "Justin Jefferson", "WR", "MIN", 11.0)],
    ));
    let scheduler = create_full_scheduler(Arc::clone(&provider));
    assert_ok!(scheduler.refresh_visible().await);

    let canonical = scheduler.canonical();
    let allen = canonical.iter().find(|p| p.player_id == "4984").unwrap();
    assert_eq!(allen.full_name, "Josh Allen");
    assert_eq!(allen.last_name, "Allen");
    assert_eq!(allen.nfl_team.as_deref(), Some("BUF"));

    let view = scheduler.set_filters(FilterState {
        search: Some(SearchQuery { text: "allen".to_string(), mode: SearchMode::FullDirectory }),
        ..Default::default()
    });
    assert_eq!(view.players.len(), 2);
    assert_eq!(view.players[0].player_id, "4984");
    assert_eq!(view.players[0].origin, SnapshotOrigin::Rostered);
    assert_eq!(view.players[0].league_id, "L1");

    let keenan = &view.players[1];
    assert_eq!(keenan.full_name, "Keenan Allen");
    assert_eq!(keenan.origin, SnapshotOrigin::DirectorySearch);
    assert_eq!(keenan.league_name, SEARCH_LEAGUE_LABEL);
    assert_eq!(keenan.score, 0.0);

    // Search results never leak into the canonical list
    assert_eq!(scheduler.canonical().len(), 2);
}

#[tokio::test]
async fn test_active_filter_recovers_when_nothing_is_live() {
    let provider = Arc::new(MockProvider::new());
    provider.add_league(h2h_context("L1", vec![starter("6794", "Justin Jefferson", "WR", "MIN", 11.0)]));
    let scheduler = create_full_scheduler(Arc::clone(&provider));
    assert_ok!(scheduler.refresh_visible().await);

    let view = scheduler.set_filters(FilterState {
        active_only: true,
        position: PositionFilter::Only(Position::WR),
        ..Default::default()
    });
    assert_eq!(view.players.len(), 1);
    assert_eq!(scheduler.filters().position, PositionFilter::All);
    assert!(!scheduler.filters().active_only);
}

#[tokio::test]
async fn test_score_deltas_accumulate_across_committed_passes() {
    let provider = Arc::new(MockProvider::new());
    provider.add_league(h2h_context("L1", vec![starter("6794", "Justin Jefferson", "WR", "MIN", 10.0)]));
    let scheduler = create_full_scheduler(Arc::clone(&provider));

    assert_ok!(scheduler.refresh_visible().await);
    assert_eq!(scheduler.canonical()[0].accumulated_delta, 0.0);
    assert!(scheduler.canonical()[0].last_activity_time.is_none());

    provider.set_context(h2h_context("L1", vec![starter("6794", "Justin Jefferson", "WR", "MIN", 14.0)]));
    assert_ok!(scheduler.refresh_silent().await);
    let second = scheduler.canonical()[0].clone();
    assert_eq!(second.previous_score, 10.0);
    assert_eq!(second.accumulated_delta, 4.0);
    assert!(second.last_activity_time.is_some());

    // A failed pass does not become the baseline for the next one
    provider.fail("L1");
    assert!(scheduler.refresh_silent().await.is_err());

    provider.set_context(h2h_context("L1", vec![starter("6794", "Justin Jefferson", "WR", "MIN", 20.0)]));
    provider.clear_failures();
    assert_ok!(scheduler.refresh_silent().await);
    let third = scheduler.canonical()[0].clone();
    assert_eq!(third.previous_score, 14.0);
    assert_eq!(third.accumulated_delta, 10.0);
}

#[tokio::test]
async fn test_survival_rankings_follow_committed_passes() {
    let provider = Arc::new(MockProvider::new());
    provider.add_league(h2h_context("L1", vec![starter("4984", "Josh Allen", "QB", "BUF", 20.0)]));
    provider.add_league(survival_context(
        "G1",
        vec![starter("6794", "Justin Jefferson", "WR", "MIN", 12.0)],
        vec![standing("me", 101.0, false), standing("b", 95.0, false), standing("c", 94.0, false)],
    ));
    let scheduler = create_full_scheduler(Arc::clone(&provider));
    let mut events = scheduler.subscribe();

    assert_ok!(scheduler.refresh_visible().await);
    assert_eq!(scheduler.canonical().len(), 2);

    let rankings = scheduler.survival_rankings();
    assert_eq!(rankings.len(), 1);
    let ranking = &rankings[0];
    assert_eq!(ranking.league_id, "G1");
    assert_eq!(ranking.user_standing().unwrap().rank, 1);
    assert_eq!(ranking.standings[2].status, EliminationStatus::Critical);

    let mut saw_survival = false;
    while let Ok(event) = events.try_recv() {
        if let EngineEvent::SurvivalUpdated { rankings, .. } = event {
            assert_eq!(rankings.len(), 1);
            saw_survival = true;
        }
    }
    assert!(saw_survival);

    // Team c is chopped going into the next period
    provider.set_context(survival_context(
        "G1",
        vec![starter("6794", "Justin Jefferson", "WR", "MIN", 0.0)],
        vec![standing("me", 0.0, false), standing("b", 0.0, false), standing("c", 0.0, true)],
    ));
    assert_ok!(scheduler.change_period(ScoringPeriod::new(2025, 2)).await);

    let rankings = scheduler.survival_rankings();
    let ranking = &rankings[0];
    assert_eq!(ranking.period, 2);
    assert_eq!(ranking.eliminated_team_ids, vec!["c".to_string()]);
    assert_eq!(ranking.history.len(), 1);
    assert_eq!(ranking.history[0].team_id, "c");
    assert_eq!(ranking.history[0].period, 1);
}

#[tokio::test]
async fn test_chopped_roster_contributes_no_players() {
    let provider = Arc::new(MockProvider::new());
    provider.add_league(h2h_context("L1", vec![starter("4984", "Josh Allen", "QB", "BUF", 20.0)]));
    provider.add_league(survival_context(
        "G1",
        vec![starter("0", "", "", "", 0.0)],
        vec![standing("me", 0.0, false), standing("b", 80.0, false)],
    ));
    let scheduler = create_full_scheduler(Arc::clone(&provider));

    let report = assert_ok!(scheduler.refresh_visible().await);
    assert_eq!(report.player_count, 1);
    assert!(scheduler.canonical().iter().all(|p| p.league_id == "L1"));
}
