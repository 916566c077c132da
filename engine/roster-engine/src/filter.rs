//! Filter and sort pipeline
//!
//! Stage order on the canonical list:
//! 1. search (rostered or full-directory), or
//! 2. position filter followed by the active-game filter
//! 3. quality filter (skipped for rostered search)
//! 4. bucket-local distribution stats
//! 5. sort
//!
//! The canonical list is only read; every view is a fresh vector.

use crate::position::Position;
use crate::sort::{sort_snapshots, SortMethod};
use crate::sources::{DirectoryPlayer, GameStatusLookup, PlayerDirectoryLookup};
use crate::statistics::DistributionStats;
use crate::types::{
    PerformanceTier, PlayerSnapshot, SnapshotOrigin, SourcePlatform, SEARCH_LEAGUE_LABEL,
    SEARCH_MATCHUP_ID,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

const UNKNOWN_PLAYER_NAME: &str = "unknown player";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SearchMode {
    /// Match only players already on the user's rosters
    #[default]
    Rostered,
    /// Look up the wider player directory
    FullDirectory,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    pub mode: SearchMode,
}

impl SearchQuery {
    fn tokens(&self) -> Vec<String> {
        self.text.split_whitespace().map(str::to_lowercase).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PositionFilter {
    #[default]
    All,
    Only(Position),
}

impl PositionFilter {
    fn admits(&self, position: &Position) -> bool {
        match self {
            PositionFilter::All => true,
            PositionFilter::Only(wanted) => wanted == position,
        }
    }
}

/// Everything the user can toggle on the roster view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    pub search: Option<SearchQuery>,
    pub position: PositionFilter,
    pub active_only: bool,
    pub sort: SortMethod,
    pub sort_descending: bool,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search: None,
            position: PositionFilter::All,
            active_only: false,
            sort: SortMethod::Score,
            sort_descending: true,
        }
    }
}

impl FilterState {
    /// Active search query, ignoring blank input
    pub fn active_search(&self) -> Option<&SearchQuery> {
        self.search.as_ref().filter(|query| !query.text.trim().is_empty())
    }

    fn is_narrowed(&self) -> bool {
        self.active_only || self.position != PositionFilter::All
    }

    /// Same state with the position and active-game filters back at defaults
    pub fn relaxed(&self) -> Self {
        Self { position: PositionFilter::All, active_only: false, ..self.clone() }
    }
}

/// A filtered, sorted view with the distribution of its own bucket
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilteredView {
    pub players: Vec<PlayerSnapshot>,
    pub stats: DistributionStats,
}

/// Result of running the pipeline
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub view: FilteredView,
    /// The filter state the view was actually produced with
    pub effective_filters: FilterState,
    /// True when narrow filters produced nothing and were reset
    pub recovered: bool,
}

pub struct FilterSortPipeline<'a> {
    games: &'a dyn GameStatusLookup,
    directory: Option<&'a dyn PlayerDirectoryLookup>,
    search_limit: usize,
}

impl<'a> FilterSortPipeline<'a> {
    pub fn new(games: &'a dyn GameStatusLookup, search_limit: usize) -> Self {
        Self { games, directory: None, search_limit }
    }

    pub fn with_directory(mut self, directory: &'a dyn PlayerDirectoryLookup) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Run the pipeline, recovering from an empty view caused by narrow filters
    pub fn run(&self, canonical: &[PlayerSnapshot], state: &FilterState, data_loaded: bool) -> FilterOutcome {
        let view = self.run_once(canonical, state);

        let stuck = view.players.is_empty()
            && !canonical.is_empty()
            && data_loaded
            && state.active_search().is_none()
            && state.is_narrowed();

        if stuck {
            let relaxed = state.relaxed();
            warn!(
                position = ?state.position,
                active_only = state.active_only,
                "Filters produced an empty view, resetting position and active filters"
            );
            return FilterOutcome { view: self.run_once(canonical, &relaxed), effective_filters: relaxed, recovered: true };
        }

        FilterOutcome { view, effective_filters: state.clone(), recovered: false }
    }

    fn run_once(&self, canonical: &[PlayerSnapshot], state: &FilterState) -> FilteredView {
        let selected = match state.active_search() {
            Some(query) if query.mode == SearchMode::Rostered => rostered_search(canonical, query),
            Some(query) => {
                let found = self.directory_search(canonical, query);
                quality_filter(found)
            }
            None => {
                let narrowed = canonical
                    .iter()
                    .filter(|player| state.position.admits(&player.position))
                    .filter(|player| !state.active_only || self.is_live(player))
                    .cloned()
                    .collect();
                quality_filter(narrowed)
            }
        };

        let stats = DistributionStats::from_snapshots(&selected);
        let mut players = stats.apply(selected);
        sort_snapshots(&mut players, state.sort, state.sort_descending);

        FilteredView { players, stats }
    }

    fn is_live(&self, player: &PlayerSnapshot) -> bool {
        player.nfl_team.as_deref().map(|team| self.games.is_live(team)).unwrap_or(false)
    }

    fn directory_search(&self, canonical: &[PlayerSnapshot], query: &SearchQuery) -> Vec<PlayerSnapshot> {
        let Some(directory) = self.directory else {
            debug!("No player directory configured, falling back to rostered search");
            return rostered_search(canonical, query);
        };

        let hits = directory.search(query.text.trim(), self.search_limit);
        let placeholder_matchup = canonical
            .first()
            .map(|player| player.matchup_id.clone())
            .unwrap_or_else(|| SEARCH_MATCHUP_ID.to_string());

        // Snapshots carry platform ids; directory hits carry canonical ids
        let mut rostered_by_id: HashMap<String, Vec<&PlayerSnapshot>> = HashMap::new();
        for player in canonical {
            let canonical_id = directory
                .resolve(&player.source, &player.player_id)
                .map(|record| record.player_id)
                .unwrap_or_else(|| player.player_id.clone());
            rostered_by_id.entry(canonical_id).or_default().push(player);
        }

        let mut seen = HashSet::new();
        let mut results = Vec::new();
        for hit in hits {
            if !seen.insert(hit.player_id.clone()) {
                continue;
            }

            match rostered_by_id.get(&hit.player_id) {
                Some(rostered) => results.extend(rostered.iter().map(|player| (*player).clone())),
                None => results.push(synthesize_search_entry(hit, &placeholder_matchup)),
            }
        }

        debug!(query = %query.text, results = results.len(), "Directory search complete");
        results
    }
}

fn rostered_search(canonical: &[PlayerSnapshot], query: &SearchQuery) -> Vec<PlayerSnapshot> {
    let tokens = query.tokens();
    canonical.iter().filter(|player| matches_any_token(player, &tokens)).cloned().collect()
}

fn matches_any_token(player: &PlayerSnapshot, tokens: &[String]) -> bool {
    let fields =
        [player.full_name.to_lowercase(), player.first_name.to_lowercase(), player.last_name.to_lowercase()];
    tokens.iter().any(|token| fields.iter().any(|field| field.contains(token.as_str())))
}

/// Drop unnamed, placeholder and negative-score entries
fn quality_filter(players: Vec<PlayerSnapshot>) -> Vec<PlayerSnapshot> {
    players
        .into_iter()
        .filter(|player| {
            let name = player.full_name.trim();
            !name.is_empty() && !name.eq_ignore_ascii_case(UNKNOWN_PLAYER_NAME) && player.score >= 0.0
        })
        .collect()
}

fn synthesize_search_entry(hit: DirectoryPlayer, matchup_id: &str) -> PlayerSnapshot {
    let (first_name, last_name) = crate::names::split_name(&hit.full_name);
    PlayerSnapshot {
        player_id: hit.player_id,
        matchup_id: matchup_id.to_string(),
        slot: String::new(),
        full_name: hit.full_name,
        first_name,
        last_name,
        position: hit.position,
        nfl_team: hit.nfl_team,
        score: 0.0,
        projected_score: 0.0,
        league_id: SEARCH_MATCHUP_ID.to_string(),
        league_name: SEARCH_LEAGUE_LABEL.to_string(),
        source: SourcePlatform::Other(SEARCH_MATCHUP_ID.to_string()),
        is_starter: false,
        percentage_of_top: 0.0,
        tier: PerformanceTier::Struggling,
        previous_score: 0.0,
        accumulated_delta: 0.0,
        last_activity_time: None,
        origin: SnapshotOrigin::DirectorySearch,
    }
}
