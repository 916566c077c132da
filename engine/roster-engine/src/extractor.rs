//! Roster extraction
//!
//! Turns one [`MatchupContext`] into the user's starter snapshots, folding in
//! reconciliation against the previous pass as each snapshot is built.

use crate::config::Preferences;
use crate::names::split_name;
use crate::position::Position;
use crate::reconciler::{reconcile, PriorSnapshots};
use crate::sources::PlayerDirectoryLookup;
use crate::types::{
    MatchupContext, PerformanceTier, PlayerSnapshot, RosterPlayer, SnapshotKey, SnapshotOrigin,
};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Visibility toggles for eliminated teams
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionFlags {
    pub show_eliminated_survival: bool,
    pub show_eliminated_playoffs: bool,
}

impl From<&Preferences> for ExtractionFlags {
    fn from(preferences: &Preferences) -> Self {
        Self {
            show_eliminated_survival: preferences.show_eliminated_survival,
            show_eliminated_playoffs: preferences.show_eliminated_playoffs,
        }
    }
}

/// Builds snapshots for the user's own roster
pub struct Extractor<'a> {
    directory: Option<&'a dyn PlayerDirectoryLookup>,
}

impl<'a> Extractor<'a> {
    pub fn new() -> Self {
        Self { directory: None }
    }

    /// Fill in missing names and teams from the player directory
    pub fn with_directory(directory: &'a dyn PlayerDirectoryLookup) -> Self {
        Self { directory: Some(directory) }
    }

    /// Extract the user's starters from one league context
    ///
    /// Returns an empty list for partially fetched contexts, for hidden
    /// eliminated teams, and for chopped survival rosters. Callers must check
    /// that every expected league is present before trusting an empty
    /// aggregate.
    pub fn extract(
        &self,
        context: &MatchupContext,
        prior: &PriorSnapshots,
        flags: ExtractionFlags,
        now: DateTime<Utc>,
    ) -> Vec<PlayerSnapshot> {
        if let Some(pair) = &context.head_to_head {
            if context.playoff_eliminated && !flags.show_eliminated_playoffs {
                debug!(league_id = %context.league.league_id, "Skipping playoff-eliminated league");
                return Vec::new();
            }
            return self.build_all(context, pair.user.starters(), prior, now);
        }

        if let Some(entry) = &context.ranked_entry {
            if entry.is_eliminated && !flags.show_eliminated_survival {
                debug!(league_id = %context.league.league_id, "Skipping eliminated survival team");
                return Vec::new();
            }

            if !has_valid_starter(entry.team.starters()) {
                debug!(
                    league_id = %context.league.league_id,
                    team_id = %entry.team.team_id,
                    "Survival roster has no valid starters, treating as chopped"
                );
                return Vec::new();
            }

            return self.build_all(context, entry.team.starters(), prior, now);
        }

        debug!(league_id = %context.league.league_id, "Matchup context has no roster data");
        Vec::new()
    }

    fn build_all<'r>(
        &self,
        context: &MatchupContext,
        starters: impl Iterator<Item = &'r RosterPlayer>,
        prior: &PriorSnapshots,
        now: DateTime<Utc>,
    ) -> Vec<PlayerSnapshot> {
        starters.map(|player| self.build_snapshot(context, player, prior, now)).collect()
    }

    fn build_snapshot(
        &self,
        context: &MatchupContext,
        player: &RosterPlayer,
        prior: &PriorSnapshots,
        now: DateTime<Utc>,
    ) -> PlayerSnapshot {
        let mut full_name = player.full_name.trim().to_string();
        let mut nfl_team = player.nfl_team.clone().filter(|team| !team.trim().is_empty());
        let mut position = Position::parse(&player.position);

        if full_name.is_empty() || nfl_team.is_none() || position == Position::Unknown {
            if let Some(canonical) =
                self.directory.and_then(|d| d.resolve(&context.league.source, &player.player_id))
            {
                if full_name.is_empty() {
                    full_name = canonical.full_name;
                }
                if nfl_team.is_none() {
                    nfl_team = canonical.nfl_team;
                }
                if position == Position::Unknown {
                    position = canonical.position;
                }
            }
        }

        let (first_name, last_name) = split_name(&full_name);
        let key = SnapshotKey::new(player.player_id.clone(), context.matchup_id.clone());
        let state = reconcile(prior.get(&key), player.score, now);

        PlayerSnapshot {
            player_id: player.player_id.clone(),
            matchup_id: context.matchup_id.clone(),
            slot: player.slot.clone(),
            full_name,
            first_name,
            last_name,
            position,
            nfl_team,
            score: player.score,
            projected_score: player.projected_score,
            league_id: context.league.league_id.clone(),
            league_name: context.league.name.clone(),
            source: context.league.source.clone(),
            is_starter: player.is_starter,
            percentage_of_top: 0.0,
            tier: PerformanceTier::Struggling,
            previous_score: state.previous_score,
            accumulated_delta: state.accumulated_delta,
            last_activity_time: state.last_activity_time,
            origin: SnapshotOrigin::Rostered,
        }
    }
}

impl Default for Extractor<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// A genuine survival roster has at least one starter with a name and a
/// concrete (non-flex, non-empty) position
fn has_valid_starter<'r>(mut starters: impl Iterator<Item = &'r RosterPlayer>) -> bool {
    starters.any(|player| {
        !player.full_name.trim().is_empty() && Position::parse(&player.position).is_concrete()
    })
}
