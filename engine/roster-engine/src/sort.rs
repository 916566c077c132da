//! View orderings
//!
//! Every ordering ends in the same identity tie-break, so applying one
//! configuration twice to the same input always yields the same order.

use crate::names::last_name_key;
use crate::types::PlayerSnapshot;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sorts after every real team code
const MISSING_TEAM_SENTINEL: &str = "~~~";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortMethod {
    #[default]
    Score,
    Name,
    Team,
    Position,
    Recent,
}

/// Sort a view in place
///
/// `descending` toggles high/low for score ordering and reverses position
/// priority. Name, team and recency orderings have a fixed direction.
pub fn sort_snapshots(players: &mut [PlayerSnapshot], method: SortMethod, descending: bool) {
    players.sort_by(|a, b| compare(a, b, method, descending));
}

fn compare(a: &PlayerSnapshot, b: &PlayerSnapshot, method: SortMethod, descending: bool) -> Ordering {
    let primary = match method {
        SortMethod::Score => {
            if descending {
                b.score.total_cmp(&a.score)
            } else {
                a.score.total_cmp(&b.score)
            }
        }
        SortMethod::Name => last_name_key(&a.full_name)
            .cmp(&last_name_key(&b.full_name))
            .then_with(|| a.first_name.to_lowercase().cmp(&b.first_name.to_lowercase())),
        SortMethod::Team => team_key(a)
            .cmp(team_key(b))
            .then_with(|| a.position.sort_priority().cmp(&b.position.sort_priority())),
        SortMethod::Position => {
            let by_priority = a.position.sort_priority().cmp(&b.position.sort_priority());
            let by_priority = if descending { by_priority } else { by_priority.reverse() };
            by_priority.then_with(|| b.score.total_cmp(&a.score))
        }
        SortMethod::Recent => {
            // Missing activity sorts as the distant past
            b.last_activity_time
                .cmp(&a.last_activity_time)
                .then_with(|| b.score.total_cmp(&a.score))
        }
    };

    primary.then_with(|| identity(a).cmp(&identity(b)))
}

fn team_key(player: &PlayerSnapshot) -> &str {
    match player.nfl_team.as_deref() {
        Some(team) if !team.trim().is_empty() => team,
        _ => MISSING_TEAM_SENTINEL,
    }
}

fn identity(player: &PlayerSnapshot) -> (&str, &str, &str, &str) {
    (&player.full_name, &player.league_name, &player.player_id, &player.matchup_id)
}
