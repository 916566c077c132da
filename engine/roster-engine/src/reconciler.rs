//! Score reconciliation against the last completed pass

use crate::types::{PlayerSnapshot, SnapshotKey};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Changes at or below this many points are treated as noise
pub const ACTIVITY_THRESHOLD: f64 = 0.01;

/// Snapshots of the last fully committed pass, keyed by (player, matchup)
pub type PriorSnapshots = HashMap<SnapshotKey, PlayerSnapshot>;

/// Delta and activity state carried from one cycle to the next
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreState {
    pub previous_score: f64,
    pub accumulated_delta: f64,
    pub last_activity_time: Option<DateTime<Utc>>,
}

/// Index a committed snapshot list for the next cycle's lookups
pub fn index_snapshots(snapshots: &[PlayerSnapshot]) -> PriorSnapshots {
    snapshots.iter().map(|snapshot| (snapshot.key(), snapshot.clone())).collect()
}

/// Derive the delta/activity state for a freshly observed score
///
/// A first observation has no prior and therefore a zero delta. The
/// accumulated delta and activity timestamp only move when the fresh delta
/// exceeds [`ACTIVITY_THRESHOLD`]; an activity timestamp is never cleared.
pub fn reconcile(prior: Option<&PlayerSnapshot>, current_score: f64, now: DateTime<Utc>) -> ScoreState {
    let Some(prior) = prior else {
        return ScoreState { previous_score: current_score, accumulated_delta: 0.0, last_activity_time: None };
    };

    let previous_score = prior.score;
    let fresh_delta = current_score - previous_score;

    if fresh_delta.abs() > ACTIVITY_THRESHOLD {
        ScoreState {
            previous_score,
            accumulated_delta: prior.accumulated_delta + fresh_delta,
            last_activity_time: Some(now),
        }
    } else {
        ScoreState {
            previous_score,
            accumulated_delta: prior.accumulated_delta,
            last_activity_time: prior.last_activity_time,
        }
    }
}
