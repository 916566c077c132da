//! Events published to engine observers

use roster_engine::PublishedStats;
use serde::Serialize;
use std::sync::Arc;
use survival_ranker::SurvivalRanking;

/// Why a pass was dropped without touching the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AbortReason {
    PartialData { expected: usize, available: usize },
    Cancelled,
    Superseded { current: u64 },
}

#[derive(Debug, Clone, Serialize)]
pub enum EngineEvent {
    /// A visible pass started; observers may show a loading state
    LoadingStarted { generation: u64 },

    /// A visible pass committed; observers should rebuild from scratch
    VisibleUpdate { generation: u64, player_count: usize, stats: PublishedStats, filters_reset: bool },

    /// A background pass committed; `stats` is present only when the
    /// published scalars moved
    SilentUpdate { generation: u64, player_count: usize, stats: Option<PublishedStats> },

    /// Survival rankings recomputed from the same pass
    SurvivalUpdated { generation: u64, rankings: Arc<Vec<SurvivalRanking>> },

    /// A pass was dropped; the previous result stays on screen
    PassAborted { generation: u64, reason: AbortReason },

    /// Repeated passes produced no players; a retry is still possible
    NoData { attempts: u32 },
}
