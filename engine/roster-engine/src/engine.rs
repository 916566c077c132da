//! Roster engine state
//!
//! `RosterEngine` owns the canonical snapshot list and everything derived
//! from it. Passes are built without touching the engine and only become
//! visible through [`RosterEngine::commit_pass`], the single mutation path.

use crate::config::Preferences;
use crate::extractor::{ExtractionFlags, Extractor};
use crate::filter::{FilterSortPipeline, FilterState, FilteredView};
use crate::reconciler::{index_snapshots, PriorSnapshots};
use crate::statistics::{DistributionStats, ScalingMode};
use crate::types::{MatchupContext, PlayerSnapshot};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// How a committed pass is announced to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UpdateMode {
    /// First load or explicit refresh; observers may show loading state
    Visible,
    /// Background poll; observers must keep scroll, selection and animation
    Silent,
}

/// Lifecycle of the data behind the view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EngineStatus {
    Loading,
    Ready,
    /// Last pass was rejected; the view shows the previous good data
    Stale,
    /// Repeated passes produced nothing; a retry is still possible
    NoData { attempts: u32 },
}

/// Top-level scalar stats shown alongside the view
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PublishedStats {
    pub top_score: f64,
    pub median: f64,
    pub score_range: f64,
    pub scaling_mode: ScalingMode,
}

impl PublishedStats {
    fn from_distribution(stats: &DistributionStats) -> Self {
        Self {
            top_score: stats.top_score,
            median: stats.median,
            score_range: stats.score_range,
            scaling_mode: stats.scaling_mode,
        }
    }

    /// Whether `other` differs enough to be worth republishing
    pub fn differs_from(&self, other: &PublishedStats, epsilon: f64) -> bool {
        (self.top_score - other.top_score).abs() > epsilon
            || (self.median - other.median).abs() > epsilon
            || (self.score_range - other.score_range).abs() > epsilon
            || self.scaling_mode != other.scaling_mode
    }
}

/// A fully built pass waiting to be committed
#[derive(Debug, Clone)]
pub struct PreparedPass {
    pub generation: u64,
    pub snapshots: Vec<PlayerSnapshot>,
    pub stats: DistributionStats,
    pub built_at: DateTime<Utc>,
    pub league_count: usize,
}

/// What a commit changed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitReport {
    pub generation: u64,
    pub mode: UpdateMode,
    pub player_count: usize,
    pub published_changed: bool,
    pub filters_reset: bool,
}

pub struct RosterEngine {
    preferences: Preferences,

    canonical: Arc<Vec<PlayerSnapshot>>,
    previous: Arc<PriorSnapshots>,
    stats: DistributionStats,
    published: PublishedStats,

    filters: FilterState,
    view: FilteredView,

    last_updated: Option<DateTime<Utc>>,
    data_loaded: bool,
    status: EngineStatus,
    committed_generation: u64,
}

impl RosterEngine {
    pub fn new(preferences: Preferences) -> Self {
        let stats = DistributionStats::default();
        let filters = preferences.default_filters.clone();
        Self {
            preferences,
            canonical: Arc::new(Vec::new()),
            previous: Arc::new(PriorSnapshots::new()),
            published: PublishedStats::from_distribution(&stats),
            stats,
            filters,
            view: FilteredView::default(),
            last_updated: None,
            data_loaded: false,
            status: EngineStatus::Loading,
            committed_generation: 0,
        }
    }

    /// Build a pass from league contexts against the last committed pass
    ///
    /// Pure: nothing on the engine changes until the pass is committed.
    pub fn build_pass(
        prior: &PriorSnapshots,
        contexts: &[MatchupContext],
        extractor: &Extractor<'_>,
        flags: ExtractionFlags,
        generation: u64,
        now: DateTime<Utc>,
    ) -> PreparedPass {
        let snapshots: Vec<PlayerSnapshot> =
            contexts.iter().flat_map(|context| extractor.extract(context, prior, flags, now)).collect();

        let stats = DistributionStats::from_snapshots(&snapshots);
        let snapshots = stats.apply(snapshots);

        debug!(
            generation,
            leagues = contexts.len(),
            players = snapshots.len(),
            scaling = ?stats.scaling_mode,
            "Built pass"
        );

        PreparedPass { generation, snapshots, stats, built_at: now, league_count: contexts.len() }
    }

    /// Make a prepared pass the current state and rebuild the filtered view
    pub fn commit_pass(
        &mut self,
        pass: PreparedPass,
        mode: UpdateMode,
        pipeline: &FilterSortPipeline<'_>,
        stat_epsilon: f64,
    ) -> CommitReport {
        let candidate = PublishedStats::from_distribution(&pass.stats);
        let published_changed = match mode {
            UpdateMode::Visible => true,
            UpdateMode::Silent => candidate.differs_from(&self.published, stat_epsilon),
        };
        if published_changed {
            self.published = candidate;
        }

        self.previous = Arc::new(index_snapshots(&pass.snapshots));
        self.canonical = Arc::new(pass.snapshots);
        self.stats = pass.stats;
        self.last_updated = Some(pass.built_at);
        self.data_loaded = true;
        self.status = EngineStatus::Ready;
        self.committed_generation = pass.generation;

        let filters_reset = self.refresh_view(pipeline);

        info!(
            generation = pass.generation,
            mode = ?mode,
            players = self.canonical.len(),
            published_changed,
            "Committed pass"
        );

        CommitReport {
            generation: pass.generation,
            mode,
            player_count: self.canonical.len(),
            published_changed,
            filters_reset,
        }
    }

    /// Replace the filter state and rebuild the view
    pub fn set_filters(&mut self, filters: FilterState, pipeline: &FilterSortPipeline<'_>) -> &FilteredView {
        self.filters = filters;
        self.refresh_view(pipeline);
        &self.view
    }

    fn refresh_view(&mut self, pipeline: &FilterSortPipeline<'_>) -> bool {
        let outcome = pipeline.run(&self.canonical, &self.filters, self.data_loaded);
        self.view = outcome.view;
        if outcome.recovered {
            self.filters = outcome.effective_filters;
        }
        outcome.recovered
    }

    /// Keep the current data but flag it as out of date
    pub fn mark_stale(&mut self) {
        if self.data_loaded {
            self.status = EngineStatus::Stale;
        }
    }

    pub fn mark_no_data(&mut self, attempts: u32) {
        self.status = EngineStatus::NoData { attempts };
    }

    /// Snapshots of the last fully committed pass
    pub fn prior(&self) -> Arc<PriorSnapshots> {
        Arc::clone(&self.previous)
    }

    pub fn canonical(&self) -> Arc<Vec<PlayerSnapshot>> {
        Arc::clone(&self.canonical)
    }

    pub fn stats(&self) -> &DistributionStats {
        &self.stats
    }

    pub fn published_stats(&self) -> PublishedStats {
        self.published
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn view(&self) -> &FilteredView {
        &self.view
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn extraction_flags(&self) -> ExtractionFlags {
        ExtractionFlags::from(&self.preferences)
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn is_data_loaded(&self) -> bool {
        self.data_loaded
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    pub fn committed_generation(&self) -> u64 {
        self.committed_generation
    }
}
