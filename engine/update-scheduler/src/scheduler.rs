//! Core UpdateScheduler implementation

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use parking_lot::{Mutex as SyncMutex, RwLock};
use tokio::sync::{broadcast, mpsc, watch, Mutex, Notify};
use tokio::task::JoinSet;
use tokio::time::{interval, sleep, timeout, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use roster_engine::{
    CommitReport, EngineStatus, Extractor, FilterSortPipeline, FilterState, FilteredView, GameStatusLookup,
    MatchupContext, PlayerDirectoryLookup, PlayerSnapshot, Preferences, PublishedStats, RosterEngine,
    SourceFetchError, UpdateMode,
};
use survival_ranker::{SurvivalRanker, SurvivalRanking};

use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::events::{AbortReason, EngineEvent};
use crate::metrics::{MetricsCollector, SchedulerMetrics};
use crate::provider::{MatchupSourceProvider, ScoringPeriod};
use crate::PERIOD_CHANNEL_CAPACITY;

/// Invalidates whatever pass is in flight
///
/// Each pass claims a generation when it starts and commits only if that
/// generation is still current, so a cancelled pass is discarded whole.
#[derive(Clone)]
pub struct CancelHandle {
    generation: Arc<watch::Sender<u64>>,
}

impl CancelHandle {
    /// Advance the generation and return the new value
    pub fn cancel(&self) -> u64 {
        let mut current = 0;
        self.generation.send_modify(|generation| {
            *generation += 1;
            current = *generation;
        });
        current
    }

    pub fn current(&self) -> u64 {
        *self.generation.borrow()
    }
}

/// Drives the roster engine: polling, fan-out fetch, gating and commit
pub struct UpdateScheduler {
    config: SchedulerConfig,

    // Collaborators
    provider: Arc<dyn MatchupSourceProvider>,
    games: Arc<dyn GameStatusLookup>,
    directory: Option<Arc<dyn PlayerDirectoryLookup>>,
    ranker: Option<Arc<SurvivalRanker>>,

    // Engine state; written only by commits and filter changes
    engine: RwLock<RosterEngine>,
    rankings: RwLock<Arc<Vec<SurvivalRanking>>>,
    period: RwLock<ScoringPeriod>,

    // Pass coordination
    update_lock: Mutex<()>,
    cancel: CancelHandle,
    empty_attempts: AtomicU32,

    // Lifecycle
    is_running: AtomicBool,
    shutdown: Notify,
    period_tx: mpsc::Sender<ScoringPeriod>,
    period_rx: SyncMutex<Option<mpsc::Receiver<ScoringPeriod>>>,

    // Observers
    events: broadcast::Sender<EngineEvent>,
    metrics_collector: Arc<MetricsCollector>,
}

impl UpdateScheduler {
    /// Create a new UpdateScheduler for the given starting period
    pub fn new(
        config: SchedulerConfig,
        preferences: Preferences,
        provider: Arc<dyn MatchupSourceProvider>,
        games: Arc<dyn GameStatusLookup>,
        initial_period: ScoringPeriod,
    ) -> Result<Self, SchedulerError> {
        config.validate()?;
        preferences.validate().map_err(|e| SchedulerError::Config(e.to_string()))?;

        let (events, _) = broadcast::channel(config.event_channel_capacity);
        let (period_tx, period_rx) = mpsc::channel(PERIOD_CHANNEL_CAPACITY);
        let (generation, _) = watch::channel(0u64);

        info!(
            period = %initial_period,
            poll_interval_ms = config.poll_interval_ms,
            max_concurrent_fetches = config.max_concurrent_fetches,
            "Creating UpdateScheduler"
        );

        Ok(Self {
            config,
            provider,
            games,
            directory: None,
            ranker: None,
            engine: RwLock::new(RosterEngine::new(preferences)),
            rankings: RwLock::new(Arc::new(Vec::new())),
            period: RwLock::new(initial_period),
            update_lock: Mutex::new(()),
            cancel: CancelHandle { generation: Arc::new(generation) },
            empty_attempts: AtomicU32::new(0),
            is_running: AtomicBool::new(false),
            shutdown: Notify::new(),
            period_tx,
            period_rx: SyncMutex::new(Some(period_rx)),
            events,
            metrics_collector: Arc::new(MetricsCollector::new()),
        })
    }

    /// Enrich rosters and serve full-directory search from a player directory
    pub fn with_directory(mut self, directory: Arc<dyn PlayerDirectoryLookup>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Rank survival leagues from every committed pass
    pub fn with_ranker(mut self, ranker: Arc<SurvivalRanker>) -> Self {
        self.ranker = Some(ranker);
        self
    }

    /// First load or explicit refresh; observers may show a loading state
    pub async fn refresh_visible(&self) -> Result<CommitReport, SchedulerError> {
        self.run_exclusive(UpdateMode::Visible).await
    }

    /// Background refresh; observers keep scroll, selection and animation
    pub async fn refresh_silent(&self) -> Result<CommitReport, SchedulerError> {
        self.run_exclusive(UpdateMode::Silent).await
    }

    /// Switch to a new scoring period and rebuild visibly
    ///
    /// Cancels the in-flight pass and waits for it to release the update
    /// lock rather than being rejected by it.
    pub async fn change_period(&self, period: ScoringPeriod) -> Result<CommitReport, SchedulerError> {
        *self.period.write() = period;
        let generation = self.cancel.cancel();
        debug!(%period, generation, "Period changed, cancelled in-flight pass");

        let _guard = self.update_lock.lock().await;
        self.execute_pass(UpdateMode::Visible).await
    }

    async fn run_exclusive(&self, mode: UpdateMode) -> Result<CommitReport, SchedulerError> {
        let _guard = self.update_lock.try_lock().map_err(|_| {
            self.metrics_collector.record_rejected();
            debug!(?mode, "Rejected update, another pass is in flight");
            SchedulerError::UpdateInProgress
        })?;
        self.execute_pass(mode).await
    }

    /// One full pass; the caller holds the update lock
    async fn execute_pass(&self, mode: UpdateMode) -> Result<CommitReport, SchedulerError> {
        let started = Instant::now();

        let mut cancel_rx = self.cancel.generation.subscribe();
        let generation = self.cancel.cancel();
        // Our own claim is not a cancellation
        let _ = cancel_rx.borrow_and_update();

        self.metrics_collector.record_pass_started();
        let period = *self.period.read();
        debug!(generation, ?mode, %period, "Starting pass");

        if mode == UpdateMode::Visible {
            self.publish(EngineEvent::LoadingStarted { generation });
        }

        let fetched = tokio::select! {
            biased;
            fetched = self.fetch_contexts(period) => fetched,
            _ = cancel_rx.changed() => {
                self.metrics_collector.record_cancelled();
                info!(generation, "Pass cancelled while fetching");
                self.publish(EngineEvent::PassAborted { generation, reason: AbortReason::Cancelled });
                return Err(SchedulerError::Cancelled);
            }
        };

        let (expected, contexts) = match fetched {
            Ok(fetched) => fetched,
            Err(e) => {
                self.engine.write().mark_stale();
                return Err(e);
            }
        };

        if contexts.len() < expected {
            let available = contexts.len();
            self.metrics_collector.record_partial_abort();
            self.engine.write().mark_stale();
            warn!(generation, expected, available, "Incomplete league data, keeping previous result");
            self.publish(EngineEvent::PassAborted {
                generation,
                reason: AbortReason::PartialData { expected, available },
            });
            return Err(SchedulerError::PartialData { expected, available });
        }

        let (prior, flags) = {
            let engine = self.engine.read();
            (engine.prior(), engine.extraction_flags())
        };
        let extractor = match self.directory.as_deref() {
            Some(directory) => Extractor::with_directory(directory),
            None => Extractor::new(),
        };
        let pass = RosterEngine::build_pass(&prior, &contexts, &extractor, flags, generation, Utc::now());

        let committed = {
            let mut engine = self.engine.write();
            let current = self.cancel.current();
            if current == generation {
                let limit = engine.preferences().directory_search_limit;
                let pipeline = self.pipeline(limit);
                let report = engine.commit_pass(pass, mode, &pipeline, self.config.stat_change_epsilon);
                Ok((report, engine.published_stats()))
            } else {
                Err(current)
            }
        };

        let (report, published) = match committed {
            Ok(committed) => committed,
            Err(current) => {
                self.metrics_collector.record_superseded();
                info!(generation, current, "Discarding superseded pass");
                self.publish(EngineEvent::PassAborted { generation, reason: AbortReason::Superseded { current } });
                return Err(SchedulerError::Superseded { generation, current });
            }
        };

        let no_data = self.track_empty_passes(report.player_count);

        if let Some(ranker) = &self.ranker {
            let rankings = Arc::new(ranker.rank_all(&contexts));
            *self.rankings.write() = Arc::clone(&rankings);
            if !rankings.is_empty() {
                self.publish(EngineEvent::SurvivalUpdated { generation, rankings });
            }
        }

        match mode {
            UpdateMode::Visible => self.publish(EngineEvent::VisibleUpdate {
                generation,
                player_count: report.player_count,
                stats: published,
                filters_reset: report.filters_reset,
            }),
            UpdateMode::Silent => self.publish(EngineEvent::SilentUpdate {
                generation,
                player_count: report.player_count,
                stats: report.published_changed.then_some(published),
            }),
        }

        self.metrics_collector.record_commit(mode == UpdateMode::Visible, report.player_count, started.elapsed());

        match no_data {
            Some(attempts) => Err(SchedulerError::NoData { attempts }),
            None => Ok(report),
        }
    }

    /// Fan out league fetches with bounded concurrency
    ///
    /// Returns the expected league count with every context that arrived,
    /// in connected-league order. Failed leagues are logged and left out.
    async fn fetch_contexts(&self, period: ScoringPeriod) -> Result<(usize, Vec<MatchupContext>), SchedulerError> {
        let leagues = self.provider.connected_leagues().await?;
        let expected = leagues.len();
        let fetch_timeout = self.config.fetch_timeout();

        let mut results: Vec<(usize, Result<MatchupContext, SourceFetchError>)> =
            stream::iter(leagues.into_iter().enumerate())
                .map(|(index, league)| {
                    let provider = Arc::clone(&self.provider);
                    async move {
                        let result = match timeout(fetch_timeout, provider.fetch_matchup(&league, period)).await {
                            Ok(result) => result,
                            Err(_) => Err(SourceFetchError::Timeout { league_id: league.league_id.clone() }),
                        };
                        (index, result)
                    }
                })
                .buffer_unordered(self.config.max_concurrent_fetches)
                .collect()
                .await;
        results.sort_by_key(|(index, _)| *index);

        let mut contexts = Vec::with_capacity(expected);
        let mut failures = 0;
        for (_, result) in results {
            match result {
                Ok(context) => {
                    if context.is_partial() {
                        debug!(league_id = %context.league.league_id, "League context has no roster data");
                    }
                    contexts.push(context);
                }
                Err(e) => {
                    failures += 1;
                    warn!(league_id = %e.league_id(), "League fetch failed: {e}");
                }
            }
        }

        if failures > 0 {
            self.metrics_collector.record_source_failures(failures);
        }
        Ok((expected, contexts))
    }

    /// Count consecutive empty commits; returns the attempt count once it
    /// reaches the no-data threshold
    fn track_empty_passes(&self, player_count: usize) -> Option<u32> {
        if player_count > 0 {
            self.empty_attempts.store(0, Ordering::SeqCst);
            return None;
        }

        let attempts = self.empty_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempts < self.config.max_empty_attempts {
            return None;
        }

        self.engine.write().mark_no_data(attempts);
        warn!(attempts, "No players after repeated passes");
        self.publish(EngineEvent::NoData { attempts });
        Some(attempts)
    }

    fn pipeline(&self, search_limit: usize) -> FilterSortPipeline<'_> {
        let pipeline = FilterSortPipeline::new(self.games.as_ref(), search_limit);
        match self.directory.as_deref() {
            Some(directory) => pipeline.with_directory(directory),
            None => pipeline,
        }
    }

    fn publish(&self, event: EngineEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Coalesce a burst of period changes into the last one
    ///
    /// Waits until no new event has arrived for a full debounce window.
    async fn debounce(&self, first: ScoringPeriod, period_rx: &mut mpsc::Receiver<ScoringPeriod>) -> ScoringPeriod {
        let window = self.config.debounce_window();
        let mut latest = first;
        let mut coalesced = 0usize;

        loop {
            tokio::select! {
                next = period_rx.recv() => match next {
                    Some(period) => {
                        latest = period;
                        coalesced += 1;
                    }
                    None => break,
                },
                _ = sleep(window) => break,
            }
        }

        debug!(%latest, coalesced, "Debounced period change");
        latest
    }

    /// Run the scheduler loop until [`UpdateScheduler::stop`] is called
    pub async fn run(self: Arc<Self>) -> Result<(), SchedulerError> {
        if self.is_running.swap(true, Ordering::SeqCst) {
            return Err(SchedulerError::AlreadyRunning);
        }
        let Some(mut period_rx) = self.period_rx.lock().take() else {
            self.is_running.store(false, Ordering::SeqCst);
            return Err(SchedulerError::AlreadyRunning);
        };

        info!("Starting UpdateScheduler loop");

        if let Err(e) = self.refresh_visible().await {
            log_pass_error("Initial refresh", &e);
        }

        let mut ticker = interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.tick().await;

        // Passes spawned by the loop; none may outlive it
        let mut passes = JoinSet::new();

        loop {
            tokio::select! {
                _ = self.shutdown.notified() => break,
                Some(_) = passes.join_next(), if !passes.is_empty() => {}
                _ = ticker.tick() => {
                    let scheduler = Arc::clone(&self);
                    passes.spawn(async move {
                        if let Err(e) = scheduler.refresh_silent().await {
                            log_pass_error("Background refresh", &e);
                        }
                    });
                }
                received = period_rx.recv() => {
                    let Some(first) = received else { break };
                    let period = self.debounce(first, &mut period_rx).await;
                    info!(%period, "Scoring period changed");

                    let scheduler = Arc::clone(&self);
                    passes.spawn(async move {
                        if let Err(e) = scheduler.change_period(period).await {
                            log_pass_error("Period refresh", &e);
                        }
                    });
                }
            }
        }

        if !passes.is_empty() {
            let generation = self.cancel.cancel();
            debug!(generation, pending = passes.len(), "Cancelling passes started by the loop");
            passes.shutdown().await;
        }

        *self.period_rx.lock() = Some(period_rx);
        self.is_running.store(false, Ordering::SeqCst);
        info!("UpdateScheduler loop stopped");
        Ok(())
    }

    /// Stop the scheduler loop
    pub fn stop(&self) -> Result<(), SchedulerError> {
        if !self.is_running.load(Ordering::SeqCst) {
            return Err(SchedulerError::NotRunning);
        }
        self.shutdown.notify_one();
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// Sender for external "scoring period changed" signals
    pub fn period_sender(&self) -> mpsc::Sender<ScoringPeriod> {
        self.period_tx.clone()
    }

    pub fn current_period(&self) -> ScoringPeriod {
        *self.period.read()
    }

    /// Cancel the in-flight pass, if any
    pub fn cancel_in_flight(&self) -> u64 {
        self.cancel.cancel()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn current_generation(&self) -> u64 {
        self.cancel.current()
    }

    /// Replace the filter state and return the rebuilt view
    pub fn set_filters(&self, filters: FilterState) -> FilteredView {
        let mut engine = self.engine.write();
        let limit = engine.preferences().directory_search_limit;
        let pipeline = self.pipeline(limit);
        engine.set_filters(filters, &pipeline).clone()
    }

    pub fn filters(&self) -> FilterState {
        self.engine.read().filters().clone()
    }

    pub fn view(&self) -> FilteredView {
        self.engine.read().view().clone()
    }

    pub fn canonical(&self) -> Arc<Vec<PlayerSnapshot>> {
        self.engine.read().canonical()
    }

    pub fn status(&self) -> EngineStatus {
        self.engine.read().status()
    }

    pub fn published_stats(&self) -> PublishedStats {
        self.engine.read().published_stats()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.engine.read().last_updated()
    }

    pub fn survival_rankings(&self) -> Arc<Vec<SurvivalRanking>> {
        Arc::clone(&self.rankings.read())
    }

    /// Subscribe to engine events
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Get current metrics
    pub fn get_metrics(&self) -> SchedulerMetrics {
        self.metrics_collector.get_metrics()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }
}

fn log_pass_error(context: &str, error: &SchedulerError) {
    match error {
        SchedulerError::NoData { .. } => warn!("{context}: {error}"),
        e if e.is_soft() => debug!("{context}: {e}"),
        e => error!("{context}: {e}"),
    }
}
