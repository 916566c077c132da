//! Service state management and component initialization

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::ServiceConfig;
use crate::fixture::FixtureSource;
use player_registry::PlayerRegistry;
use roster_engine::{FilteredView, StaticGameStatus};
use survival_ranker::SurvivalRanker;
use update_scheduler::{EngineEvent, ScoringPeriod, UpdateScheduler};

/// Service state containing all initialized components
pub struct ServiceState {
    /// Service configuration
    pub config: ServiceConfig,

    /// UpdateScheduler instance driving the roster engine
    pub scheduler: Arc<UpdateScheduler>,

    /// PlayerRegistry instance, when a directory file is configured
    pub player_registry: Option<Arc<PlayerRegistry>>,

    /// SurvivalRanker instance
    pub ranker: Arc<SurvivalRanker>,

    /// Service running state
    pub is_running: Arc<RwLock<bool>>,
}

impl ServiceState {
    /// Create a new service state with all components initialized
    pub async fn new(config: ServiceConfig) -> Result<Self> {
        info!("Initializing service components...");

        let data_dir = &config.service.data_dir;
        if !data_dir.exists() {
            std::fs::create_dir_all(data_dir).with_context(|| format!("Failed to create data directory {data_dir:?}"))?;
        }

        let player_registry = match &config.source.directory_file {
            Some(path) => {
                info!("Initializing PlayerRegistry...");
                let mut registry = PlayerRegistry::new();
                let loaded = registry
                    .load_from_file(path)
                    .await
                    .with_context(|| format!("Failed to load player directory {path:?}"))?;
                info!("PlayerRegistry loaded with {} players", loaded);
                Some(Arc::new(registry))
            }
            None => {
                warn!("No player directory configured, enrichment and full-directory search are disabled");
                None
            }
        };

        info!("Initializing SurvivalRanker...");
        let ranker = Arc::new(SurvivalRanker::new(config.ranker.clone()).context("Failed to create SurvivalRanker")?);

        info!("Initializing league source...");
        let source = FixtureSource::from_settings(data_dir, &config.source)?;
        if source.leagues().is_empty() {
            warn!("No leagues configured; every pass will be empty");
        }

        let games = StaticGameStatus::new(&config.source.live_teams);
        let initial_period = ScoringPeriod::new(config.service.season, config.service.initial_period);

        info!("Initializing UpdateScheduler...");
        let mut scheduler = UpdateScheduler::new(
            config.scheduler.clone(),
            config.preferences.clone(),
            Arc::new(source),
            Arc::new(games),
            initial_period,
        )
        .context("Failed to create UpdateScheduler")?
        .with_ranker(Arc::clone(&ranker));
        if let Some(registry) = &player_registry {
            scheduler = scheduler.with_directory(Arc::clone(registry) as Arc<_>);
        }

        info!("Service components initialized successfully");
        Ok(Self {
            config,
            scheduler: Arc::new(scheduler),
            player_registry,
            ranker,
            is_running: Arc::new(RwLock::new(false)),
        })
    }

    /// Run the scheduler loop until it is stopped
    pub async fn start_scheduler(&self) -> Result<()> {
        *self.is_running.write().await = true;
        let result = Arc::clone(&self.scheduler).run().await.context("UpdateScheduler loop failed");
        *self.is_running.write().await = false;
        result
    }

    pub async fn stop_scheduler(&self) -> Result<()> {
        self.scheduler.stop().context("Failed to stop UpdateScheduler")
    }

    /// Forward engine events to the log
    pub fn spawn_event_logger(&self) -> JoinHandle<()> {
        let mut events = self.scheduler.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => log_event(&event),
                    Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event logger fell behind"),
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    /// Run a single visible pass and return the resulting view
    pub async fn refresh_once(&self) -> Result<FilteredView> {
        let report = self.scheduler.refresh_visible().await.context("Refresh failed")?;
        info!(generation = report.generation, players = report.player_count, "Refresh complete");
        Ok(self.scheduler.view())
    }

    /// Shutdown all components
    pub async fn shutdown(&self) -> Result<()> {
        info!("Shutting down service components...");

        let metrics = self.scheduler.get_metrics();
        match serde_json::to_string(&metrics) {
            Ok(json) => info!(metrics = %json, "Final scheduler metrics"),
            Err(e) => error!("Failed to serialize scheduler metrics: {}", e),
        }

        *self.is_running.write().await = false;
        info!("Service components shutdown complete");
        Ok(())
    }
}

fn log_event(event: &EngineEvent) {
    match event {
        EngineEvent::LoadingStarted { generation } => debug!(generation, "Loading"),
        EngineEvent::VisibleUpdate { generation, player_count, stats, filters_reset } => info!(
            generation,
            player_count,
            top_score = stats.top_score,
            median = stats.median,
            filters_reset,
            "Roster view rebuilt"
        ),
        EngineEvent::SilentUpdate { generation, player_count, stats } => {
            debug!(generation, player_count, stats_changed = stats.is_some(), "Roster view refreshed")
        }
        EngineEvent::SurvivalUpdated { generation, rankings } => {
            for ranking in rankings.iter() {
                match ranking.user_standing() {
                    Some(standing) => info!(
                        generation,
                        league_id = %ranking.league_id,
                        rank = standing.rank,
                        status = ?standing.status,
                        safety = standing.safety_percentage,
                        "Survival standing"
                    ),
                    None => debug!(generation, league_id = %ranking.league_id, "User no longer alive in survival league"),
                }
            }
        }
        EngineEvent::PassAborted { generation, reason } => warn!(generation, ?reason, "Pass aborted"),
        EngineEvent::NoData { attempts } => warn!(attempts, "No roster data available"),
    }
}
