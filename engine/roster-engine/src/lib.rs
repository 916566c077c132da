//! # RosterEngine
//!
//! Aggregates the user's starters across every connected fantasy league into
//! one canonical list, reconciles live scores against the previous pass, and
//! derives score distributions, performance tiers and filtered views.
//!
//! Everything in this crate is synchronous and free of I/O. Fetching,
//! scheduling and publication live in `update-scheduler`.

pub mod config;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod filter;
pub mod names;
pub mod position;
pub mod reconciler;
pub mod sort;
pub mod sources;
pub mod statistics;
pub mod types;

pub use config::{Preferences, DEFAULT_DIRECTORY_SEARCH_LIMIT};
pub use engine::{CommitReport, EngineStatus, PreparedPass, PublishedStats, RosterEngine, UpdateMode};
pub use error::{EngineError, SourceFetchError};
pub use extractor::{ExtractionFlags, Extractor};
pub use filter::{
    FilterOutcome, FilterSortPipeline, FilterState, FilteredView, PositionFilter, SearchMode, SearchQuery,
};
pub use position::Position;
pub use reconciler::{PriorSnapshots, ACTIVITY_THRESHOLD};
pub use sort::SortMethod;
pub use sources::{DirectoryPlayer, GameStatusLookup, PlayerDirectoryLookup, StaticGameStatus};
pub use statistics::{DistributionStats, QuartileThresholds, ScalingMode, SKEW_FACTOR};
pub use types::*;

/// Current version of the RosterEngine
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
