//! Survival Ranker
//!
//! Ranks survival-format leagues, where every team plays the same weekly
//! pool and the lowest score is eliminated. Produces elimination status,
//! survival probability and safety margin per team, and keeps an
//! append-only ledger of eliminations per league.

pub mod calculator;
pub mod config;
pub mod error;
pub mod models;
pub mod ranker;

pub use calculator::SurvivalCalculator;
pub use config::{DramaThresholds, RankerConfig};
pub use error::RankerError;
pub use models::*;
pub use ranker::SurvivalRanker;
