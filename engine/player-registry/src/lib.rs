//! Player Registry - the canonical player directory
//!
//! Resolves platform-specific player ids to canonical records, matches
//! players across platforms by normalized identity, and serves
//! full-directory search for the roster view.

pub mod hashing;
pub mod registry;
pub mod types;

pub use registry::PlayerRegistry;
pub use types::{DirectoryError, DirectoryFile, DirectoryRecord};
