use roster_engine::names::is_suffix;
use roster_engine::Position;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Stable identity keys for matching players across platforms
///
/// Platforms disagree on punctuation, casing and suffixes ("D.J. Moore" vs
/// "DJ Moore", "Kenneth Walker III" vs "Kenneth Walker"). Keys are built
/// from a normalized name so those variants collapse to the same value.
pub struct IdentityHasher;

impl IdentityHasher {
    /// Lowercase, strip punctuation, drop generational suffixes
    pub fn normalize_name(name: &str) -> String {
        name.split_whitespace()
            .filter(|token| !is_suffix(token))
            .map(|token| {
                token.chars().filter(|c| c.is_alphanumeric()).flat_map(char::to_lowercase).collect::<String>()
            })
            .filter(|token| !token.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Key over name, team and position
    pub fn identity_key(name: &str, team: &str, position: &Position) -> u64 {
        let composite_key =
            format!("{}|{}|{}", Self::normalize_name(name), team.trim().to_uppercase(), position.as_str());

        let mut hasher = DefaultHasher::new();
        composite_key.hash(&mut hasher);
        hasher.finish()
    }

    /// Key over the normalized name alone
    pub fn name_key(name: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        Self::normalize_name(name).hash(&mut hasher);
        hasher.finish()
    }
}
