//! Score distribution statistics
//!
//! Every pass (and every filtered bucket) gets a freshly computed
//! [`DistributionStats`]; percentages and tiers are always derived from the
//! instance of the same pass, never patched incrementally.

use crate::types::{PerformanceTier, PlayerSnapshot};
use serde::{Deserialize, Serialize};

/// A distribution is treated as skewed when the top score exceeds this
/// multiple of the median
pub const SKEW_FACTOR: f64 = 3.0;

/// How percentage-of-top is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalingMode {
    /// `score / top`
    Linear,
    /// `ln(max(score, 1)) / ln(max(top, 1))`, compressing outliers
    Adaptive,
}

/// Tier cutoffs taken from the descending score list
///
/// `elite` is the score at index `count/4`, `good` at `count/2` and
/// `average` at `3*count/4`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuartileThresholds {
    pub elite: f64,
    pub good: f64,
    pub average: f64,
}

impl Default for QuartileThresholds {
    fn default() -> Self {
        Self { elite: 0.0, good: 0.0, average: 0.0 }
    }
}

/// Score distribution for one pass or one filtered bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionStats {
    /// Scores sorted high to low
    pub sorted_scores: Vec<f64>,
    pub top_score: f64,
    pub median: f64,
    /// Top score minus lowest score
    pub score_range: f64,
    pub quartiles: QuartileThresholds,
    pub scaling_mode: ScalingMode,
}

impl Default for DistributionStats {
    fn default() -> Self {
        Self::compute(Vec::new())
    }
}

impl DistributionStats {
    /// Compute the distribution for an arbitrary list of scores
    pub fn compute(mut scores: Vec<f64>) -> Self {
        scores.sort_by(|a, b| b.total_cmp(a));
        Self::from_descending(scores)
    }

    /// Compute the distribution from the scores of a snapshot list
    pub fn from_snapshots(snapshots: &[PlayerSnapshot]) -> Self {
        Self::compute(snapshots.iter().map(|snapshot| snapshot.score).collect())
    }

    /// Compute the distribution from scores already sorted high to low
    pub fn from_descending(sorted_scores: Vec<f64>) -> Self {
        let count = sorted_scores.len();
        if count == 0 {
            return Self {
                sorted_scores,
                top_score: 1.0,
                median: 0.0,
                score_range: 0.0,
                quartiles: QuartileThresholds::default(),
                scaling_mode: ScalingMode::Linear,
            };
        }

        let top_score = sorted_scores[0];
        let lowest = sorted_scores[count - 1];
        let median = if count % 2 == 0 {
            (sorted_scores[count / 2 - 1] + sorted_scores[count / 2]) / 2.0
        } else {
            sorted_scores[count / 2]
        };

        let at = |index: usize| sorted_scores[index.min(count - 1)];
        let quartiles =
            QuartileThresholds { elite: at(count / 4), good: at(count / 2), average: at(3 * count / 4) };

        let scaling_mode =
            if top_score > SKEW_FACTOR * median { ScalingMode::Adaptive } else { ScalingMode::Linear };

        Self { top_score, median, score_range: top_score - lowest, quartiles, scaling_mode, sorted_scores }
    }

    pub fn count(&self) -> usize {
        self.sorted_scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted_scores.is_empty()
    }

    /// Percentage of the top score, in [0, 1]
    pub fn percentage_of_top(&self, score: f64) -> f64 {
        let raw = match self.scaling_mode {
            ScalingMode::Linear => {
                if self.top_score <= 0.0 {
                    return 0.0;
                }
                score / self.top_score
            }
            ScalingMode::Adaptive => {
                let denominator = self.top_score.max(1.0).ln();
                if denominator <= 0.0 {
                    return 0.0;
                }
                score.max(1.0).ln() / denominator
            }
        };

        if raw.is_finite() {
            raw.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Quartile tier of a score
    pub fn tier(&self, score: f64) -> PerformanceTier {
        if self.is_empty() {
            return PerformanceTier::Struggling;
        }

        if score >= self.quartiles.elite {
            PerformanceTier::Elite
        } else if score >= self.quartiles.good {
            PerformanceTier::Good
        } else if score >= self.quartiles.average {
            PerformanceTier::Average
        } else {
            PerformanceTier::Struggling
        }
    }

    /// Stamp percentage and tier from this distribution onto each snapshot
    pub fn apply(&self, snapshots: Vec<PlayerSnapshot>) -> Vec<PlayerSnapshot> {
        snapshots
            .into_iter()
            .map(|mut snapshot| {
                snapshot.percentage_of_top = self.percentage_of_top(snapshot.score);
                snapshot.tier = self.tier(snapshot.score);
                snapshot
            })
            .collect()
    }
}
