use crate::error::RankerError;
use serde::{Deserialize, Serialize};

/// Configuration for the survival ranker
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankerConfig {
    /// Weekly scoring variance; widens uncertainty with weeks remaining
    pub variance: f64,

    /// Weight of rank position in the weekly safety estimate
    pub rank_weight: f64,

    /// Weight of projection-vs-average in the weekly safety estimate
    pub projection_weight: f64,

    /// Fraction of the field (from the bottom) flagged as warning
    pub warning_band: f64,

    /// Drama thresholds on the elimination margin, in points
    pub drama: DramaThresholds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DramaThresholds {
    /// At or below this margin the bottom two were tied
    pub tie_epsilon: f64,

    /// Margins under this are high drama
    pub high: f64,

    /// Margins under this are moderate drama
    pub moderate: f64,
}

impl Default for DramaThresholds {
    fn default() -> Self {
        Self { tie_epsilon: 0.01, high: 2.0, moderate: 10.0 }
    }
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            variance: 0.15,
            rank_weight: 0.6,
            projection_weight: 0.4,
            warning_band: 0.25,
            drama: DramaThresholds::default(),
        }
    }
}

impl RankerConfig {
    pub fn validate(&self) -> Result<(), RankerError> {
        if !(0.0..=1.0).contains(&self.variance) {
            return Err(RankerError::InvalidConfig(format!("variance must be in [0, 1], got {}", self.variance)));
        }
        if (self.rank_weight + self.projection_weight - 1.0).abs() > 1e-6 {
            return Err(RankerError::InvalidConfig("rank_weight and projection_weight must sum to 1".to_string()));
        }
        if self.rank_weight < 0.0 || self.projection_weight < 0.0 {
            return Err(RankerError::InvalidConfig("weights must not be negative".to_string()));
        }
        if !(0.0..=1.0).contains(&self.warning_band) {
            return Err(RankerError::InvalidConfig("warning_band must be in [0, 1]".to_string()));
        }
        let drama = &self.drama;
        if !(drama.tie_epsilon <= drama.high && drama.high <= drama.moderate) {
            return Err(RankerError::InvalidConfig("drama thresholds must be ascending".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(RankerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let config = RankerConfig { rank_weight: 0.7, ..Default::default() };
        assert!(matches!(config.validate(), Err(RankerError::InvalidConfig(_))));
    }

    #[test]
    fn test_drama_thresholds_must_ascend() {
        let config = RankerConfig {
            drama: DramaThresholds { tie_epsilon: 0.01, high: 12.0, moderate: 10.0 },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
