//! Router/classifier configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Configuration for the intent router
#[derive(Debug, Clone, Deserialize)]
pub struct RoutingConfig {
    /// Minimum classification confidence before falling back.
    ///
    /// The classification capability reports a confidence in [0, 1]; outcomes
    /// below this value route to the fallback intent instead of the reported
    /// one.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Number of recent turns included in the classification context
    #[serde(default = "default_recent_turns")]
    pub recent_turns: usize,
}

impl RoutingConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ValidationError::InvalidConfidenceThreshold);
        }
        if self.recent_turns == 0 {
            return Err(ValidationError::InvalidRecentTurns);
        }
        Ok(())
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            recent_turns: default_recent_turns(),
        }
    }
}

fn default_confidence_threshold() -> f32 {
    0.4
}

fn default_recent_turns() -> usize {
    3
}
