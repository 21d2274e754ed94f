//! HealthGoal domain type

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::ApiError;

/// What the user wants to achieve, as submitted to the generation endpoint
///
/// Serializes with the wire field names the service expects
/// (`goal`, `current_level`, `timeline`, `constraints`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthGoal {
    /// Free-text goal, e.g. "lose weight"
    pub goal: String,

    /// Current fitness level, e.g. "beginner"
    #[serde(alias = "currentLevel")]
    pub current_level: String,

    /// Desired timeline, e.g. "3 months"
    pub timeline: String,

    /// Optional limitations ("no gym access"); empty when none
    #[serde(default)]
    pub constraints: String,
}

impl HealthGoal {
    pub fn new(
        goal: impl Into<String>,
        current_level: impl Into<String>,
        timeline: impl Into<String>,
        constraints: impl Into<String>,
    ) -> Self {
        Self {
            goal: goal.into(),
            current_level: current_level.into(),
            timeline: timeline.into(),
            constraints: constraints.into(),
        }
    }

    /// Reject submissions missing a required field
    pub fn validate(&self) -> Result<(), ApiError> {
        debug!(goal = %self.goal, "HealthGoal::validate: called");
        let required = [
            ("goal", &self.goal),
            ("current level", &self.current_level),
            ("timeline", &self.timeline),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                debug!(%name, "HealthGoal::validate: missing field");
                return Err(ApiError::InvalidInput(format!("{} is required", name)));
            }
        }
        Ok(())
    }
}
