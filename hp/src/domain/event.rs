//! Generation stream events

use serde::{Deserialize, Serialize};

use super::Task;

/// One event frame of the generation stream, discriminated by `type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlanEvent {
    /// Full replacement of the overview text
    Overview { value: String },

    /// Declares a week; repeated declarations are no-ops
    WeekStart { week: u32, focus: String },

    /// Appends one task to a declared week
    Task { week: u32, task: Task },

    /// Generation finished; carries the permanent plan id
    Done { plan_id: String },

    /// Server-reported failure; the stream may continue afterwards
    Error { message: String },

    /// Any type this client does not know about
    #[serde(other)]
    Unknown,
}

impl PlanEvent {
    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Overview { .. } => "overview",
            Self::WeekStart { .. } => "week_start",
            Self::Task { .. } => "task",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
            Self::Unknown => "unknown",
        }
    }
}
