//! Plan, WeeklyPlan and Task domain types
//!
//! A Plan is the multi-week document produced by one goal submission. Its
//! id stays empty while generation is in progress and is assigned once by
//! the `done` stream event.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A single actionable task within a week
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique within the parent week. The generation stream may omit it.
    #[serde(default)]
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Free-text duration label ("30 mins")
    #[serde(default)]
    pub duration: String,

    #[serde(default)]
    pub completed: bool,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            duration: String::new(),
            completed: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = duration.into();
        self
    }
}

/// One week of a plan: a focus area and its tasks in arrival order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyPlan {
    /// Week number, unique within a plan
    pub week: u32,

    pub focus: String,

    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl WeeklyPlan {
    pub fn new(week: u32, focus: impl Into<String>) -> Self {
        Self {
            week,
            focus: focus.into(),
            tasks: Vec::new(),
        }
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }

    /// Next locally generated task id not already taken in this week
    ///
    /// Ids take the form `w{week}-t{n}` where n starts at the 1-based
    /// position the task will occupy.
    pub fn next_task_id(&self) -> String {
        let mut n = self.tasks.len() + 1;
        loop {
            let candidate = format!("w{}-t{}", self.week, n);
            if self.task(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }
}

/// The full multi-week output of one goal submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Empty until the service assigns it on stream completion
    #[serde(default)]
    pub id: String,

    pub goal: String,

    #[serde(default)]
    pub overview: String,

    /// Weeks in arrival order
    #[serde(default)]
    pub weeks: Vec<WeeklyPlan>,

    /// ISO-8601 creation timestamp
    #[serde(default, alias = "createdAt")]
    pub created_at: String,
}

impl Plan {
    /// Empty shell displayed while a generation is in progress
    pub fn shell(goal: impl Into<String>) -> Self {
        let goal = goal.into();
        debug!(%goal, "Plan::shell: called");
        Self {
            id: String::new(),
            goal,
            overview: String::new(),
            weeks: Vec::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Whether the service has assigned this plan's permanent id
    pub fn is_assigned(&self) -> bool {
        !self.id.is_empty()
    }

    pub fn week(&self, week: u32) -> Option<&WeeklyPlan> {
        self.weeks.iter().find(|w| w.week == week)
    }

    pub fn week_mut(&mut self, week: u32) -> Option<&mut WeeklyPlan> {
        self.weeks.iter_mut().find(|w| w.week == week)
    }

    pub fn task(&self, target: &TaskRef) -> Option<&Task> {
        self.week(target.week).and_then(|w| w.task(&target.task_id))
    }

    pub fn total_tasks(&self) -> usize {
        self.weeks.iter().map(|w| w.tasks.len()).sum()
    }

    pub fn completed_tasks(&self) -> usize {
        self.weeks
            .iter()
            .flat_map(|w| w.tasks.iter())
            .filter(|t| t.completed)
            .count()
    }
}

/// Address of a task within a plan
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskRef {
    pub week: u32,
    pub task_id: String,
}

impl TaskRef {
    pub fn new(week: u32, task_id: impl Into<String>) -> Self {
        Self {
            week,
            task_id: task_id.into(),
        }
    }
}

impl std::fmt::Display for TaskRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "week {} task {}", self.week, self.task_id)
    }
}
