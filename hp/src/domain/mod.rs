//! Domain types for HealthPlan
//!
//! - HealthGoal: the user's submission
//! - Plan / WeeklyPlan / Task: the document the generation stream builds
//! - PlanEvent: one decoded frame of the generation stream

mod event;
mod goal;
mod plan;

pub use event::PlanEvent;
pub use goal::HealthGoal;
pub use plan::{Plan, Task, TaskRef, WeeklyPlan};
