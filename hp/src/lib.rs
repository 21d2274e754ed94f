//! HealthPlan - streaming weekly health plans from the terminal
//!
//! HealthPlan submits a health goal to a remote planning service and
//! renders the weekly task plan as it streams back. Task completion is
//! updated optimistically and rolled back if the service rejects it.
//!
//! # Core Concepts
//!
//! - **Incremental decoding**: the generation body is framed into events as
//!   bytes arrive, whatever the chunk boundaries
//! - **Pure reduction**: each event folds into a new plan snapshot; earlier
//!   snapshots are never modified
//! - **Single owner**: one session holds the only mutable view state
//!
//! # Modules
//!
//! - [`api`] - Planning service client and stream decoder
//! - [`domain`] - Goals, plans, weeks, tasks and stream events
//! - [`state`] - Reducer, task mutations and the planner session
//! - [`render`] - Text rendering
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod render;
pub mod state;

// Re-export commonly used types
pub use api::{ApiError, HttpPlanClient, PlanApi, SseDecoder, consume_stream};
pub use config::{ApiConfig, Config};
pub use domain::{HealthGoal, Plan, PlanEvent, Task, TaskRef, WeeklyPlan};
pub use state::{Banner, BannerKind, PlannerSession, ViewState, reduce};
