//! PlanApi trait definition

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use super::ApiError;
use crate::domain::{HealthGoal, Plan, TaskRef};

/// Raw body chunks of a generation response, in arrival order
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, ApiError>> + Send>>;

/// The remote planning service, as seen by the session
///
/// Generation is split in two: `open_generation` issues the request and
/// hands back the body stream, and `sse::consume_stream` decodes it. That
/// lets callers tell a failure before any bytes arrive from a failure
/// mid-stream.
#[async_trait]
pub trait PlanApi: Send + Sync {
    /// Start generating a plan for `goal`
    async fn open_generation(&self, goal: &HealthGoal) -> Result<ByteStream, ApiError>;

    /// All saved plans
    async fn list_plans(&self) -> Result<Vec<Plan>, ApiError>;

    /// A single saved plan
    async fn get_plan(&self, plan_id: &str) -> Result<Plan, ApiError>;

    /// Delete a saved plan. Deleting a missing plan succeeds.
    async fn delete_plan(&self, plan_id: &str) -> Result<(), ApiError>;

    /// Confirm a task's completion state with the service
    async fn update_task(&self, plan_id: &str, target: &TaskRef, completed: bool) -> Result<(), ApiError>;
}
