//! reqwest implementation of PlanApi

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ApiError, ByteStream, PlanApi};
use crate::config::ApiConfig;
use crate::domain::{HealthGoal, Plan, TaskRef};

/// Body of the generation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateRequest<'a> {
    pub goal: &'a str,
    pub current_level: &'a str,
    pub timeline: &'a str,
    pub constraints: &'a str,
}

impl<'a> From<&'a HealthGoal> for GenerateRequest<'a> {
    fn from(goal: &'a HealthGoal) -> Self {
        Self {
            goal: &goal.goal,
            current_level: &goal.current_level,
            timeline: &goal.timeline,
            constraints: &goal.constraints,
        }
    }
}

#[derive(Debug, Serialize)]
struct TaskStatusUpdate {
    completed: bool,
}

/// Saved plans arrive either wrapped as `{ "plan": ... }` or bare
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PlanEnvelope {
    Wrapped { plan: Plan },
    Bare(Plan),
}

impl PlanEnvelope {
    fn into_plan(self) -> Plan {
        match self {
            Self::Wrapped { plan } => plan,
            Self::Bare(plan) => plan,
        }
    }
}

/// HTTP client for the planning service
pub struct HttpPlanClient {
    base_url: String,
    http: Client,
    timeout: Duration,
}

impl HttpPlanClient {
    /// Create a new client from configuration
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        debug!(?config, "from_config: called");
        // No client-wide timeout: it would cut long generation streams short
        let http = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self {
            base_url: config.resolved_base_url(),
            http,
            timeout: Duration::from_millis(config.timeout_ms),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn plan_url(&self, plan_id: &str) -> String {
        self.url(&format!("/api/plans/{}", plan_id))
    }

    fn task_url(&self, plan_id: &str, target: &TaskRef) -> String {
        self.url(&format!(
            "/api/plans/{}/weeks/{}/tasks/{}",
            plan_id, target.week, target.task_id
        ))
    }

    /// Send a non-streaming request with the configured timeout
    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.timeout(self.timeout).send().await?;
        Ok(response)
    }
}

/// Turn a non-2xx response into an error carrying the body text
async fn check_status(response: Response) -> Result<Response, ApiError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    debug!(%status, %message, "check_status: API error");
    Err(ApiError::Status { status, message })
}

#[async_trait]
impl PlanApi for HttpPlanClient {
    async fn open_generation(&self, goal: &HealthGoal) -> Result<ByteStream, ApiError> {
        debug!(goal = %goal.goal, "open_generation: called");
        let url = self.url("/api/plans/generate");

        let response = self
            .http
            .post(&url)
            .header("accept", "text/event-stream")
            .json(&GenerateRequest::from(goal))
            .send()
            .await?;
        let response = check_status(response).await?;

        if response.status() == StatusCode::NO_CONTENT || response.content_length() == Some(0) {
            debug!("open_generation: response has no body");
            return Err(ApiError::NoBody);
        }

        info!(%url, "open_generation: stream opened");
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(|e| ApiError::Stream(e.to_string())));
        Ok(Box::pin(stream))
    }

    async fn list_plans(&self) -> Result<Vec<Plan>, ApiError> {
        debug!("list_plans: called");
        let response = self.send(self.http.get(self.url("/api/plans"))).await?;
        let response = check_status(response).await?;
        let body = response.text().await?;
        let envelopes: Vec<PlanEnvelope> = serde_json::from_str(&body)?;
        debug!(count = envelopes.len(), "list_plans: success");
        Ok(envelopes.into_iter().map(PlanEnvelope::into_plan).collect())
    }

    async fn get_plan(&self, plan_id: &str) -> Result<Plan, ApiError> {
        debug!(%plan_id, "get_plan: called");
        let response = self.send(self.http.get(self.plan_url(plan_id))).await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(%plan_id, "get_plan: not found");
            return Err(ApiError::NotFound(plan_id.to_string()));
        }
        let response = check_status(response).await?;
        let body = response.text().await?;
        let envelope: PlanEnvelope = serde_json::from_str(&body)?;
        Ok(envelope.into_plan())
    }

    async fn delete_plan(&self, plan_id: &str) -> Result<(), ApiError> {
        debug!(%plan_id, "delete_plan: called");
        let response = self.send(self.http.delete(self.plan_url(plan_id))).await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(%plan_id, "delete_plan: already gone");
            return Ok(());
        }
        check_status(response).await?;
        info!(%plan_id, "delete_plan: deleted");
        Ok(())
    }

    async fn update_task(&self, plan_id: &str, target: &TaskRef, completed: bool) -> Result<(), ApiError> {
        debug!(%plan_id, %target, %completed, "update_task: called");
        let request = self
            .http
            .patch(self.task_url(plan_id, target))
            .json(&TaskStatusUpdate { completed });
        let response = self.send(request).await?;
        check_status(response).await?;
        debug!(%plan_id, %target, "update_task: confirmed");
        Ok(())
    }
}
