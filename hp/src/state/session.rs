//! PlannerSession - coordinator that owns the view state
//!
//! All view state lives in one `watch` cell. Every change goes through
//! `send_modify`, replacing snapshots rather than editing them, and
//! renderers observe through `subscribe()`. Methods take `&self` so a task
//! confirmation can be awaited without blocking other actions.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::mutation::apply_completion;
use super::reducer::reduce;
use crate::api::{ApiError, PlanApi, consume_stream};
use crate::domain::{HealthGoal, Plan, PlanEvent, TaskRef};

/// Category of a user-visible failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    /// Connection failed or dropped
    Transport,
    /// The service reported an error mid-stream
    Server,
    /// A task change was not confirmed and has been reverted
    Rollback,
    /// Deleting a plan failed
    Delete,
    /// Loading plans failed
    Load,
    /// The submission was rejected before sending
    Input,
}

/// Dismissible message shown above the plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
}

impl Banner {
    pub fn new(kind: BannerKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Everything the view renders
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    /// Plan being generated or displayed
    pub current_plan: Option<Arc<Plan>>,
    /// Saved plans, shared with `current_plan` when the same plan is shown
    pub saved_plans: Vec<Arc<Plan>>,
    pub banner: Option<Banner>,
    /// True while a generation stream is open
    pub generating: bool,
}

/// Ends a generation however `submit_goal` exits, including when its
/// future is dropped mid-stream
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
    state: &'a watch::Sender<ViewState>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        // View first, so a new submission cannot be marked idle by this guard
        self.state
            .send_if_modified(|s| std::mem::replace(&mut s.generating, false));
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Coordinates the planning service and the view state
pub struct PlannerSession {
    api: Arc<dyn PlanApi>,
    state: watch::Sender<ViewState>,
    in_flight: AtomicBool,
}

impl PlannerSession {
    pub fn new(api: Arc<dyn PlanApi>) -> Self {
        debug!("PlannerSession::new: called");
        let (state, _) = watch::channel(ViewState::default());
        Self {
            api,
            state,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Receive every new view snapshot
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    /// Copy of the current view state
    pub fn snapshot(&self) -> ViewState {
        self.state.borrow().clone()
    }

    pub fn current_plan(&self) -> Option<Arc<Plan>> {
        self.state.borrow().current_plan.clone()
    }

    pub fn is_generating(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn show_banner(&self, kind: BannerKind, message: impl Into<String>) {
        let banner = Banner::new(kind, message);
        debug!(?banner, "show_banner: called");
        self.state.send_modify(|s| s.banner = Some(banner));
    }

    pub fn dismiss_banner(&self) {
        debug!("dismiss_banner: called");
        self.state.send_if_modified(|s| s.banner.take().is_some());
    }

    /// Generate a plan for `goal`, folding each streamed event into the view
    ///
    /// `observer` sees every event together with the snapshot it produced.
    /// Fails with `ApiError::Busy` while another generation is running. On
    /// transport failure the partial plan stays displayed and the error is
    /// returned.
    pub async fn submit_goal<F>(&self, goal: HealthGoal, mut observer: F) -> Result<Arc<Plan>, ApiError>
    where
        F: FnMut(&PlanEvent, &ViewState),
    {
        debug!(goal = %goal.goal, "submit_goal: called");
        if let Err(e) = goal.validate() {
            self.show_banner(BannerKind::Input, e.to_string());
            return Err(e);
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!(goal = %goal.goal, "submit_goal: generation already in progress");
            return Err(ApiError::Busy);
        }
        let _guard = InFlightGuard {
            flag: &self.in_flight,
            state: &self.state,
        };

        let shell = Arc::new(Plan::shell(goal.goal.clone()));
        self.state.send_modify(|s| {
            s.current_plan = Some(shell);
            s.banner = None;
            s.generating = true;
        });

        let stream = match self.api.open_generation(&goal).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "submit_goal: failed to open stream");
                self.state.send_modify(|s| {
                    s.banner = Some(Banner::new(BannerKind::Transport, format!("Failed to generate plan: {}", e)));
                    s.generating = false;
                });
                return Err(e);
            }
        };

        let outcome = consume_stream(stream, |event| {
            self.state.send_modify(|s| {
                s.current_plan = reduce(s.current_plan.take(), &event);
                if let PlanEvent::Error { message } = &event {
                    s.banner = Some(Banner::new(BannerKind::Server, message.clone()));
                }
            });
            let snapshot = self.snapshot();
            observer(&event, &snapshot);
        })
        .await;

        self.state.send_modify(|s| {
            s.generating = false;
            if let Err(e) = &outcome {
                s.banner = Some(Banner::new(
                    BannerKind::Transport,
                    format!("Connection lost, showing partial plan: {}", e),
                ));
            }
        });

        let plan = self.current_plan().ok_or(ApiError::NotFound("generated plan".to_string()))?;
        // Once `done` has arrived the plan is saved, even if the connection dropped after it
        if plan.is_assigned() {
            self.refresh_after_completion(&plan.id).await;
        }
        match outcome {
            Ok(summary) => {
                info!(plan_id = %plan.id, ?summary, "submit_goal: generation finished");
                Ok(self.current_plan().unwrap_or(plan))
            }
            Err(e) => Err(e),
        }
    }

    /// Re-fetch saved plans and show the saved copy of the finished plan
    ///
    /// The saved copy carries the task ids the service issued. It comes from
    /// the saved-plans list, or from the plan itself when the list fails or
    /// does not include it yet. If neither is available the streamed
    /// snapshot stays displayed.
    async fn refresh_after_completion(&self, plan_id: &str) {
        debug!(%plan_id, "refresh_after_completion: called");
        let listed = match self.api.list_plans().await {
            Ok(plans) => {
                let saved: Vec<Arc<Plan>> = plans.into_iter().map(Arc::new).collect();
                let fresh = saved.iter().find(|p| p.id == plan_id).cloned();
                self.state.send_modify(|s| s.saved_plans = saved);
                fresh
            }
            Err(e) => {
                warn!(error = %e, "refresh_after_completion: could not refresh saved plans");
                self.state.send_modify(|s| {
                    if s.banner.is_none() {
                        s.banner = Some(Banner::new(BannerKind::Load, format!("Failed to load saved plans: {}", e)));
                    }
                });
                None
            }
        };

        let fresh = match listed {
            Some(plan) => plan,
            None => match self.api.get_plan(plan_id).await {
                Ok(plan) => {
                    debug!(%plan_id, "refresh_after_completion: fetched saved copy");
                    Arc::new(plan)
                }
                Err(e) => {
                    warn!(%plan_id, error = %e, "refresh_after_completion: keeping streamed task ids");
                    return;
                }
            },
        };

        self.state.send_modify(|s| {
            if s.current_plan.as_ref().is_some_and(|p| p.id == plan_id) {
                debug!(%plan_id, "refresh_after_completion: showing saved copy");
                s.current_plan = Some(fresh);
            }
        });
    }

    /// Replace the saved-plans collection from the service
    pub async fn refresh_saved(&self) -> Result<Vec<Arc<Plan>>, ApiError> {
        debug!("refresh_saved: called");
        match self.api.list_plans().await {
            Ok(plans) => {
                let saved: Vec<Arc<Plan>> = plans.into_iter().map(Arc::new).collect();
                debug!(count = saved.len(), "refresh_saved: loaded");
                self.state.send_modify(|s| s.saved_plans = saved.clone());
                Ok(saved)
            }
            Err(e) => {
                warn!(error = %e, "refresh_saved: failed");
                self.show_banner(BannerKind::Load, format!("Failed to load saved plans: {}", e));
                Err(e)
            }
        }
    }

    /// Display a saved plan, fetching it when it is not in the list
    pub async fn select_plan(&self, plan_id: &str) -> Result<Arc<Plan>, ApiError> {
        debug!(%plan_id, "select_plan: called");
        if self.is_generating() {
            return Err(ApiError::Busy);
        }

        let listed = self
            .state
            .borrow()
            .saved_plans
            .iter()
            .find(|p| p.id == plan_id)
            .cloned();
        let plan = match listed {
            Some(plan) => plan,
            None => match self.api.get_plan(plan_id).await {
                Ok(plan) => Arc::new(plan),
                Err(e) => {
                    warn!(%plan_id, error = %e, "select_plan: fetch failed");
                    self.show_banner(BannerKind::Load, format!("Failed to load plan: {}", e));
                    return Err(e);
                }
            },
        };

        self.state.send_modify(|s| {
            s.current_plan = Some(plan.clone());
            s.banner = None;
        });
        Ok(plan)
    }

    /// Clear the displayed plan to start over
    pub fn new_plan(&self) -> Result<(), ApiError> {
        debug!("new_plan: called");
        if self.is_generating() {
            return Err(ApiError::Busy);
        }
        self.state.send_modify(|s| {
            s.current_plan = None;
            s.banner = None;
        });
        Ok(())
    }

    /// Delete a saved plan; on failure the list is left unchanged
    pub async fn delete_plan(&self, plan_id: &str) -> Result<(), ApiError> {
        debug!(%plan_id, "delete_plan: called");
        if let Err(e) = self.api.delete_plan(plan_id).await {
            warn!(%plan_id, error = %e, "delete_plan: failed");
            self.show_banner(BannerKind::Delete, format!("Failed to delete plan: {}", e));
            return Err(e);
        }

        self.state.send_modify(|s| {
            s.saved_plans.retain(|p| p.id != plan_id);
            if s.current_plan.as_ref().is_some_and(|p| p.id == plan_id) {
                s.current_plan = None;
            }
        });
        info!(%plan_id, "delete_plan: removed");
        Ok(())
    }

    /// Optimistically set a task's completion on the displayed plan
    ///
    /// The change is visible immediately, then confirmed with the service.
    /// If confirmation fails the value held before this call is restored
    /// and a banner is shown. Overlapping calls on the same task are not
    /// coordinated; the last write wins.
    pub async fn set_task_completed(&self, target: TaskRef, completed: bool) -> Result<(), ApiError> {
        debug!(%target, %completed, "set_task_completed: called");
        let plan_id = self.displayed_plan_id()?;

        let mut previous = None;
        self.state.send_modify(|s| {
            previous = apply_completion(&mut s.current_plan, &mut s.saved_plans, &plan_id, &target, completed);
        });
        let Some(previous) = previous else {
            debug!(%target, "set_task_completed: task not found");
            return Err(ApiError::NotFound(format!("{} in plan {}", target, plan_id)));
        };

        match self.api.update_task(&plan_id, &target, completed).await {
            Ok(()) => {
                debug!(%plan_id, %target, "set_task_completed: confirmed");
                Ok(())
            }
            Err(e) => {
                warn!(%plan_id, %target, error = %e, "set_task_completed: rolling back");
                self.state.send_modify(|s| {
                    apply_completion(&mut s.current_plan, &mut s.saved_plans, &plan_id, &target, previous);
                    s.banner = Some(Banner::new(BannerKind::Rollback, format!("Failed to update task: {}", e)));
                });
                Err(e)
            }
        }
    }

    /// Flip a task's completion; returns the new value
    pub async fn toggle_task(&self, target: TaskRef) -> Result<bool, ApiError> {
        debug!(%target, "toggle_task: called");
        let current = self
            .current_plan()
            .and_then(|p| p.task(&target).map(|t| t.completed))
            .ok_or_else(|| ApiError::NotFound(target.to_string()))?;
        self.set_task_completed(target, !current).await?;
        Ok(!current)
    }

    fn displayed_plan_id(&self) -> Result<String, ApiError> {
        let state = self.state.borrow();
        match &state.current_plan {
            Some(plan) if plan.is_assigned() => Ok(plan.id.clone()),
            Some(_) => Err(ApiError::InvalidInput("plan is still being generated".to_string())),
            None => Err(ApiError::InvalidInput("no plan selected".to_string())),
        }
    }
}
