//! Task-completion mutations
//!
//! Both helpers report the completion value they replaced so the caller can
//! roll an optimistic write back to exactly what was there before.

use std::sync::Arc;

use tracing::debug;

use crate::domain::{Plan, TaskRef};

/// Set one task's completion in a snapshot, copy-on-write
///
/// Returns the next snapshot and the previous value, or `None` when the
/// task does not exist.
pub fn set_task_completed(plan: &Arc<Plan>, target: &TaskRef, completed: bool) -> Option<(Arc<Plan>, bool)> {
    debug!(plan_id = %plan.id, %target, %completed, "set_task_completed: called");
    let previous = plan.task(target)?.completed;
    if previous == completed {
        return Some((plan.clone(), previous));
    }

    let mut next = plan.clone();
    let task = Arc::make_mut(&mut next)
        .week_mut(target.week)
        .and_then(|w| w.task_mut(&target.task_id))?;
    task.completed = completed;
    Some((next, previous))
}

/// Apply a completion change to the displayed plan and its saved copy
///
/// Only plans whose id equals `plan_id` are touched. Returns the value the
/// displayed plan held before the change (or the saved copy's, when the
/// plan is not displayed); `None` when neither holds the task.
pub fn apply_completion(
    current: &mut Option<Arc<Plan>>,
    saved: &mut [Arc<Plan>],
    plan_id: &str,
    target: &TaskRef,
    completed: bool,
) -> Option<bool> {
    debug!(%plan_id, %target, %completed, "apply_completion: called");
    let mut previous = None;

    if let Some(plan) = current.as_mut().filter(|p| p.id == plan_id)
        && let Some((next, prior)) = set_task_completed(plan, target, completed)
    {
        *plan = next;
        previous = Some(prior);
    }

    if let Some(plan) = saved.iter_mut().find(|p| p.id == plan_id)
        && let Some((next, prior)) = set_task_completed(plan, target, completed)
    {
        *plan = next;
        previous = previous.or(Some(prior));
    }

    debug!(?previous, "apply_completion: applied");
    previous
}
