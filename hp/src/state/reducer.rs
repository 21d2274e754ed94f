//! Generation stream reducer
//!
//! `reduce` folds one stream event into the in-progress plan. Snapshots are
//! shared as `Arc<Plan>` and updated copy-on-write, so a snapshot still held
//! by a renderer is never modified.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{Plan, PlanEvent, WeeklyPlan};

/// Apply `event` to `prev`, returning the next snapshot
///
/// With no generation in progress (`None`) every event is a no-op.
pub fn reduce(prev: Option<Arc<Plan>>, event: &PlanEvent) -> Option<Arc<Plan>> {
    let mut plan = prev?;
    debug!(kind = event.kind(), plan_id = %plan.id, "reduce: called");

    match event {
        PlanEvent::Overview { value } => {
            Arc::make_mut(&mut plan).overview = value.clone();
        }
        PlanEvent::WeekStart { week, focus } => {
            if plan.week(*week).is_some() {
                debug!(%week, "reduce: week already declared");
            } else {
                Arc::make_mut(&mut plan).weeks.push(WeeklyPlan::new(*week, focus.clone()));
            }
        }
        PlanEvent::Task { week, task } => {
            let Some(index) = plan.weeks.iter().position(|w| w.week == *week) else {
                warn!(%week, title = %task.title, "reduce: task for undeclared week dropped");
                return Some(plan);
            };
            let target = &mut Arc::make_mut(&mut plan).weeks[index];
            let mut task = task.clone();
            if task.id.is_empty() || target.task(&task.id).is_some() {
                if !task.id.is_empty() {
                    warn!(%week, id = %task.id, "reduce: duplicate task id reassigned");
                }
                task.id = target.next_task_id();
            }
            target.tasks.push(task);
        }
        PlanEvent::Done { plan_id } => {
            if !plan.is_assigned() {
                Arc::make_mut(&mut plan).id = plan_id.clone();
            } else if plan.id != *plan_id {
                warn!(current = %plan.id, ignored = %plan_id, "reduce: plan id already assigned");
            }
        }
        PlanEvent::Error { message } => {
            debug!(%message, "reduce: server error leaves plan unchanged");
        }
        PlanEvent::Unknown => {
            debug!("reduce: unknown event ignored");
        }
    }

    Some(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Task;
    use proptest::prelude::*;

    fn shell() -> Option<Arc<Plan>> {
        Some(Arc::new(Plan::shell("lose weight")))
    }

    fn week_start(week: u32, focus: &str) -> PlanEvent {
        PlanEvent::WeekStart {
            week,
            focus: focus.to_string(),
        }
    }

    fn task(week: u32, title: &str) -> PlanEvent {
        PlanEvent::Task {
            week,
            task: Task::new("", title),
        }
    }

    fn fold(events: &[PlanEvent]) -> Arc<Plan> {
        events
            .iter()
            .fold(shell(), |plan, event| reduce(plan, event))
            .unwrap()
    }

    #[test]
    fn test_none_stays_none() {
        let events = [
            PlanEvent::Overview {
                value: "x".to_string(),
            },
            week_start(1, "A"),
            task(1, "Walk"),
            PlanEvent::Done {
                plan_id: "abc".to_string(),
            },
        ];
        for event in &events {
            assert!(reduce(None, event).is_none());
        }
    }

    #[test]
    fn test_overview_replaces() {
        let plan = fold(&[
            PlanEvent::Overview {
                value: "first".to_string(),
            },
            PlanEvent::Overview {
                value: "second".to_string(),
            },
        ]);
        assert_eq!(plan.overview, "second");
    }

    #[test]
    fn test_repeated_week_start_is_noop() {
        let once = fold(&[week_start(1, "Foundations")]);
        let twice = fold(&[week_start(1, "Foundations"), week_start(1, "Other focus")]);
        assert_eq!(once.weeks, twice.weeks);
        assert_eq!(twice.weeks[0].focus, "Foundations");
    }

    #[test]
    fn test_task_appends_to_named_week_only() {
        let plan = fold(&[
            week_start(1, "A"),
            week_start(2, "B"),
            task(1, "Walk"),
            task(2, "Run"),
            task(1, "Stretch"),
        ]);
        let titles = |i: usize| plan.weeks[i].tasks.iter().map(|t| t.title.clone()).collect::<Vec<_>>();
        assert_eq!(titles(0), vec!["Walk", "Stretch"]);
        assert_eq!(titles(1), vec!["Run"]);
    }

    #[test]
    fn test_task_ids_assigned_and_unique() {
        let plan = fold(&[
            week_start(1, "A"),
            task(1, "Walk"),
            PlanEvent::Task {
                week: 1,
                task: Task::new("w1-t1", "Collides"),
            },
            PlanEvent::Task {
                week: 1,
                task: Task::new("server-id", "Keeps id"),
            },
        ]);
        let ids: Vec<&str> = plan.weeks[0].tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["w1-t1", "w1-t2", "server-id"]);
    }

    #[test]
    fn test_task_for_undeclared_week_dropped() {
        let before = fold(&[week_start(1, "A")]);
        let after = reduce(Some(before.clone()), &task(7, "Orphan")).unwrap();
        assert_eq!(*before, *after);
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_done_sets_id_only() {
        let before = fold(&[
            PlanEvent::Overview {
                value: "o".to_string(),
            },
            week_start(1, "A"),
            task(1, "Walk"),
        ]);
        let after = reduce(
            Some(before.clone()),
            &PlanEvent::Done {
                plan_id: "abc".to_string(),
            },
        )
        .unwrap();
        assert_eq!(after.id, "abc");
        assert_eq!(after.overview, before.overview);
        assert_eq!(after.weeks, before.weeks);
        assert!(before.id.is_empty());
    }

    #[test]
    fn test_assigned_id_is_immutable() {
        let plan = fold(&[
            PlanEvent::Done {
                plan_id: "abc".to_string(),
            },
            PlanEvent::Done {
                plan_id: "other".to_string(),
            },
        ]);
        assert_eq!(plan.id, "abc");
    }

    #[test]
    fn test_error_and_unknown_leave_plan_unchanged() {
        let before = fold(&[week_start(1, "A")]);
        let after = reduce(
            Some(before.clone()),
            &PlanEvent::Error {
                message: "model timeout".to_string(),
            },
        );
        let after = reduce(after, &PlanEvent::Unknown).unwrap();
        assert_eq!(*before, *after);
    }

    #[test]
    fn test_published_snapshot_not_mutated() {
        let published = fold(&[week_start(1, "A"), task(1, "Walk")]);
        let held = published.clone();

        let next = reduce(Some(published), &task(1, "Stretch")).unwrap();
        let next = reduce(Some(next), &week_start(2, "B")).unwrap();

        assert_eq!(held.weeks.len(), 1);
        assert_eq!(held.weeks[0].tasks.len(), 1);
        assert_eq!(next.weeks.len(), 2);
        assert_eq!(next.weeks[0].tasks.len(), 2);
    }

    #[test]
    fn test_example_lose_weight_stream() {
        let plan = fold(&[
            PlanEvent::Overview {
                value: "Gradual, sustainable changes.".to_string(),
            },
            week_start(1, "Foundations"),
            task(1, "Daily walk"),
            task(1, "Track meals"),
            PlanEvent::Done {
                plan_id: "abc".to_string(),
            },
        ]);
        assert_eq!(plan.id, "abc");
        assert_eq!(plan.overview, "Gradual, sustainable changes.");
        assert_eq!(plan.weeks.len(), 1);
        assert_eq!(plan.weeks[0].tasks.len(), 2);
        assert!(plan.weeks[0].tasks.iter().all(|t| !t.completed));
    }

    proptest! {
        #[test]
        fn prop_weeks_are_distinct_in_first_seen_order(weeks in proptest::collection::vec(1u32..20, 0..40)) {
            let events: Vec<PlanEvent> = weeks.iter().map(|w| week_start(*w, "focus")).collect();
            let plan = fold(&events);

            let mut expected: Vec<u32> = Vec::new();
            for w in &weeks {
                if !expected.contains(w) {
                    expected.push(*w);
                }
            }
            let actual: Vec<u32> = plan.weeks.iter().map(|w| w.week).collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
