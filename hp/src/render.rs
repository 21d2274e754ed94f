//! Text rendering for plans, saved plans and banners

use std::fmt::Write;
use std::sync::Arc;

use colored::Colorize;

use crate::domain::{Plan, PlanEvent, Task, WeeklyPlan};
use crate::state::{Banner, BannerKind};

fn checkbox(task: &Task) -> String {
    if task.completed {
        "[x]".green().to_string()
    } else {
        "[ ]".to_string()
    }
}

fn render_task(out: &mut String, task: &Task) {
    let _ = writeln!(out, "    {} {} {}", checkbox(task), task.title.bold(), format!("({})", task.id).dimmed());
    if !task.description.is_empty() {
        let _ = writeln!(out, "        {}", task.description);
    }
    if !task.duration.is_empty() {
        let _ = writeln!(out, "        {}", task.duration.dimmed());
    }
}

fn render_week(out: &mut String, week: &WeeklyPlan) {
    let _ = writeln!(out, "  {}  {}", format!("Week {}", week.week).cyan().bold(), week.focus.dimmed());
    for task in &week.tasks {
        render_task(out, task);
    }
}

/// Full plan: header, overview, then every week and task
pub fn render_plan(plan: &Plan) -> String {
    let mut out = String::new();
    let id = if plan.is_assigned() {
        plan.id.clone()
    } else {
        "generating...".to_string()
    };
    let _ = writeln!(out, "{} {}", "Your Personalized Plan".bold(), format!("[{}]", id).dimmed());
    let _ = writeln!(out, "Goal: {}", plan.goal);
    let _ = writeln!(out, "Progress: {}/{} tasks", plan.completed_tasks(), plan.total_tasks());
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", "Overview".bold());
    let _ = writeln!(out, "  {}", plan.overview);
    for week in &plan.weeks {
        let _ = writeln!(out);
        render_week(&mut out, week);
    }
    out
}

/// One progress line for a streamed event, if it has anything to show
pub fn render_event(event: &PlanEvent) -> Option<String> {
    match event {
        PlanEvent::Overview { value } => Some(format!("{} {}", "Overview:".bold(), value)),
        PlanEvent::WeekStart { week, focus } => Some(format!("{}  {}", format!("Week {}", week).cyan().bold(), focus)),
        PlanEvent::Task { task, .. } => Some(format!("    {} {}", "+".green(), task.title)),
        PlanEvent::Done { plan_id } => Some(format!("{} plan {}", "Saved".green().bold(), plan_id)),
        PlanEvent::Error { message } => Some(format!("{} {}", "Error:".red().bold(), message)),
        PlanEvent::Unknown => None,
    }
}

/// Saved plans list, highlighting the selected plan
pub fn render_saved(plans: &[Arc<Plan>], selected: Option<&str>) -> String {
    let mut out = String::new();
    if plans.is_empty() {
        let _ = writeln!(out, "No saved plans");
        return out;
    }
    let _ = writeln!(out, "{}", format!("Saved Plans ({})", plans.len()).bold());
    for plan in plans {
        let marker = if selected == Some(plan.id.as_str()) { ">" } else { " " };
        let date = plan.created_at.split('T').next().unwrap_or_default();
        let _ = write!(out, "{} {}  {}  {}", marker, plan.id.dimmed(), plan.goal, date.dimmed());
        if !plan.weeks.is_empty() {
            let _ = write!(out, "  {}", format!("{} weeks", plan.weeks.len()).dimmed());
        }
        let _ = writeln!(out);
    }
    out
}

pub fn render_banner(banner: &Banner) -> String {
    let label = match banner.kind {
        BannerKind::Transport => "Connection error",
        BannerKind::Server => "Server error",
        BannerKind::Rollback => "Change reverted",
        BannerKind::Delete => "Delete failed",
        BannerKind::Load => "Load failed",
        BannerKind::Input => "Invalid input",
    };
    format!("{} {}", format!("{}:", label).red().bold(), banner.message)
}
