//! HealthPlan - weekly health plans from the terminal
//!
//! CLI entry point for generating, browsing and updating plans.

use std::fs;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::info;

use healthplan::api::HttpPlanClient;
use healthplan::cli::{Cli, Command, OutputFormat};
use healthplan::config::Config;
use healthplan::domain::{HealthGoal, TaskRef};
use healthplan::render;
use healthplan::state::PlannerSession;

/// `~/.local/share/healthplan/logs/healthplan.log`
fn log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("healthplan")
        .join("logs")
        .join("healthplan.log")
}

/// Log to a file so tracing output never mixes with the rendered plan
///
/// Each command is a short run, so the file is appended to rather than
/// replaced. Connection-pool chatter from the HTTP stack stays at WARN.
fn setup_logging(verbose: bool) -> Result<()> {
    let path = log_path();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).context("Failed to create log directory")?;
    }
    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .context("Failed to open log file")?;

    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper_util=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(filter)
        .init();

    info!(path = %path.display(), %verbose, "setup_logging: initialized");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose).context("Failed to setup logging")?;

    // Load configuration
    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(url) = cli.base_url {
        config.api.base_url = url;
    }
    info!("HealthPlan loaded config: base_url={}", config.api.resolved_base_url());

    let client = HttpPlanClient::from_config(&config.api).context("Failed to create API client")?;
    let session = PlannerSession::new(Arc::new(client));

    // Dispatch command
    match cli.command {
        Some(Command::Generate {
            goal,
            level,
            timeline,
            constraints,
        }) => cmd_generate(&session, HealthGoal::new(goal, level, timeline, constraints)).await,
        Some(Command::List { format }) => cmd_list(&session, format).await,
        Some(Command::Show { plan_id, format }) => cmd_show(&session, &plan_id, format).await,
        Some(Command::Delete { plan_id, yes }) => cmd_delete(&session, &plan_id, yes).await,
        Some(Command::Toggle {
            plan_id,
            week,
            task_id,
            completed,
        }) => cmd_toggle(&session, &plan_id, TaskRef::new(week, task_id), completed).await,
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}

/// Print the session banner, if any, to stderr
fn print_banner(session: &PlannerSession) {
    if let Some(banner) = session.snapshot().banner {
        eprintln!("{}", render::render_banner(&banner));
    }
}

/// Generate a plan, printing each event as it arrives
async fn cmd_generate(session: &PlannerSession, goal: HealthGoal) -> Result<()> {
    println!("{} {}", "Generating plan for:".bold(), goal.goal);
    println!();

    let result = session
        .submit_goal(goal, |event, _| {
            if let Some(line) = render::render_event(event) {
                println!("{}", line);
            }
        })
        .await;

    println!();
    if let Some(plan) = session.current_plan() {
        print!("{}", render::render_plan(&plan));
    }
    print_banner(session);

    result.map(|_| ()).context("Plan generation failed")
}

async fn cmd_list(session: &PlannerSession, format: OutputFormat) -> Result<()> {
    let plans = match session.refresh_saved().await {
        Ok(plans) => plans,
        Err(e) => {
            print_banner(session);
            return Err(e).context("Failed to list plans");
        }
    };

    match format {
        OutputFormat::Json => {
            let plans: Vec<_> = plans.iter().map(|p| p.as_ref()).collect();
            println!("{}", serde_json::to_string_pretty(&plans)?);
        }
        OutputFormat::Text => print!("{}", render::render_saved(&plans, None)),
    }
    Ok(())
}

async fn cmd_show(session: &PlannerSession, plan_id: &str, format: OutputFormat) -> Result<()> {
    let plan = match session.select_plan(plan_id).await {
        Ok(plan) => plan,
        Err(e) => {
            print_banner(session);
            return Err(e).context(format!("Failed to load plan {}", plan_id));
        }
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(plan.as_ref())?),
        OutputFormat::Text => print!("{}", render::render_plan(&plan)),
    }
    Ok(())
}

/// Ask before deleting, like the confirm dialog of the web form
fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

async fn cmd_delete(session: &PlannerSession, plan_id: &str, yes: bool) -> Result<()> {
    if !yes && !confirm(&format!("Are you sure you want to delete plan {}?", plan_id))? {
        println!("Cancelled");
        return Ok(());
    }

    if let Err(e) = session.delete_plan(plan_id).await {
        print_banner(session);
        return Err(e).context(format!("Failed to delete plan {}", plan_id));
    }
    println!("Deleted plan {}", plan_id);
    Ok(())
}

async fn cmd_toggle(session: &PlannerSession, plan_id: &str, target: TaskRef, completed: Option<bool>) -> Result<()> {
    session
        .select_plan(plan_id)
        .await
        .context(format!("Failed to load plan {}", plan_id))?;

    let result = match completed {
        Some(value) => session.set_task_completed(target.clone(), value).await.map(|_| value),
        None => session.toggle_task(target.clone()).await,
    };

    if let Some(plan) = session.current_plan() {
        print!("{}", render::render_plan(&plan));
    }
    print_banner(session);

    let value = result.context(format!("Failed to update {}", target))?;
    println!();
    println!("{} is now {}", target, if value { "complete" } else { "incomplete" });
    Ok(())
}
