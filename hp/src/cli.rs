//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// HealthPlan - turn a health goal into a weekly task plan
#[derive(Parser)]
#[command(
    name = "hp",
    about = "Break down your health goals into actionable weekly steps",
    version = env!("CARGO_PKG_VERSION"),
    after_help = "Logs are written to: ~/.local/share/healthplan/logs/healthplan.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Planning service base URL (overrides config and environment)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Generate a new plan, streaming it as it is written
    Generate {
        /// What's your health goal?
        #[arg(short, long)]
        goal: String,

        /// Current fitness level
        #[arg(short, long)]
        level: String,

        /// Timeline, e.g. "3 months"
        #[arg(short, long)]
        timeline: String,

        /// Any constraints (optional)
        #[arg(long, default_value = "")]
        constraints: String,
    },

    /// List saved plans
    List {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a saved plan
    Show {
        plan_id: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a saved plan
    Delete {
        plan_id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Mark a task complete or incomplete
    Toggle {
        plan_id: String,

        /// Week number
        week: u32,

        /// Task id within the week
        task_id: String,

        /// Set an explicit value instead of flipping
        #[arg(long)]
        completed: Option<bool>,
    },
}

/// Output format for list/show commands
#[derive(Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
