//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::config::Config;
use crate::domain::TimeSlot;

/// dp - time-of-day day planner
#[derive(Parser)]
#[command(
    name = "dp",
    about = "Place tasks into morning, midday and evening slots",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage tasks
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },

    /// Generate a plan for the day
    Plan {
        /// Only plan these task ids
        #[arg(short, long = "task", value_name = "ID")]
        tasks: Vec<String>,

        /// YAML list of task drafts, used when no tasks are stored yet
        #[arg(short, long, value_name = "FILE", conflicts_with = "tasks")]
        from: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Move a task to a slot by hand
    Shift {
        /// Task id
        task_id: String,

        /// Target slot (morning, midday, evening)
        slot: TimeSlot,
    },

    /// List stored citations
    Sources {
        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Stop trusting a citation
    Distrust {
        /// Citation id
        citation_id: String,
    },

    /// Show the planning profile
    Profile {
        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Task management subcommands
#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    /// Add a task
    Add {
        /// Task title
        title: String,

        /// Category, also used to refine article search
        #[arg(short = 'k', long, default_value = "")]
        category: String,

        /// Mood tag
        #[arg(short, long, default_value = "")]
        mood: String,

        /// Preferred slot (morning, midday, evening)
        #[arg(short, long)]
        slot: Option<TimeSlot>,
    },

    /// List tasks
    List {
        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a task (its shift history is kept)
    Rm {
        /// Task id
        id: String,
    },
}

/// Output format for listing commands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text, json", s)),
        }
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dayplanner")
        .join("logs")
        .join("dayplanner.log")
}

/// Help footer showing whether the ranking service is configured and where logs go
pub fn generate_after_help(config: &Config) -> String {
    debug!("generate_after_help: called");
    let mut help = String::new();

    help.push_str("Ranking service:\n");
    if config.llm.api_key().is_some() {
        help.push_str(&format!("  \u{2705} {} via {}\n", config.llm.model, config.llm.base_url));
    } else {
        help.push_str(&format!(
            "  \u{274C} {} not set (degraded mode: every task lands in midday)\n",
            config.llm.api_key_env
        ));
    }

    help.push('\n');
    help.push_str(&format!("Store: {}\n", config.storage.path.display()));
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));
    help
}
