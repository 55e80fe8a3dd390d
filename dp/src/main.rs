//! dp - day planner CLI
//!
//! Manages tasks and generates time-of-day plans from the local store.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use dayplanner::cli::{Cli, Command, OutputFormat, TaskCommand, generate_after_help, get_log_path};
use dayplanner::config::Config;
use dayplanner::domain::{Citation, GeneratedPlan, Task, TaskDraft, TimeSlot, UserProfile};
use dayplanner::planner::PlannerService;
use dayplanner::store::FileStore;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Config is needed for the help footer, so load it from the raw args first
    let early_config = early_config_path();
    let help_config = Config::load(early_config.as_ref()).unwrap_or_default();
    let cmd = Cli::command().after_help(generate_after_help(&help_config));
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(store = %config.storage.path.display(), model = %config.llm.model, "dp loaded config");

    let store = FileStore::open(&config.storage.path)
        .with_context(|| format!("Failed to open store at {}", config.storage.path.display()))?;
    let service = PlannerService::from_config(&config, Arc::new(store));

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Task { command } => match command {
            TaskCommand::Add {
                title,
                category,
                mood,
                slot,
            } => cmd_task_add(&service, title, category, mood, slot),
            TaskCommand::List { format } => cmd_task_list(&service, format),
            TaskCommand::Rm { id } => cmd_task_rm(&service, &id),
        },
        Command::Plan { tasks, from, format } => cmd_plan(&service, tasks, from.as_deref(), format).await,
        Command::Shift { task_id, slot } => cmd_shift(&service, &task_id, slot),
        Command::Sources { format } => cmd_sources(&service, format),
        Command::Distrust { citation_id } => cmd_distrust(&service, &citation_id),
        Command::Profile { format } => cmd_profile(&service, format),
    }
}

/// Find `-c/--config` in the raw args without running the full parser
fn early_config_path() -> Option<PathBuf> {
    let args: Vec<String> = std::env::args().collect();
    args.iter().enumerate().find_map(|(i, arg)| {
        if arg == "-c" || arg == "--config" {
            args.get(i + 1).map(PathBuf::from)
        } else {
            arg.strip_prefix("--config=").map(PathBuf::from)
        }
    })
}

fn cmd_task_add(
    service: &PlannerService,
    title: String,
    category: String,
    mood: String,
    slot: Option<TimeSlot>,
) -> Result<()> {
    debug!(%title, "cmd_task_add: called");
    let mut draft = TaskDraft::new(title, category, mood);
    draft.preferred_slot = slot;
    let task = service.create_task(draft)?;
    println!("{} {}", "Created".green(), task.id.bold());
    Ok(())
}

fn cmd_task_list(service: &PlannerService, format: OutputFormat) -> Result<()> {
    debug!(?format, "cmd_task_list: called");
    let tasks = service.list_tasks(None)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tasks)?),
        OutputFormat::Text => {
            if tasks.is_empty() {
                println!("No tasks. Add one with: dp task add <title>");
            }
            for task in &tasks {
                print_task(task);
            }
        }
    }
    Ok(())
}

fn print_task(task: &Task) {
    let slot = task
        .preferred_slot
        .map(|s| format!(" -> {}", s).cyan().to_string())
        .unwrap_or_default();
    let category = if task.category.is_empty() {
        String::new()
    } else {
        format!(" [{}]", task.category)
    };
    println!("{}  {}{}{}", task.id.dimmed(), task.title.bold(), category, slot);
}

fn cmd_task_rm(service: &PlannerService, id: &str) -> Result<()> {
    debug!(%id, "cmd_task_rm: called");
    service.delete_task(id)?;
    println!("{} {}", "Deleted".yellow(), id);
    Ok(())
}

async fn cmd_plan(service: &PlannerService, ids: Vec<String>, from: Option<&Path>, format: OutputFormat) -> Result<()> {
    debug!(?ids, ?from, ?format, "cmd_plan: called");
    let plan = match from {
        Some(path) => {
            let content =
                fs::read_to_string(path).with_context(|| format!("Failed to read drafts from {}", path.display()))?;
            let drafts: Vec<TaskDraft> =
                serde_yaml::from_str(&content).with_context(|| format!("Failed to parse drafts in {}", path.display()))?;
            service.generate_for_request(drafts).await?
        }
        None if ids.is_empty() => service.generate_plan(None).await?,
        None => service.generate_plan(Some(ids.as_slice())).await?,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
        OutputFormat::Text => print_plan(&plan),
    }
    Ok(())
}

fn print_plan(plan: &GeneratedPlan) {
    if let Some(message) = &plan.error_message {
        println!("{} {}", "Plan failed:".red().bold(), message);
        return;
    }
    if plan.is_empty() {
        println!("Nothing to plan. Add tasks with: dp task add <title>");
        return;
    }

    for slot in TimeSlot::ALL {
        let entries = plan.slot(slot);
        println!("{}", capitalize(slot.as_str()).bold().underline());
        if entries.is_empty() {
            println!("  {}", "(free)".dimmed());
        }
        for entry in entries {
            println!("  {} {}", "\u{2022}".cyan(), entry.task_title.bold());
            println!("    {}", entry.justification);
        }
        println!();
    }

    if !plan.citations.is_empty() {
        println!("{}", "Sources".bold().underline());
        for citation in &plan.citations {
            print_citation(citation);
        }
    }
}

fn print_citation(citation: &Citation) {
    let flag = if citation.trusted {
        String::new()
    } else {
        format!(" {}", "(untrusted)".red())
    };
    println!("  {}  {}{}", citation.id.dimmed(), citation.title, flag);
    println!("      {}", citation.url.blue());
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn cmd_shift(service: &PlannerService, task_id: &str, slot: TimeSlot) -> Result<()> {
    debug!(%task_id, %slot, "cmd_shift: called");
    let record = service.shift_task(task_id, slot)?;
    let from = record.from.map(|s| s.to_string()).unwrap_or_else(|| "unplanned".to_string());
    println!("{} {}: {} -> {}", "Shifted".green(), task_id.bold(), from, record.to.to_string().cyan());
    Ok(())
}

fn cmd_sources(service: &PlannerService, format: OutputFormat) -> Result<()> {
    debug!(?format, "cmd_sources: called");
    let citations = service.citations()?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&citations)?),
        OutputFormat::Text => {
            if citations.is_empty() {
                println!("No sources yet. Generate a plan first.");
            }
            for citation in &citations {
                print_citation(citation);
            }
        }
    }
    Ok(())
}

fn cmd_distrust(service: &PlannerService, citation_id: &str) -> Result<()> {
    debug!(%citation_id, "cmd_distrust: called");
    if service.distrust_citation(citation_id)? {
        println!("{} {}", "Distrusted".yellow(), citation_id);
    } else {
        println!(
            "{} {} (not in the store, will be flagged if it appears)",
            "Distrusted".yellow(),
            citation_id
        );
    }
    Ok(())
}

fn cmd_profile(service: &PlannerService, format: OutputFormat) -> Result<()> {
    debug!(?format, "cmd_profile: called");
    let profile = service.profile()?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&profile)?),
        OutputFormat::Text => print_profile(&profile),
    }
    Ok(())
}

fn print_profile(profile: &UserProfile) {
    let chronotype = profile
        .chronotype
        .map(|c| c.to_string())
        .unwrap_or_else(|| "undetermined".to_string());
    println!("{} {}", "Chronotype:".bold(), chronotype);
    println!(
        "{} {} morning, {} midday, {} evening",
        "Shifts:".bold(),
        profile.count_shifts_to(TimeSlot::Morning),
        profile.count_shifts_to(TimeSlot::Midday),
        profile.count_shifts_to(TimeSlot::Evening)
    );
    for (task_id, history) in &profile.shift_history {
        println!("  {}  {}", task_id.dimmed(), history.join(" -> "));
    }
    if !profile.distrusted.is_empty() {
        println!("{}", "Distrusted:".bold());
        for key in &profile.distrusted {
            println!("  {}", key.red());
        }
    }
}
