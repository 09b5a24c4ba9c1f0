//! CLI definitions for reclaim.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// reclaim CLI.
#[derive(Parser)]
#[command(name = "reclaim")]
#[command(about = "Scheduled disk-space reclamation driven by file retention policies")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: ~/.reclaim/reclaim.toml)
    #[arg(short, long, global = true, env = "RECLAIM_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the scheduler in the foreground (default)
    Run,

    /// Task management commands
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Scheduled job commands
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },

    /// Show or set the start-with-session flag
    Autostart {
        /// New value; omit to print the current one
        state: Option<Toggle>,
    },
}

#[derive(Subcommand)]
pub(crate) enum TaskAction {
    /// List all tasks
    List,

    /// Show one task
    Show {
        /// Task index
        index: usize,
    },

    /// Add a task
    Add(NewTask),

    /// Edit a task; omitted fields keep their value
    Edit {
        /// Task index
        index: usize,

        #[command(flatten)]
        changes: TaskChanges,
    },

    /// Remove a task and re-key the scheduled tasks after it
    Remove {
        /// Task index
        index: usize,
    },

    /// Run a task now
    Exec {
        /// Task index
        index: usize,

        /// Only report what would be deleted
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Args)]
pub(crate) struct NewTask {
    /// Task name
    #[arg(long)]
    pub name: String,

    /// Directory to clean
    #[arg(long)]
    pub root: PathBuf,

    /// Glob matched against entry names
    #[arg(long, default_value = "*")]
    pub pattern: String,

    /// Scan subdirectories
    #[arg(long)]
    pub recursive: bool,

    /// Only delete files older than this many days
    #[arg(long, default_value_t = 0)]
    pub days: u64,

    /// Only delete files of at least this many MiB
    #[arg(long, default_value_t = 0)]
    pub size: u64,

    /// Keep this many of the newest matches
    #[arg(long, default_value_t = 0)]
    pub number: usize,

    /// Also remove empty directories
    #[arg(long)]
    pub empty_dir: bool,

    /// Six-field cron expression, e.g. "0 0 3 * * *"
    #[arg(long)]
    pub trigger: Option<String>,
}

#[derive(Args)]
pub(crate) struct TaskChanges {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub root: Option<PathBuf>,

    #[arg(long)]
    pub pattern: Option<String>,

    #[arg(long)]
    pub recursive: Option<bool>,

    #[arg(long)]
    pub days: Option<u64>,

    #[arg(long)]
    pub size: Option<u64>,

    #[arg(long)]
    pub number: Option<usize>,

    #[arg(long)]
    pub empty_dir: Option<bool>,

    #[arg(long)]
    pub trigger: Option<String>,
}

#[derive(Subcommand)]
pub(crate) enum ScheduleAction {
    /// List scheduled jobs
    List,

    /// Start scheduling a task
    Start {
        /// Task index
        index: usize,
    },

    /// Pause a scheduled task
    Pause {
        /// Task index
        index: usize,
    },

    /// Resume a paused task
    Resume {
        /// Task index
        index: usize,
    },

    /// Stop scheduling a task
    Stop {
        /// Task index
        index: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum Toggle {
    On,
    Off,
}
