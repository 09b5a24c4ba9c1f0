//! reclaim - scheduled disk-space reclamation.
//!
//! Main entry point for the reclaim CLI and scheduler.

mod cli;
mod cmd_schedule;
mod cmd_task;

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use reclaim_config::{
    Config, ConfigLoader, ConfigValidator, LoggingConfig, ValidationWarning, reclaim_home,
};
use reclaim_scheduler::{BackgroundScheduler, ScheduleManager, TaskRunner};
use reclaim_store::FileTaskStore;

use crate::cli::{Cli, Commands};

/// Shared handles for command handlers.
pub(crate) struct Context {
    pub store: Arc<FileTaskStore>,
    pub scheduler: Arc<BackgroundScheduler>,
    pub runner: Arc<TaskRunner>,
    pub manager: ScheduleManager,
}

impl Context {
    async fn open(config: &Config) -> anyhow::Result<Self> {
        let store = Arc::new(
            FileTaskStore::open(&config.store.path)
                .await
                .with_context(|| format!("Failed to open task store {}", config.store.path.display()))?,
        );
        let scheduler = Arc::new(
            BackgroundScheduler::new()
                .with_tick_interval(Duration::from_millis(config.scheduler.tick_interval_ms)),
        );
        let runner = Arc::new(TaskRunner::new(store.clone()));
        let manager = ScheduleManager::new(scheduler.clone(), store.clone(), runner.clone());

        Ok(Self {
            store,
            scheduler,
            runner,
            manager,
        })
    }
}

fn default_config_path() -> PathBuf {
    reclaim_home().join("reclaim.toml")
}

/// Load and validate the configuration. Warnings are returned so they can
/// be logged once tracing is up.
fn load_config(path: Option<&Path>) -> anyhow::Result<(Config, Vec<ValidationWarning>)> {
    let config = match path {
        Some(path) => ConfigLoader::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ConfigLoader::load_or_default(&default_config_path())?,
    };

    let warnings = ConfigValidator::validate(&config).into_result()?;
    Ok((config, warnings))
}

/// Initialize tracing with console and daily rolling file output.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    std::fs::create_dir_all(&logging.dir)
        .with_context(|| format!("Failed to create log directory {}", logging.dir.display()))?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("reclaim")
        .filename_suffix("log")
        .max_log_files(logging.max_files)
        .build(&logging.dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Held for the life of the process so buffered lines are flushed.
    static GUARD: OnceLock<WorkerGuard> = OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(true)
                .with_writer(std::io::stderr),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, warnings) = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging)?;
    for warning in warnings {
        warn!("Config {}: {}", warning.path, warning.message);
    }

    let ctx = Context::open(&config).await?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(&ctx).await,
        Commands::Task { action } => cmd_task::handle_task_command(&ctx, action).await,
        Commands::Schedule { action } => {
            cmd_schedule::handle_schedule_command(&ctx, action).await
        }
        Commands::Autostart { state } => cmd_task::handle_autostart_command(&ctx, state).await,
    }
}

/// Rebuild jobs from the store and run them until Ctrl-C.
async fn run(ctx: &Context) -> anyhow::Result<()> {
    ctx.manager.reconcile_at_startup().await?;
    let handle = ctx.scheduler.start();

    info!(
        "reclaim running with {} scheduled tasks (store: {})",
        ctx.manager.list_jobs().await?.len(),
        ctx.store.path().display()
    );

    tokio::signal::ctrl_c().await?;
    info!("Interrupt received, stopping scheduler");

    ctx.scheduler.shutdown();
    handle.await?;
    Ok(())
}
