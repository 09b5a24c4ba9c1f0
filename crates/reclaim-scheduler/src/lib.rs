//! # Reclaim Scheduler
//!
//! Runs stored retention tasks on cron schedules.
//!
//! - [`Trigger`] parses schedule expressions.
//! - [`BackgroundScheduler`] owns live jobs and fires them from a tokio task.
//! - [`TaskRunner`] loads a task from the store when its job fires and runs
//!   the retention engine on the blocking pool.
//! - [`ScheduleManager`] keeps jobs and persisted task statuses in step.

mod error;
mod manager;
mod runner;
mod scheduler;
mod trigger;

pub use error::{SchedulerError, TriggerError};
pub use manager::{RunState, ScheduleManager, ScheduledTask};
pub use runner::TaskRunner;
pub use scheduler::{BackgroundScheduler, JobAction, JobInfo, JobScheduler};
pub use trigger::{Trigger, TriggerKind};
