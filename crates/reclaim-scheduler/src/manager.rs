//! Binds stored tasks to scheduler jobs.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local};
use reclaim_store::{TaskDefinition, TaskStatus, TaskStore};
use tracing::{error, info, warn};

use crate::error::SchedulerError;
use crate::runner::TaskRunner;
use crate::scheduler::JobScheduler;
use crate::trigger::{Trigger, TriggerKind};

/// Whether a listed job will fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Paused,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Running => f.pad("running"),
            RunState::Paused => f.pad("paused"),
        }
    }
}

/// A live job joined with its task's display fields.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub id: String,
    /// Empty when the job has no matching task.
    pub name: String,
    /// Empty when the job has no matching task.
    pub trigger_expr: String,
    pub next_fire: Option<DateTime<Local>>,
    pub state: RunState,
}

/// Keeps scheduler jobs in line with the task store.
///
/// Job ids are task indices rendered as strings.
pub struct ScheduleManager {
    scheduler: Arc<dyn JobScheduler>,
    store: Arc<dyn TaskStore>,
    runner: Arc<TaskRunner>,
}

impl ScheduleManager {
    pub fn new(
        scheduler: Arc<dyn JobScheduler>,
        store: Arc<dyn TaskStore>,
        runner: Arc<TaskRunner>,
    ) -> Self {
        Self {
            scheduler,
            store,
            runner,
        }
    }

    /// Register a cron job for task `index`, replacing any existing job
    /// with that id. Nothing is registered if the expression is invalid.
    pub fn add_job(&self, index: usize, trigger_expr: &str) -> Result<(), SchedulerError> {
        let trigger = Trigger::parse(TriggerKind::Cron, trigger_expr).inspect_err(|e| {
            error!("Invalid schedule for task {}: {}", index, e);
        })?;

        info!("Scheduling task {} with {}", index, trigger);
        self.scheduler
            .add_job(&index.to_string(), trigger, self.runner.job_action(index));
        Ok(())
    }

    pub fn pause_job(&self, id: &str) -> Result<(), SchedulerError> {
        self.scheduler.pause_job(id)
    }

    pub fn resume_job(&self, id: &str) -> Result<(), SchedulerError> {
        self.scheduler.resume_job(id)
    }

    pub fn remove_job(&self, id: &str) -> Result<(), SchedulerError> {
        self.scheduler.remove_job(id)
    }

    /// Live jobs in task order, with names and expressions from the store.
    pub async fn list_jobs(&self) -> Result<Vec<ScheduledTask>, SchedulerError> {
        let tasks = self.store.load().await?;

        let mut listed: Vec<ScheduledTask> = self
            .scheduler
            .jobs()
            .into_iter()
            .map(|job| {
                let task = job.id.parse::<usize>().ok().and_then(|i| tasks.get(i));
                ScheduledTask {
                    name: task.map(|t| t.name.clone()).unwrap_or_default(),
                    trigger_expr: task
                        .and_then(|t| t.trigger_args.clone())
                        .unwrap_or_default(),
                    state: if job.is_paused() {
                        RunState::Paused
                    } else {
                        RunState::Running
                    },
                    next_fire: job.next_fire,
                    id: job.id,
                }
            })
            .collect();

        listed.sort_by_key(|t| (t.id.parse::<usize>().unwrap_or(usize::MAX), t.id.clone()));
        Ok(listed)
    }

    /// Make the scheduler match persisted statuses: active tasks get a
    /// running job, paused tasks a paused job, inactive tasks nothing new.
    ///
    /// Safe to call repeatedly. A task whose expression does not parse is
    /// logged and skipped.
    pub async fn reconcile_at_startup(&self) -> Result<(), SchedulerError> {
        let tasks = self.store.load().await?;
        let mut ensured = 0;

        for (index, task) in tasks.iter().enumerate() {
            if self.ensure_job(index, task)? {
                ensured += 1;
            }
        }

        info!("Reconciled {} scheduled tasks", ensured);
        Ok(())
    }

    /// Ensure the job for one task matches its status. Returns whether the
    /// task has a job afterwards.
    fn ensure_job(&self, index: usize, task: &TaskDefinition) -> Result<bool, SchedulerError> {
        if task.status == TaskStatus::Inactive {
            return Ok(false);
        }

        let id = index.to_string();
        let existing = self.scheduler.get_job(&id);

        if existing.is_none() {
            if let Err(e) = self.add_job(index, trigger_expr(task)) {
                warn!("Task {} ('{}') not scheduled: {}", index, task.name, e);
                return Ok(false);
            }
        }

        match task.status {
            TaskStatus::Active if existing.as_ref().is_some_and(|job| job.is_paused()) => {
                self.scheduler.resume_job(&id)?
            }
            TaskStatus::Paused => self.scheduler.pause_job(&id)?,
            _ => {}
        }
        Ok(true)
    }

    /// Start scheduling task `index` and mark it active.
    pub async fn schedule_task(&self, index: usize) -> Result<(), SchedulerError> {
        let task = self.store.get(index).await?;
        self.add_job(index, trigger_expr(&task))?;
        self.store.set_status(index, TaskStatus::Active).await?;
        Ok(())
    }

    /// Resume the job of task `index` and mark it active.
    pub async fn resume_task(&self, index: usize) -> Result<(), SchedulerError> {
        self.resume_job(&index.to_string())?;
        self.store.set_status(index, TaskStatus::Active).await?;
        Ok(())
    }

    /// Pause the job of task `index` and mark it paused.
    pub async fn pause_task(&self, index: usize) -> Result<(), SchedulerError> {
        self.pause_job(&index.to_string())?;
        self.store.set_status(index, TaskStatus::Paused).await?;
        Ok(())
    }

    /// Remove the job of task `index` and mark it inactive.
    pub async fn unschedule_task(&self, index: usize) -> Result<(), SchedulerError> {
        self.remove_job(&index.to_string())?;
        self.store.set_status(index, TaskStatus::Inactive).await?;
        Ok(())
    }

    /// Replace task `index` and, if it is scheduled, re-register its job so
    /// a changed expression takes effect.
    ///
    /// For a scheduled task the new expression is checked first; if it does
    /// not parse, neither the store nor the job is touched.
    pub async fn edit_task(&self, index: usize, task: TaskDefinition) -> Result<(), SchedulerError> {
        let status = self.store.get(index).await?.status;
        if status != TaskStatus::Inactive {
            Trigger::parse(TriggerKind::Cron, trigger_expr(&task)).inspect_err(|e| {
                error!("Invalid schedule for task {}: {}", index, e);
            })?;
        }

        self.store.replace(index, task).await?;
        if status == TaskStatus::Inactive {
            return Ok(());
        }

        let stored = self.store.get(index).await?;
        self.add_job(index, trigger_expr(&stored))?;
        if status == TaskStatus::Paused {
            self.scheduler.pause_job(&index.to_string())?;
        }
        Ok(())
    }

    /// Delete task `index` and re-key the jobs of the tasks after it so job
    /// ids keep matching store positions.
    pub async fn delete_task(&self, index: usize) -> Result<TaskDefinition, SchedulerError> {
        let removed = self.store.remove(index).await?;

        for job in self.scheduler.jobs() {
            if job.id.parse::<usize>().is_ok_and(|i| i >= index) {
                self.scheduler.remove_job(&job.id)?;
            }
        }

        let tasks = self.store.load().await?;
        for (i, task) in tasks.iter().enumerate().skip(index) {
            self.ensure_job(i, task)?;
        }

        info!("Deleted task {} ('{}')", index, removed.name);
        Ok(removed)
    }
}

fn trigger_expr(task: &TaskDefinition) -> &str {
    task.trigger_args.as_deref().unwrap_or("")
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
