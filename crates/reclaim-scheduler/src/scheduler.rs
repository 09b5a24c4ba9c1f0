//! Job scheduling.
//!
//! [`JobScheduler`] is the seam [`crate::ScheduleManager`] talks to.
//! [`BackgroundScheduler`] is the shipped implementation: a tokio task that
//! wakes at a fixed tick interval and starts every job whose next fire time
//! has passed.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Local};
use futures::future::BoxFuture;
use parking_lot::RwLock;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use crate::error::SchedulerError;
use crate::trigger::Trigger;

/// The body of a job. Called once per fire.
pub type JobAction = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Point-in-time view of a registered job.
#[derive(Debug, Clone)]
pub struct JobInfo {
    pub id: String,
    pub trigger: String,
    /// `None` while the job is paused.
    pub next_fire: Option<DateTime<Local>>,
}

impl JobInfo {
    pub fn is_paused(&self) -> bool {
        self.next_fire.is_none()
    }
}

/// Registry of live jobs.
///
/// Pausing and removing affect future fires only; a run already in
/// progress is left to finish.
pub trait JobScheduler: Send + Sync {
    /// Register a job, replacing any job with the same id.
    fn add_job(&self, id: &str, trigger: Trigger, action: JobAction);

    fn pause_job(&self, id: &str) -> Result<(), SchedulerError>;

    fn resume_job(&self, id: &str) -> Result<(), SchedulerError>;

    fn remove_job(&self, id: &str) -> Result<(), SchedulerError>;

    fn get_job(&self, id: &str) -> Option<JobInfo>;

    /// All registered jobs, ordered by id.
    fn jobs(&self) -> Vec<JobInfo>;
}

struct ScheduledJob {
    trigger: Trigger,
    action: JobAction,
    next_fire: Option<DateTime<Local>>,
    in_flight: Arc<AtomicBool>,
}

impl ScheduledJob {
    fn info(&self, id: &str) -> JobInfo {
        JobInfo {
            id: id.to_string(),
            trigger: self.trigger.to_string(),
            next_fire: self.next_fire,
        }
    }
}

/// Clears the in-flight flag when a run ends, even by panic.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Tick-driven scheduler running on the tokio runtime.
///
/// Missed fires are coalesced: a job found overdue runs once and its next
/// fire is computed from the current time. A job whose previous run has not
/// finished is not started again; the due fire is dropped.
pub struct BackgroundScheduler {
    jobs: RwLock<HashMap<String, ScheduledJob>>,
    tick_interval: Duration,
    shutdown: watch::Sender<bool>,
}

impl BackgroundScheduler {
    /// Create a scheduler that ticks once per second.
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            jobs: RwLock::new(HashMap::new()),
            tick_interval: Duration::from_secs(1),
            shutdown,
        }
    }

    /// Set the tick interval.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Start the tick loop. Runs until [`shutdown`](Self::shutdown).
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let this = Arc::clone(self);
        let mut shutdown = self.shutdown.subscribe();

        tokio::spawn(async move {
            info!(
                "Scheduler started (tick interval: {:?})",
                this.tick_interval
            );

            let mut interval = time::interval(this.tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        this.tick_at(Local::now());
                    }
                    _ = shutdown.changed() => {
                        info!("Scheduler shutting down");
                        break;
                    }
                }
            }
        })
    }

    /// Stop the tick loop. Runs in progress are not interrupted.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Start every job due at `now`. Returns how many were started.
    pub fn tick_at(&self, now: DateTime<Local>) -> usize {
        let mut due = Vec::new();

        {
            let mut jobs = self.jobs.write();
            let mut finished = Vec::new();

            for (id, job) in jobs.iter_mut() {
                let Some(next_fire) = job.next_fire else {
                    continue;
                };
                if next_fire > now {
                    continue;
                }

                job.next_fire = job.trigger.next_after(now);

                // One-shot jobs are spent once due, even if the fire is absorbed.
                if job.trigger.is_one_shot() {
                    finished.push(id.clone());
                }

                if job.in_flight.load(Ordering::SeqCst) {
                    debug!("Job {} still running, skipping fire due at {}", id, next_fire);
                    continue;
                }

                due.push((id.clone(), job.action.clone(), job.in_flight.clone()));
            }

            for id in finished {
                jobs.remove(&id);
            }
        }

        let started = due.len();
        for (id, action, in_flight) in due {
            in_flight.store(true, Ordering::SeqCst);
            let guard = InFlightGuard(in_flight);
            debug!("Firing job {}", id);
            tokio::spawn(async move {
                let _guard = guard;
                action().await;
            });
        }
        started
    }

    fn with_job<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut ScheduledJob) -> T,
    ) -> Result<T, SchedulerError> {
        let mut jobs = self.jobs.write();
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| SchedulerError::JobNotFound(id.to_string()))?;
        Ok(f(job))
    }
}

impl Default for BackgroundScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl JobScheduler for BackgroundScheduler {
    fn add_job(&self, id: &str, trigger: Trigger, action: JobAction) {
        let next_fire = trigger.first_fire(Local::now());
        debug!("Registered job {} ({}), next fire {:?}", id, trigger, next_fire);

        let job = ScheduledJob {
            trigger,
            action,
            next_fire,
            in_flight: Arc::new(AtomicBool::new(false)),
        };
        self.jobs.write().insert(id.to_string(), job);
    }

    fn pause_job(&self, id: &str) -> Result<(), SchedulerError> {
        self.with_job(id, |job| job.next_fire = None)?;
        info!("Paused job {}", id);
        Ok(())
    }

    fn resume_job(&self, id: &str) -> Result<(), SchedulerError> {
        let next_fire = self.with_job(id, |job| {
            job.next_fire = job.trigger.first_fire(Local::now());
            job.next_fire
        })?;
        info!("Resumed job {}, next fire {:?}", id, next_fire);
        Ok(())
    }

    fn remove_job(&self, id: &str) -> Result<(), SchedulerError> {
        self.jobs
            .write()
            .remove(id)
            .ok_or_else(|| SchedulerError::JobNotFound(id.to_string()))?;
        info!("Removed job {}", id);
        Ok(())
    }

    fn get_job(&self, id: &str) -> Option<JobInfo> {
        self.jobs.read().get(id).map(|job| job.info(id))
    }

    fn jobs(&self) -> Vec<JobInfo> {
        let mut jobs: Vec<JobInfo> = self
            .jobs
            .read()
            .iter()
            .map(|(id, job)| job.info(id))
            .collect();
        jobs.sort_by(|a, b| a.id.cmp(&b.id));
        jobs
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
