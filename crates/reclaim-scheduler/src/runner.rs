//! Executes stored tasks.

use std::sync::Arc;

use futures::FutureExt;
use reclaim_retention::{RetentionEngine, Sweep};
use reclaim_store::{TaskDefinition, TaskStore};
use tracing::{error, info};

use crate::error::SchedulerError;
use crate::scheduler::JobAction;

/// Runs retention tasks, either by store index or from a definition the
/// caller already holds.
pub struct TaskRunner {
    store: Arc<dyn TaskStore>,
    engine: RetentionEngine,
}

impl TaskRunner {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self {
            store,
            engine: RetentionEngine::new(),
        }
    }

    /// Load task `index` from the store now and run it.
    ///
    /// The definition is read on every call, so edits take effect on the
    /// next fire without re-registering the job.
    pub async fn run_by_index(&self, index: usize, dry_run: bool) -> Result<Sweep, SchedulerError> {
        let task = self.store.get(index).await?;
        self.run_task(&task, dry_run).await
    }

    /// Run `task` to completion on the blocking pool.
    pub async fn run_task(&self, task: &TaskDefinition, dry_run: bool) -> Result<Sweep, SchedulerError> {
        info!(
            "Running task '{}' on {}{}",
            task.name,
            task.root_path.display(),
            if dry_run { " (dry run)" } else { "" }
        );

        let policy = task.policy();
        let engine = self.engine.clone();
        let sweep = tokio::task::spawn_blocking(move || engine.apply(&policy, dry_run))
            .await
            .map_err(|e| SchedulerError::Join(e.to_string()))??;

        info!(
            "Task '{}' finished: {} {}, {} failed",
            task.name,
            sweep.affected.len(),
            if dry_run { "would be deleted" } else { "deleted" },
            sweep.failures.len()
        );
        Ok(sweep)
    }

    /// Job body for task `index`. Captures only the index; the definition
    /// is fetched when the job fires.
    pub fn job_action(self: &Arc<Self>, index: usize) -> JobAction {
        let runner = Arc::clone(self);
        Arc::new(move || {
            let runner = Arc::clone(&runner);
            async move {
                if let Err(e) = runner.run_by_index(index, false).await {
                    error!("Scheduled run of task {} failed: {}", index, e);
                }
            }
            .boxed()
        })
    }
}
