//! Task definition, status, and the persisted document.

use std::fmt;
use std::path::PathBuf;

use reclaim_retention::Policy;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Scheduler linkage of a task.
///
/// Persisted as an integer: 0 inactive, 1 active, 2 paused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TaskStatus {
    /// No scheduler job.
    #[default]
    Inactive,
    /// Job registered and firing.
    Active,
    /// Job registered but paused.
    Paused,
}

impl TryFrom<u8> for TaskStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TaskStatus::Inactive),
            1 => Ok(TaskStatus::Active),
            2 => Ok(TaskStatus::Paused),
            other => Err(format!("unknown task status {}", other)),
        }
    }
}

impl From<TaskStatus> for u8 {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Inactive => 0,
            TaskStatus::Active => 1,
            TaskStatus::Paused => 2,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Inactive => f.pad("inactive"),
            TaskStatus::Active => f.pad("active"),
            TaskStatus::Paused => f.pad("paused"),
        }
    }
}

fn default_pattern() -> String {
    "*".to_string()
}

/// A named retention rule over a directory.
///
/// Tasks are addressed by their position in the store; that index is also
/// the scheduler job id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Display label, not required to be unique.
    pub name: String,
    /// Base directory to scan.
    pub root_path: PathBuf,
    #[serde(default = "default_pattern")]
    pub pattern: String,
    #[serde(default)]
    pub recursive: bool,
    /// Age threshold in whole days, 0 disables.
    #[serde(default)]
    pub days: u64,
    /// Size threshold in MiB, 0 disables.
    #[serde(default)]
    pub size: u64,
    /// Number of newest matches to keep, 0 disables.
    #[serde(default)]
    pub number: usize,
    #[serde(default)]
    pub empty_dir: bool,
    /// Six-field cron expression.
    #[serde(default)]
    pub trigger_args: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
}

impl TaskDefinition {
    /// Create an inactive task matching everything under `root_path`.
    pub fn new(name: impl Into<String>, root_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root_path: root_path.into(),
            pattern: default_pattern(),
            recursive: false,
            days: 0,
            size: 0,
            number: 0,
            empty_dir: false,
            trigger_args: None,
            status: TaskStatus::Inactive,
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_days(mut self, days: u64) -> Self {
        self.days = days;
        self
    }

    pub fn with_size(mut self, size_mib: u64) -> Self {
        self.size = size_mib;
        self
    }

    pub fn with_number(mut self, number: usize) -> Self {
        self.number = number;
        self
    }

    pub fn with_empty_dir(mut self, empty_dir: bool) -> Self {
        self.empty_dir = empty_dir;
        self
    }

    pub fn with_trigger(mut self, trigger_args: impl Into<String>) -> Self {
        self.trigger_args = Some(trigger_args.into());
        self
    }

    /// The retention policy this task applies.
    pub fn policy(&self) -> Policy {
        Policy::new(&self.root_path)
            .with_pattern(self.pattern.clone())
            .with_recursive(self.recursive)
            .with_days(self.days)
            .with_size(self.size)
            .with_number(self.number)
            .with_empty_dir(self.empty_dir)
    }
}

/// Columns shown by task listings when the document does not name any.
pub const DEFAULT_COLUMNS: [&str; 9] = [
    "name",
    "root_path",
    "pattern",
    "recursive",
    "days",
    "size",
    "number",
    "trigger_args",
    "status",
];

fn default_columns() -> Vec<String> {
    DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect()
}

/// The whole persisted structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default)]
    pub auto_start: bool,
    #[serde(default = "default_columns")]
    pub show_task_col: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<TaskDefinition>,
}

impl Default for StoreDocument {
    fn default() -> Self {
        Self {
            auto_start: false,
            show_task_col: default_columns(),
            tasks: Vec::new(),
        }
    }
}

impl StoreDocument {
    fn check_index(&self, index: usize) -> Result<(), StoreError> {
        if index < self.tasks.len() {
            Ok(())
        } else {
            Err(StoreError::IndexOutOfRange {
                index,
                len: self.tasks.len(),
            })
        }
    }

    pub fn get(&self, index: usize) -> Result<&TaskDefinition, StoreError> {
        self.check_index(index)?;
        Ok(&self.tasks[index])
    }

    /// Append `task` as inactive and return its index.
    pub fn add(&mut self, mut task: TaskDefinition) -> usize {
        task.status = TaskStatus::Inactive;
        self.tasks.push(task);
        self.tasks.len() - 1
    }

    /// Overwrite the fields of task `index`, keeping its current status.
    pub fn replace(&mut self, index: usize, mut task: TaskDefinition) -> Result<(), StoreError> {
        self.check_index(index)?;
        task.status = self.tasks[index].status;
        self.tasks[index] = task;
        Ok(())
    }

    /// Remove task `index`; later tasks move down by one.
    pub fn remove(&mut self, index: usize) -> Result<TaskDefinition, StoreError> {
        self.check_index(index)?;
        Ok(self.tasks.remove(index))
    }

    pub fn set_status(&mut self, index: usize, status: TaskStatus) -> Result<(), StoreError> {
        self.check_index(index)?;
        self.tasks[index].status = status;
        Ok(())
    }
}
