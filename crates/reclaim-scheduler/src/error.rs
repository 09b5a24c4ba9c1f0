//! Scheduler errors.

use thiserror::Error;

use reclaim_retention::RetentionError;
use reclaim_store::StoreError;

/// A trigger expression that could not be parsed.
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error(
        "Expected 6 cron fields (second minute hour day month weekday), found {found} in '{expr}'"
    )]
    FieldCount { expr: String, found: usize },

    #[error("Invalid cron expression '{expr}': {source}")]
    Cron {
        expr: String,
        #[source]
        source: cron::error::Error,
    },

    #[error("Invalid day of week '{0}': expected 0-6 (Monday-Sunday) or day names")]
    DayOfWeek(String),

    #[error("Invalid interval '{0}': expected a positive number of seconds")]
    Interval(String),

    #[error("Invalid date '{0}': expected RFC 3339, 'YYYY-MM-DD HH:MM:SS' or 'YYYY-MM-DD'")]
    Date(String),

    #[error("Unknown trigger kind: {0}")]
    UnknownKind(String),
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error(transparent)]
    Trigger(#[from] TriggerError),

    #[error("Task store error: {0}")]
    Store(#[from] StoreError),

    #[error("Retention run failed: {0}")]
    Retention(#[from] RetentionError),

    #[error("Retention run aborted: {0}")]
    Join(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_count_display() {
        let err = TriggerError::FieldCount {
            expr: "0 0 * *".to_string(),
            found: 4,
        };
        let display = err.to_string();
        assert!(display.contains("found 4"));
        assert!(display.contains("0 0 * *"));
    }

    #[test]
    fn test_job_not_found_display() {
        let err = SchedulerError::JobNotFound("7".to_string());
        assert_eq!(err.to_string(), "Job not found: 7");
    }

    #[test]
    fn test_trigger_error_is_transparent() {
        let err = SchedulerError::from(TriggerError::UnknownKind("weekly".to_string()));
        assert_eq!(err.to_string(), "Unknown trigger kind: weekly");
    }
}
