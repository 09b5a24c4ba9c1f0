//! Retention errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop a whole retention run.
///
/// Failures on individual entries are not errors; they are collected into
/// [`crate::Sweep::failures`].
#[derive(Debug, Error)]
pub enum RetentionError {
    /// The policy root is missing or is not a directory.
    #[error("Root directory not found: {0}")]
    RootNotFound(PathBuf),

    /// The name pattern is not a valid glob.
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}
