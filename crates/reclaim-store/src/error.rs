//! Store errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The store file exists but is not a valid task document.
    #[error("Task store {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize task store: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Task index {index} out of range ({len} tasks)")]
    IndexOutOfRange { index: usize, len: usize },
}
