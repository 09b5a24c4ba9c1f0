//! # Reclaim Store
//!
//! Persistent, ordered task definitions. A task's position in the store is
//! its identity and doubles as its scheduler job id.
//!
//! The on-disk format is a single JSON document:
//!
//! ```json
//! {
//!   "auto_start": false,
//!   "show_task_col": ["name", "root_path", "pattern", "..."],
//!   "tasks": [{ "name": "logs", "root_path": "/var/log/app", "days": 7, "status": 0 }]
//! }
//! ```

mod definition;
mod error;
mod store;

pub use definition::{DEFAULT_COLUMNS, StoreDocument, TaskDefinition, TaskStatus};
pub use error::StoreError;
pub use store::{FileTaskStore, MemoryTaskStore, TaskStore};
