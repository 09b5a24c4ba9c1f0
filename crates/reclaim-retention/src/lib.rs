//! # Reclaim Retention
//!
//! Decides which filesystem entries a retention policy selects and deletes
//! them.
//!
//! ## Modes
//!
//! - **Count retention** (`number > 0`): one directory level, keep the
//!   `number` most recently modified matches, optionally combined with an
//!   age threshold.
//! - **General** (`number == 0`): optional recursion, age and size
//!   thresholds, and removal of empty directories.
//!
//! Selection never touches the filesystem beyond reading metadata, so a dry
//! run reports exactly what a real run would delete.

mod engine;
mod error;
mod policy;
mod select;

pub use engine::{EntryFailure, RetentionEngine, Sweep};
pub use error::RetentionError;
pub use policy::{Policy, SelectionMode, BYTES_PER_MIB, SECS_PER_DAY};
pub use select::{Candidate, CandidateKind, select, select_at};
