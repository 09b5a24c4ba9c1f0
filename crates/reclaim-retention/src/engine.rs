//! Retention engine: runs a policy's selection and deletes what it picked.

use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

use tracing::{info, warn};

use crate::error::RetentionError;
use crate::policy::Policy;
use crate::select::{Candidate, CandidateKind, select_at};

/// A deletion that failed for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of one [`RetentionEngine::apply`] call.
#[derive(Debug, Clone, Default)]
pub struct Sweep {
    /// Whether this was a dry run.
    pub dry_run: bool,
    /// Entries deleted, or that would have been deleted in a dry run.
    pub affected: Vec<PathBuf>,
    /// Entries whose deletion failed. The rest of the batch still ran.
    pub failures: Vec<EntryFailure>,
}

impl Sweep {
    pub fn is_empty(&self) -> bool {
        self.affected.is_empty() && self.failures.is_empty()
    }
}

/// Applies retention policies to the local filesystem.
///
/// Calls are synchronous and block on filesystem I/O until the whole batch
/// has been processed.
#[derive(Debug, Clone, Default)]
pub struct RetentionEngine;

impl RetentionEngine {
    /// Create a new engine.
    pub fn new() -> Self {
        Self
    }

    /// Select and delete (or, with `dry_run`, only report) the entries
    /// `policy` matches.
    pub fn apply(&self, policy: &Policy, dry_run: bool) -> Result<Sweep, RetentionError> {
        self.apply_at(policy, dry_run, SystemTime::now())
    }

    /// Like [`apply`](Self::apply) with an explicit "now" for the age filter.
    pub fn apply_at(
        &self,
        policy: &Policy,
        dry_run: bool,
        now: SystemTime,
    ) -> Result<Sweep, RetentionError> {
        let candidates = select_at(policy, now)?;

        if candidates.is_empty() {
            info!(
                "No entries matched '{}' under {}",
                policy.pattern,
                policy.root_path.display()
            );
        }

        Ok(execute(candidates, dry_run))
    }
}

/// Delete each candidate in order. A failure is recorded and the batch
/// moves on to the next entry.
fn execute(candidates: Vec<Candidate>, dry_run: bool) -> Sweep {
    let mut sweep = Sweep {
        dry_run,
        ..Default::default()
    };

    for candidate in candidates {
        if dry_run {
            log_dry_run(&candidate);
            sweep.affected.push(candidate.path);
            continue;
        }

        match remove(&candidate) {
            Ok(()) => sweep.affected.push(candidate.path),
            Err(e) => {
                warn!("Failed to delete {}: {}", candidate.path.display(), e);
                sweep.failures.push(EntryFailure {
                    path: candidate.path,
                    reason: e.to_string(),
                });
            }
        }
    }

    sweep
}

fn log_dry_run(candidate: &Candidate) {
    match candidate.kind {
        CandidateKind::File => info!("Would delete file: {}", candidate.path.display()),
        CandidateKind::EmptyDir => {
            info!("Would delete empty directory: {}", candidate.path.display())
        }
    }
}

fn remove(candidate: &Candidate) -> std::io::Result<()> {
    match candidate.kind {
        CandidateKind::File => {
            fs::remove_file(&candidate.path)?;
            info!("Deleted file: {}", candidate.path.display());
        }
        CandidateKind::EmptyDir => {
            // Fails with DirectoryNotEmpty if something appeared since selection.
            fs::remove_dir(&candidate.path)?;
            info!("Deleted empty directory: {}", candidate.path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
