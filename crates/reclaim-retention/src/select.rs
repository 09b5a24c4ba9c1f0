//! Candidate selection.
//!
//! Walks the policy root once, reads metadata, and decides which entries a
//! policy would delete. Nothing here modifies the filesystem.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use glob::{MatchOptions, Pattern};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::RetentionError;
use crate::policy::{Policy, SECS_PER_DAY, SelectionMode};

/// What kind of entry a candidate is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    File,
    EmptyDir,
}

/// An entry selected for deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub kind: CandidateKind,
}

/// A matched entry and the metadata selection needs.
#[derive(Debug, Clone)]
struct Entry {
    path: PathBuf,
    is_file: bool,
    is_dir: bool,
    len: u64,
    modified: SystemTime,
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Select the entries `policy` would delete right now.
pub fn select(policy: &Policy) -> Result<Vec<Candidate>, RetentionError> {
    select_at(policy, SystemTime::now())
}

/// Select the entries `policy` would delete at time `now`.
pub fn select_at(policy: &Policy, now: SystemTime) -> Result<Vec<Candidate>, RetentionError> {
    if !policy.root_path.is_dir() {
        return Err(RetentionError::RootNotFound(policy.root_path.clone()));
    }

    let pattern = Pattern::new(&policy.pattern).map_err(|source| RetentionError::InvalidPattern {
        pattern: policy.pattern.clone(),
        source,
    })?;

    match policy.mode() {
        SelectionMode::CountRetention => {
            let entries = enumerate(&policy.root_path, &pattern, false);
            Ok(select_by_count(entries, policy.number, policy.days, now))
        }
        SelectionMode::General => {
            let entries = enumerate(&policy.root_path, &pattern, policy.recursive);
            Ok(select_general(entries, policy, now))
        }
    }
}

/// Age of an entry in whole days, truncated. Modification times in the
/// future count as age zero.
fn age_in_days(modified: SystemTime, now: SystemTime) -> u64 {
    now.duration_since(modified)
        .map(|d| d.as_secs() / SECS_PER_DAY)
        .unwrap_or(0)
}

fn pattern_matches(pattern: &Pattern, root: &Path, path: &Path) -> bool {
    if pattern.as_str().contains(['/', std::path::MAIN_SEPARATOR]) {
        match path.strip_prefix(root) {
            Ok(relative) => pattern.matches_path_with(relative, MATCH_OPTIONS),
            Err(_) => false,
        }
    } else {
        match path.file_name() {
            Some(name) => pattern.matches_with(&name.to_string_lossy(), MATCH_OPTIONS),
            None => false,
        }
    }
}

/// How deep a non-recursive walk must go for `pattern` to match: one level
/// per path component, so `logs/*.txt` reaches into `logs`.
fn pattern_depth(pattern: &Pattern) -> usize {
    pattern
        .as_str()
        .split(['/', std::path::MAIN_SEPARATOR])
        .filter(|part| !part.is_empty())
        .count()
        .max(1)
}

/// List matching entries under `root`, down to the pattern's depth or the
/// whole tree. Unreadable entries are logged and skipped.
fn enumerate(root: &Path, pattern: &Pattern, recursive: bool) -> Vec<Entry> {
    let max_depth = if recursive { usize::MAX } else { pattern_depth(pattern) };
    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(false)
        .sort_by_file_name();

    let mut entries = Vec::new();
    for item in walker {
        let dir_entry = match item {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };

        if !pattern_matches(pattern, root, dir_entry.path()) {
            continue;
        }

        let metadata = match dir_entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                warn!("Failed to read metadata for {}: {}", dir_entry.path().display(), e);
                continue;
            }
        };

        let modified = match metadata.modified() {
            Ok(t) => t,
            Err(e) => {
                warn!(
                    "Failed to read modification time for {}: {}",
                    dir_entry.path().display(),
                    e
                );
                continue;
            }
        };

        entries.push(Entry {
            path: dir_entry.into_path(),
            is_file: metadata.is_file(),
            is_dir: metadata.is_dir(),
            len: metadata.len(),
            modified,
        });
    }

    debug!("{} entries matched under {}", entries.len(), root.display());
    entries
}

/// Count-retention selection over a single directory level.
fn select_by_count(
    mut entries: Vec<Entry>,
    number: usize,
    days: u64,
    now: SystemTime,
) -> Vec<Candidate> {
    // Stable sort keeps name order for equal timestamps.
    entries.sort_by_key(|e| e.modified);

    let split = entries.len().saturating_sub(number);
    let kept: HashSet<&Path> = entries[split..].iter().map(|e| e.path.as_path()).collect();

    let is_stale = |e: &Entry| e.is_file && age_in_days(e.modified, now) > days;

    let selected: Vec<&Entry> = match (number > 0, days > 0) {
        (true, true) => entries
            .iter()
            .filter(|e| is_stale(*e) && !kept.contains(e.path.as_path()))
            .collect(),
        (true, false) => entries[..split].iter().collect(),
        (false, true) => entries.iter().filter(|e| is_stale(*e)).collect(),
        (false, false) => entries.iter().collect(),
    };

    // Only regular files are ever removed in this mode.
    selected
        .into_iter()
        .filter(|e| e.is_file)
        .map(|e| Candidate {
            path: e.path.clone(),
            kind: CandidateKind::File,
        })
        .collect()
}

/// General-mode selection: age and size filters for files, emptiness for
/// directories.
fn select_general(entries: Vec<Entry>, policy: &Policy, now: SystemTime) -> Vec<Candidate> {
    let size_threshold = policy.size_threshold_bytes();

    let mut candidates = Vec::new();
    for entry in entries {
        if entry.is_file {
            if policy.days > 0 && age_in_days(entry.modified, now) <= policy.days {
                continue;
            }
            if let Some(threshold) = size_threshold {
                if entry.len < threshold {
                    continue;
                }
            }
            candidates.push(Candidate {
                path: entry.path,
                kind: CandidateKind::File,
            });
        } else if entry.is_dir && policy.empty_dir && is_empty_dir(&entry.path) {
            candidates.push(Candidate {
                path: entry.path,
                kind: CandidateKind::EmptyDir,
            });
        }
    }
    candidates
}

fn is_empty_dir(path: &Path) -> bool {
    match fs::read_dir(path) {
        Ok(mut children) => children.next().is_none(),
        Err(e) => {
            warn!("Failed to list directory {}: {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
#[path = "select_tests.rs"]
mod tests;
