//! Retention policy.

use std::path::PathBuf;

/// Bytes in one MiB, the unit of [`Policy::size`].
pub const BYTES_PER_MIB: u64 = 1024 * 1024;

/// Seconds in one day, the unit of [`Policy::days`].
pub const SECS_PER_DAY: u64 = 86_400;

/// Which selection algorithm a policy runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Keep the newest `number` matches in one directory level.
    CountRetention,
    /// Age/size filters, optional recursion and empty-directory cleanup.
    General,
}

/// What to scan and which entries qualify for deletion.
///
/// A zero threshold (`days`, `size`, `number`) disables that filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    /// Base directory to scan.
    pub root_path: PathBuf,
    /// Glob matched against entry names.
    pub pattern: String,
    /// Scan subdirectories (general mode only).
    pub recursive: bool,
    /// Delete only files older than this many whole days.
    pub days: u64,
    /// Delete only files of at least this many MiB (general mode only).
    pub size: u64,
    /// Keep this many of the most recently modified matches.
    pub number: usize,
    /// Remove matched empty directories (general mode only).
    pub empty_dir: bool,
}

impl Policy {
    /// Create a policy matching everything directly under `root_path`.
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            pattern: "*".to_string(),
            recursive: false,
            days: 0,
            size: 0,
            number: 0,
            empty_dir: false,
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

    /// A non-zero `number` selects count retention and disables the
    /// general-mode options.
    pub fn mode(&self) -> SelectionMode {
        if self.number > 0 {
            SelectionMode::CountRetention
        } else {
            SelectionMode::General
        }
    }

    /// Size threshold in bytes, `None` when disabled.
    pub fn size_threshold_bytes(&self) -> Option<u64> {
        (self.size > 0).then(|| self.size.saturating_mul(BYTES_PER_MIB))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_defaults() {
        let policy = Policy::new("/tmp/logs");
        assert_eq!(policy.pattern, "*");
        assert!(!policy.recursive);
        assert_eq!(policy.days, 0);
        assert_eq!(policy.mode(), SelectionMode::General);
        assert_eq!(policy.size_threshold_bytes(), None);
    }

    #[test]
    fn test_number_selects_count_retention() {
        let policy = Policy::new("/tmp").with_number(3).with_recursive(true);
        assert_eq!(policy.mode(), SelectionMode::CountRetention);
    }

    #[test]
    fn test_size_threshold_bytes() {
        let policy = Policy::new("/tmp").with_size(2);
        assert_eq!(policy.size_threshold_bytes(), Some(2 * 1024 * 1024));
    }
}
