//! Walk progress reporting.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Cumulative progress of a walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkProgress {
    /// Regular files emitted so far.
    pub files_scanned: u64,
    /// Bytes in those files.
    pub bytes_scanned: u64,
    /// Directory holding the most recently emitted file.
    pub current_dir: PathBuf,
    /// Entries skipped because of errors.
    pub warnings: u64,
    /// Time since the walk started.
    pub elapsed: Duration,
}

/// Running totals plus the thresholds deciding when to report them.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    start_time: Instant,
    every_files: u64,
    every_bytes: u64,
    files: u64,
    bytes: u64,
    warnings: u64,
    reported_files: u64,
    reported_bytes: u64,
    current_dir: PathBuf,
}

impl ProgressTracker {
    pub fn new(every_files: u64, every_bytes: u64) -> Self {
        Self {
            start_time: Instant::now(),
            every_files: every_files.max(1),
            every_bytes: every_bytes.max(1),
            files: 0,
            bytes: 0,
            warnings: 0,
            reported_files: 0,
            reported_bytes: 0,
            current_dir: PathBuf::new(),
        }
    }

    pub fn record_file(&mut self, size: u64, dir: Option<&Path>) {
        self.files += 1;
        self.bytes += size;
        if let Some(dir) = dir {
            if dir != self.current_dir {
                self.current_dir = dir.to_path_buf();
            }
        }
    }

    pub fn record_warning(&mut self) {
        self.warnings += 1;
    }

    /// A report is due after `every_files` files or `every_bytes` bytes
    /// since the last one, whichever comes first.
    pub fn is_due(&self) -> bool {
        self.files - self.reported_files >= self.every_files
            || self.bytes - self.reported_bytes >= self.every_bytes
    }

    /// Snapshot the totals and mark them as reported.
    pub fn report(&mut self) -> WalkProgress {
        self.reported_files = self.files;
        self.reported_bytes = self.bytes;
        WalkProgress {
            files_scanned: self.files,
            bytes_scanned: self.bytes,
            current_dir: self.current_dir.clone(),
            warnings: self.warnings,
            elapsed: self.start_time.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_due_by_file_count() {
        let mut tracker = ProgressTracker::new(3, u64::MAX);
        tracker.record_file(1, None);
        tracker.record_file(1, None);
        assert!(!tracker.is_due());
        tracker.record_file(1, None);
        assert!(tracker.is_due());

        let report = tracker.report();
        assert_eq!(report.files_scanned, 3);
        assert!(!tracker.is_due());
    }

    #[test]
    fn test_due_by_bytes_since_last_report() {
        let mut tracker = ProgressTracker::new(1000, 100);
        tracker.record_file(60, None);
        assert!(!tracker.is_due());
        tracker.record_file(60, None);
        assert!(tracker.is_due());
        tracker.report();

        tracker.record_file(99, None);
        assert!(!tracker.is_due());
    }
}
