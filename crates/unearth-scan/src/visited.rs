//! Visited-directory tracking for cycle-safe traversal.

use std::path::PathBuf;

use dashmap::DashSet;

/// Canonical directory paths already entered during one walk.
///
/// Symbolic links can make a directory reachable from below itself, and
/// overlapping roots reach the same directory twice. Keying on the
/// resolved path catches both.
#[derive(Debug, Default)]
pub struct VisitedDirs {
    seen: DashSet<PathBuf>,
}

impl VisitedDirs {
    /// Create an empty set.
    pub fn new() -> Self {
        Self {
            seen: DashSet::new(),
        }
    }

    /// Record a canonical directory path. Returns `true` the first time.
    pub fn track(&self, canonical: PathBuf) -> bool {
        self.seen.insert(canonical)
    }

    /// Number of distinct directories entered.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
