//! Per-scan state shared between the coordinator and its child tasks.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use strum::EnumCount;

use unearth_core::{Category, CategoryCounts};
use unearth_scan::WalkControl;

use crate::events::ProgressEvent;

/// Scan progress is held below this until the scan completes.
pub const MAX_SCANNING_PROGRESS: f64 = 98.0;

const PAUSE_POLL: Duration = Duration::from_millis(25);

/// Counters and flags for one scan.
///
/// A fresh session is created for every accepted start request, so a
/// new scan can never observe or reset another scan's counters.
#[derive(Debug)]
pub struct ScanSession {
    id: u64,
    control: Arc<WalkControl>,
    files_scanned: AtomicU64,
    bytes_scanned: AtomicU64,
    total_estimated: AtomicU64,
    found: [AtomicU64; Category::COUNT],
    finished: AtomicBool,
}

impl ScanSession {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            control: Arc::new(WalkControl::new()),
            files_scanned: AtomicU64::new(0),
            bytes_scanned: AtomicU64::new(0),
            total_estimated: AtomicU64::new(0),
            found: std::array::from_fn(|_| AtomicU64::new(0)),
            finished: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Pause and cancel switches shared with the walker.
    pub fn control(&self) -> &Arc<WalkControl> {
        &self.control
    }

    pub fn is_cancelled(&self) -> bool {
        self.control.is_cancelled()
    }

    /// Wait while paused. Returns `false` if the scan was cancelled.
    pub async fn checkpoint(&self) -> bool {
        while self.control.is_paused() && !self.control.is_cancelled() {
            tokio::time::sleep(PAUSE_POLL).await;
        }
        !self.control.is_cancelled()
    }

    pub fn set_total_estimated(&self, bytes: u64) {
        self.total_estimated.store(bytes, Ordering::Release);
    }

    /// Apply walker totals. Counters never move backwards, even if
    /// reports arrive late.
    pub fn record_walk(&self, files: u64, bytes: u64) {
        self.files_scanned.fetch_max(files, Ordering::AcqRel);
        self.bytes_scanned.fetch_max(bytes, Ordering::AcqRel);
    }

    /// Count `n` delivered entries of a category.
    pub fn add_found(&self, category: Category, n: u64) {
        self.found[category.index()].fetch_add(n, Ordering::AcqRel);
    }

    pub fn found(&self) -> CategoryCounts {
        let mut counts = CategoryCounts::new();
        for (slot, counter) in counts.0.iter_mut().zip(&self.found) {
            *slot = counter.load(Ordering::Acquire);
        }
        counts
    }

    pub fn files_scanned(&self) -> u64 {
        self.files_scanned.load(Ordering::Acquire)
    }

    pub fn bytes_scanned(&self) -> u64 {
        self.bytes_scanned.load(Ordering::Acquire)
    }

    pub fn total_estimated(&self) -> u64 {
        self.total_estimated.load(Ordering::Acquire)
    }

    /// Percentage while the scan is running.
    ///
    /// Bytes against the size estimate when there is one, otherwise the
    /// share of scanned files already delivered. Never above 98.
    pub fn progress(&self) -> f64 {
        let total = self.total_estimated();
        let scanned = self.files_scanned();
        let percent = if total > 0 {
            self.bytes_scanned() as f64 / total as f64 * 100.0
        } else if scanned > 0 {
            self.found().total() as f64 / scanned as f64 * 100.0
        } else {
            0.0
        };
        percent.min(MAX_SCANNING_PROGRESS)
    }

    /// Snapshot the counters as a progress event.
    pub fn progress_event(&self, current_path: impl Into<String>) -> ProgressEvent {
        ProgressEvent {
            files_scanned: self.files_scanned(),
            bytes_scanned: self.bytes_scanned(),
            total_storage_bytes: self.total_estimated(),
            progress: self.progress(),
            found: self.found(),
            current_path: current_path.into(),
        }
    }

    /// Claim the right to emit the terminal event.
    ///
    /// Returns `true` exactly once per session, for whichever of
    /// completion or error gets there first.
    pub fn try_finish(&self) -> bool {
        self.finished
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_monotonic() {
        let session = ScanSession::new(1);
        session.record_walk(10, 1000);
        session.record_walk(5, 400);
        assert_eq!(session.files_scanned(), 10);
        assert_eq!(session.bytes_scanned(), 1000);
    }

    #[test]
    fn test_progress_is_capped() {
        let session = ScanSession::new(1);
        assert_eq!(session.progress(), 0.0);

        session.set_total_estimated(1000);
        session.record_walk(1, 500);
        assert_eq!(session.progress(), 50.0);
        session.record_walk(2, 5000);
        assert_eq!(session.progress(), MAX_SCANNING_PROGRESS);
    }

    #[test]
    fn test_progress_falls_back_to_found_ratio() {
        let session = ScanSession::new(1);
        session.record_walk(4, 0);
        session.add_found(Category::Image, 1);
        assert_eq!(session.progress(), 25.0);

        session.add_found(Category::Video, 3);
        assert_eq!(session.progress(), MAX_SCANNING_PROGRESS);
        assert_eq!(session.found()[Category::Video], 3);
    }

    #[test]
    fn test_finish_latch_fires_once() {
        let session = Arc::new(ScanSession::new(1));
        let winners: usize = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let session = Arc::clone(&session);
                    s.spawn(move || session.try_finish() as usize)
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });
        assert_eq!(winners, 1);
    }
}
