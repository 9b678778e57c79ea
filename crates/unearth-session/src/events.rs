//! Events delivered to the consumer of a scan.

use serde::Serialize;
use strum::{AsRefStr, Display};

use unearth_core::{Category, CategoryCounts, ScannedEntry};

/// Lifecycle phase of the coordinator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display, AsRefStr)]
pub enum ScanState {
    #[default]
    Idle,
    Initializing,
    Scanning,
    Finalizing,
    Completed,
    Error,
}

impl ScanState {
    /// A scan is running and new start requests must be refused.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Initializing | Self::Scanning | Self::Finalizing)
    }
}

/// Everything the coordinator reports, in delivery order per scan.
///
/// For one scan, `Completed` or `Error` is always the last event apart
/// from the closing lifecycle transition.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ScanEvent {
    Lifecycle { state: ScanState },
    Progress(ProgressEvent),
    FileBatch(FileBatch),
    Completed(ScanSummary),
    #[serde(rename_all = "camelCase")]
    Error { error_message: String },
}

/// Running totals of a scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub files_scanned: u64,
    pub bytes_scanned: u64,
    /// Estimated bytes under all roots, 0 when unknown.
    pub total_storage_bytes: u64,
    /// Percentage, capped at 98 until the scan completes.
    pub progress: f64,
    /// Files delivered so far, per category.
    pub found: CategoryCounts,
    /// Human-readable status line.
    pub current_path: String,
}

/// Up to `batch_size` entries of one category.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileBatch {
    pub category: Category,
    pub files: Vec<BatchFile>,
    /// Position of this batch within its category, from 0.
    pub batch_index: usize,
}

/// A delivered entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFile {
    #[serde(flatten)]
    pub entry: ScannedEntry,
    pub is_hidden: bool,
}

impl From<ScannedEntry> for BatchFile {
    fn from(entry: ScannedEntry) -> Self {
        Self {
            is_hidden: entry.is_hidden(),
            entry,
        }
    }
}

/// Final totals of a successful scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub total_files_found: u64,
    pub total_bytes_scanned: u64,
    pub categories_summary: CategoryCounts,
    /// Entries dropped as same-content duplicates.
    pub duplicates_removed: u64,
    /// Entries skipped during the walk.
    pub warnings: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    #[test]
    fn test_active_states() {
        assert!(!ScanState::Idle.is_active());
        assert!(ScanState::Initializing.is_active());
        assert!(ScanState::Scanning.is_active());
        assert!(ScanState::Finalizing.is_active());
        assert!(!ScanState::Completed.is_active());
        assert!(!ScanState::Error.is_active());
    }

    #[test]
    fn test_event_json_shapes() {
        let lifecycle = serde_json::to_value(ScanEvent::Lifecycle {
            state: ScanState::Scanning,
        })
        .unwrap();
        assert_eq!(lifecycle["type"], "lifecycle");
        assert_eq!(lifecycle["state"], "Scanning");

        let error = serde_json::to_value(ScanEvent::Error {
            error_message: "boom".into(),
        })
        .unwrap();
        assert_eq!(error["errorMessage"], "boom");

        let file: BatchFile = ScannedEntry::new("/sdcard/.hidden.jpg", 10, SystemTime::now()).into();
        let batch = serde_json::to_value(ScanEvent::FileBatch(FileBatch {
            category: Category::Image,
            files: vec![file],
            batch_index: 0,
        }))
        .unwrap();
        assert_eq!(batch["type"], "fileBatch");
        assert_eq!(batch["category"], "image");
        assert_eq!(batch["batchIndex"], 0);
        assert_eq!(batch["files"][0]["isHidden"], true);
        assert_eq!(batch["files"][0]["mimeType"], "image/jpeg");
    }
}
