//! Scan coordination for unearth.
//!
//! [`ScanCoordinator`] owns the scan lifecycle. It admits one scan at a
//! time, runs a size estimate followed by the full walk on blocking
//! threads, then delivers the results grouped by category in fixed-size
//! batches. Every step is reported as a [`ScanEvent`] on a bounded channel.
//!
//! Guarantees per scan:
//!
//! - progress never goes backwards and stays at or below 98% until the
//!   final 100% report
//! - exactly one of `Completed` or `Error` is emitted, never both, and
//!   never for a cancelled scan
//! - all child tasks are stopped before the final lifecycle state is
//!   published
//!
//! ```rust,no_run
//! use tokio::sync::mpsc;
//! use unearth_core::ScanConfig;
//! use unearth_session::{EVENT_CHANNEL_SIZE, ScanCoordinator, ScanEvent};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
//! let coordinator = ScanCoordinator::new(tx);
//! let handle = coordinator.start_scan(ScanConfig::new(["/sdcard"]))?;
//!
//! tokio::spawn(async move {
//!     while let Some(event) = rx.recv().await {
//!         if let ScanEvent::FileBatch(batch) = event {
//!             println!("{}: {} files", batch.category, batch.files.len());
//!         }
//!     }
//! });
//!
//! println!("{:?}", handle.wait().await);
//! # Ok(())
//! # }
//! ```

mod batch;
mod coordinator;
mod events;
mod session;
mod storage;

pub use batch::{category_batches, partition_by_category};
pub use coordinator::{
    CoordinatorError, EVENT_CHANNEL_SIZE, ScanCoordinator, ScanHandle, ScanOutcome,
};
pub use events::{BatchFile, FileBatch, ProgressEvent, ScanEvent, ScanState, ScanSummary};
pub use session::{MAX_SCANNING_PROGRESS, ScanSession};
pub use storage::{StorageInfo, primary_storage_path, storage_info};
