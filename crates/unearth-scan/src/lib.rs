//! Filesystem walker for unearth.
//!
//! Enumerates every regular file below a set of roots, classifying each
//! one by extension as it goes. The walk is sequential and cycle-safe:
//!
//! - **Cycle guard** - directories are entered through their canonical
//!   path and at most once per walk, so symlink loops terminate and
//!   overlapping roots do not double-count
//! - **Depth bound** - directories deeper than the configured limit are
//!   not read
//! - **Progress** - cumulative totals every N files or M bytes, via a
//!   callback and a broadcast channel
//! - **Cooperative control** - pause and cancel are checked between
//!   entries
//!
//! Per-entry failures (permission denied, vanished files, dangling links)
//! become [`ScanWarning`]s; they never abort a walk.
//!
//! ```rust,no_run
//! use unearth_scan::{FilesystemWalker, ScanConfig, WalkControl};
//!
//! let config = ScanConfig::new(["/storage/emulated/0"]);
//! let walker = FilesystemWalker::new(&config);
//! let control = WalkControl::new();
//!
//! let outcome = walker.walk_with_progress(&config.effective_roots(), &control, |p| {
//!     eprintln!("{} files, {} bytes", p.files_scanned, p.bytes_scanned);
//! });
//! println!("found {} files", outcome.file_count());
//! ```

mod control;
mod progress;
mod visited;
mod walker;

pub use control::WalkControl;
pub use progress::WalkProgress;
pub use visited::VisitedDirs;
pub use walker::{FilesystemWalker, WalkOutcome};

pub use unearth_core::{Category, ScanConfig, ScanWarning, ScannedEntry, WarningKind};
