//! JWalk-based filesystem walker.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use jwalk::{Parallelism, WalkDir};
use tokio::sync::broadcast;
use tracing::{debug, info};

use unearth_core::{ScanConfig, ScanWarning, ScannedEntry, WarningKind};

use crate::control::WalkControl;
use crate::progress::{ProgressTracker, WalkProgress};
use crate::visited::VisitedDirs;

/// Everything a finished (or cancelled) walk produced.
#[derive(Debug, Default)]
pub struct WalkOutcome {
    /// Regular files found, unique by canonical path, in traversal order.
    pub entries: Vec<ScannedEntry>,
    /// Entries skipped because they could not be read.
    pub warnings: Vec<ScanWarning>,
    /// Roots that existed and were walked, canonicalized.
    pub roots: Vec<PathBuf>,
    /// Total size of `entries`.
    pub total_bytes: u64,
    /// The walk stopped early because it was cancelled.
    pub cancelled: bool,
}

impl WalkOutcome {
    pub fn file_count(&self) -> u64 {
        self.entries.len() as u64
    }
}

/// Sequential, cycle-safe walker over a set of roots.
///
/// Directories are entered through their canonical path, so each one is
/// read at most once per walk no matter how many symlinks or overlapping
/// roots lead to it. Hidden directories are walked; only names on the
/// configured skip list are left out.
#[derive(Debug)]
pub struct FilesystemWalker {
    config: Arc<ScanConfig>,
    progress_tx: broadcast::Sender<WalkProgress>,
}

impl FilesystemWalker {
    /// Create a walker using the traversal policy from `config`.
    pub fn new(config: &ScanConfig) -> Self {
        let (progress_tx, _) = broadcast::channel(config.event_buffer.max(1));
        Self {
            config: Arc::new(config.clone()),
            progress_tx,
        }
    }

    /// Subscribe to walk progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<WalkProgress> {
        self.progress_tx.subscribe()
    }

    /// Sum the sizes of files under every readable root.
    ///
    /// Best effort: unreadable entries are ignored. Only meant as the
    /// denominator of a progress percentage. Directories and symlinked
    /// files are counted once, as in [`walk`](Self::walk).
    pub fn estimate_total_size(&self, roots: &[PathBuf]) -> u64 {
        self.estimate_total_size_with(roots, &WalkControl::new())
    }

    /// Like [`estimate_total_size`](Self::estimate_total_size), stopping
    /// early when `control` is cancelled.
    pub fn estimate_total_size_with(&self, roots: &[PathBuf], control: &WalkControl) -> u64 {
        let visited = Arc::new(VisitedDirs::new());
        let mut seen_files: HashSet<PathBuf> = HashSet::new();
        let mut total = 0u64;

        for root in resolve_roots(roots) {
            for entry in self.walk_dir(&root, &visited).into_iter().flatten() {
                if !control.checkpoint() {
                    return total;
                }
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = if entry.path_is_symlink() {
                    match std::fs::canonicalize(entry.path()) {
                        Ok(target) => target,
                        Err(_) => continue,
                    }
                } else {
                    entry.path()
                };
                if seen_files.insert(path) {
                    total += entry.metadata().map(|m| m.len()).unwrap_or(0);
                }
            }
        }

        debug!(total, dirs = visited.len(), "estimated total size");
        total
    }

    /// Walk the roots, publishing progress on the broadcast channel only.
    pub fn walk(&self, roots: &[PathBuf], control: &WalkControl) -> WalkOutcome {
        self.walk_with_progress(roots, control, |_| {})
    }

    /// Walk the roots, calling `on_progress` with cumulative totals.
    ///
    /// Reports are periodic, not per file. The last report always carries
    /// the final totals, including for a cancelled walk.
    pub fn walk_with_progress<F>(
        &self,
        roots: &[PathBuf],
        control: &WalkControl,
        mut on_progress: F,
    ) -> WalkOutcome
    where
        F: FnMut(&WalkProgress),
    {
        let visited = Arc::new(VisitedDirs::new());
        let mut tracker = ProgressTracker::new(
            self.config.progress_every_files,
            self.config.progress_every_bytes,
        );
        let mut seen_files: HashSet<PathBuf> = HashSet::new();
        let mut outcome = WalkOutcome {
            roots: resolve_roots(roots),
            ..WalkOutcome::default()
        };

        let mut publish = |progress: WalkProgress| {
            on_progress(&progress);
            // No subscribers is fine.
            let _ = self.progress_tx.send(progress);
        };

        'roots: for root in outcome.roots.clone() {
            for entry_result in self.walk_dir(&root, &visited) {
                if !control.checkpoint() {
                    outcome.cancelled = true;
                    break 'roots;
                }

                let entry = match entry_result {
                    Ok(entry) => entry,
                    Err(err) => {
                        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                        let warning = match err.io_error() {
                            Some(io) => ScanWarning::from_io(path, io),
                            None => ScanWarning::new(path, err.to_string(), WarningKind::ReadError),
                        };
                        record_warning(&mut outcome, &mut tracker, warning);
                        continue;
                    }
                };

                let file_type = entry.file_type();
                if file_type.is_symlink() {
                    // Only dangling links keep their link type when following.
                    if self.config.follow_symlinks {
                        let warning = ScanWarning::new(
                            entry.path(),
                            "Symlink target does not exist",
                            WarningKind::BrokenSymlink,
                        );
                        record_warning(&mut outcome, &mut tracker, warning);
                    }
                    continue;
                }
                if !file_type.is_file() {
                    continue;
                }

                let mut path = entry.path();
                if entry.path_is_symlink() {
                    match std::fs::canonicalize(&path) {
                        Ok(target) => path = target,
                        Err(err) => {
                            record_warning(&mut outcome, &mut tracker, ScanWarning::from_io(&path, &err));
                            continue;
                        }
                    }
                }
                if seen_files.contains(&path) {
                    continue;
                }

                let metadata = match entry.metadata() {
                    Ok(m) => m,
                    Err(err) => {
                        let warning =
                            ScanWarning::new(&path, err.to_string(), WarningKind::MetadataError);
                        record_warning(&mut outcome, &mut tracker, warning);
                        continue;
                    }
                };
                if !is_readable(&path) {
                    record_warning(&mut outcome, &mut tracker, ScanWarning::unreadable(&path));
                    continue;
                }

                let size = metadata.len();
                let modified = metadata.modified().unwrap_or(std::time::UNIX_EPOCH);
                tracker.record_file(size, path.parent());
                seen_files.insert(path.clone());
                outcome.total_bytes += size;
                outcome.entries.push(ScannedEntry::new(path, size, modified));

                if tracker.is_due() {
                    publish(tracker.report());
                }
            }
        }

        publish(tracker.report());

        info!(
            files = outcome.file_count(),
            bytes = outcome.total_bytes,
            dirs = visited.len(),
            warnings = outcome.warnings.len(),
            cancelled = outcome.cancelled,
            "walk finished"
        );
        outcome
    }

    /// Build the jwalk iterator for one root.
    ///
    /// Every directory about to be read is resolved to its canonical path
    /// and claimed in `visited`; already-claimed and skip-listed
    /// directories are not descended into. Reading through the canonical
    /// path makes every emitted entry path canonical too.
    fn walk_dir(&self, root: &Path, visited: &Arc<VisitedDirs>) -> WalkDir {
        let visited = Arc::clone(visited);
        let config = Arc::clone(&self.config);
        let max_depth = self.config.max_depth as usize;

        WalkDir::new(root)
            .parallelism(Parallelism::Serial)
            .sort(true)
            .skip_hidden(false)
            .follow_links(self.config.follow_symlinks)
            .min_depth(0)
            // Directories at `max_depth` are still read, so their files sit one level deeper.
            .max_depth(max_depth.saturating_add(1))
            .process_read_dir(move |depth, _dir, _state, children| {
                for child in children.iter_mut().flatten() {
                    let Some(dir) = child.read_children_path.take() else {
                        continue;
                    };

                    // Configured roots are always entered.
                    if depth.is_some() && config.should_skip_dir(&child.file_name.to_string_lossy()) {
                        debug!(path = %dir.display(), "skipping system directory");
                        continue;
                    }

                    match std::fs::canonicalize(&dir) {
                        Ok(canonical) if visited.track(canonical.clone()) => {
                            child.read_children_path = Some(Arc::from(canonical));
                        }
                        Ok(_) => debug!(path = %dir.display(), "directory already visited"),
                        Err(err) => debug!(path = %dir.display(), error = %err, "cannot resolve directory"),
                    }
                }
            })
    }
}

fn record_warning(outcome: &mut WalkOutcome, tracker: &mut ProgressTracker, warning: ScanWarning) {
    debug!(path = %warning.path.display(), kind = ?warning.kind, "skipping entry: {}", warning.message);
    tracker.record_warning();
    outcome.warnings.push(warning);
}

/// Canonicalize the roots, dropping any that are missing or not readable
/// directories.
fn resolve_roots(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut resolved = Vec::with_capacity(roots.len());
    for root in roots {
        match std::fs::canonicalize(root) {
            Ok(path) if path.is_dir() && std::fs::read_dir(&path).is_ok() => {
                if !resolved.contains(&path) {
                    resolved.push(path);
                }
            }
            Ok(_) => debug!(root = %root.display(), "excluding root that is not a readable directory"),
            Err(err) => debug!(root = %root.display(), error = %err, "excluding missing root"),
        }
    }
    resolved
}

/// Whether the current process may open the file for reading.
#[cfg(unix)]
fn is_readable(path: &Path) -> bool {
    rustix::fs::access(path, rustix::fs::Access::READ_OK).is_ok()
}

#[cfg(not(unix))]
fn is_readable(path: &Path) -> bool {
    std::fs::File::open(path).is_ok()
}
