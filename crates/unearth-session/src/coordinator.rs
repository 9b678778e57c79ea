//! The scan lifecycle state machine.
//!
//! ```text
//! Idle -> Initializing -> Scanning -> Finalizing -> Completed
//!              |              |            |
//!              +------------> Error <------+
//! ```
//!
//! A cancelled scan skips finalization and returns to `Idle`. Every exit
//! path closes the scan's task scope before the final state is published,
//! so a new scan never overlaps work left over from the previous one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use unearth_core::{ScanConfig, ScanError, ScannedEntry};
use unearth_detect::dedupe_by_content;
use unearth_scan::{FilesystemWalker, WalkProgress};

use crate::batch::{category_batches, partition_by_category};
use crate::events::{ScanEvent, ScanState, ScanSummary};
use crate::session::ScanSession;

/// Recommended capacity for the event channel handed to [`ScanCoordinator::new`].
pub const EVENT_CHANNEL_SIZE: usize = 256;

const LABEL_STARTING: &str = "Starting scan...";
const LABEL_PROCESSING: &str = "Processing files...";
const LABEL_FINALIZING: &str = "Finalizing results...";

/// Errors returned synchronously by coordinator requests.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Another scan is initializing, scanning or finalizing.
    #[error("A scan is already in progress")]
    ScanInProgress,

    /// `start_scan` was called outside a Tokio runtime.
    #[error("No Tokio runtime available to run the scan")]
    NoRuntime,
}

/// How a scan ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Completed(ScanSummary),
    Cancelled,
    Failed(String),
}

/// A started scan.
#[derive(Debug)]
pub struct ScanHandle {
    session: Arc<ScanSession>,
    task: JoinHandle<ScanOutcome>,
}

impl ScanHandle {
    /// Identifier of this scan, also attached to its log lines.
    pub fn id(&self) -> u64 {
        self.session.id()
    }

    /// Wait for the scan to end and its child tasks to be torn down.
    pub async fn wait(self) -> ScanOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(err) => ScanOutcome::Failed(format!("scan task failed: {err}")),
        }
    }
}

/// Runs at most one scan at a time and reports it as [`ScanEvent`]s.
///
/// Events go to a bounded channel; a slow consumer slows delivery down
/// rather than dropping events. Cloning yields another handle to the same
/// coordinator.
#[derive(Debug, Clone)]
pub struct ScanCoordinator {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    events: mpsc::Sender<ScanEvent>,
    state: watch::Sender<ScanState>,
    active: Mutex<Option<Arc<ScanSession>>>,
    next_id: AtomicU64,
}

impl ScanCoordinator {
    /// Create an idle coordinator delivering events to `events`.
    pub fn new(events: mpsc::Sender<ScanEvent>) -> Self {
        let (state, _) = watch::channel(ScanState::Idle);
        Self {
            inner: Arc::new(Inner {
                events,
                state,
                active: Mutex::new(None),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ScanState {
        *self.inner.state.borrow()
    }

    /// Watch lifecycle transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<ScanState> {
        self.inner.state.subscribe()
    }

    /// Start a scan in the background.
    ///
    /// Returns immediately. Fails with [`CoordinatorError::ScanInProgress`]
    /// while another scan is active; the running scan is left untouched.
    pub fn start_scan(&self, config: ScanConfig) -> Result<ScanHandle, CoordinatorError> {
        let runtime = Handle::try_current().map_err(|_| CoordinatorError::NoRuntime)?;

        let admitted = self.inner.state.send_if_modified(|state| {
            if state.is_active() {
                false
            } else {
                *state = ScanState::Initializing;
                true
            }
        });
        if !admitted {
            warn!("Rejected start request: a scan is already in progress");
            return Err(CoordinatorError::ScanInProgress);
        }

        let session = Arc::new(ScanSession::new(
            self.inner.next_id.fetch_add(1, Ordering::Relaxed),
        ));
        *self.inner.lock_active() = Some(Arc::clone(&session));
        info!(session = session.id(), roots = ?config.effective_roots(), "Scan accepted");

        let task = runtime.spawn(run_scan(
            Arc::clone(&self.inner),
            Arc::clone(&session),
            config,
        ));
        Ok(ScanHandle { session, task })
    }

    /// Pause the active scan, if any.
    pub fn pause(&self) {
        if let Some(session) = self.inner.active() {
            session.control().pause();
            info!(session = session.id(), "Scan paused");
        }
    }

    /// Resume the active scan, if any.
    pub fn resume(&self) {
        if let Some(session) = self.inner.active() {
            session.control().resume();
            info!(session = session.id(), "Scan resumed");
        }
    }

    /// Cancel the active scan, if any. Already delivered batches stay delivered.
    pub fn cancel(&self) {
        if let Some(session) = self.inner.active() {
            session.control().cancel();
            info!(session = session.id(), "Scan cancellation requested");
        }
    }
}

impl Inner {
    fn lock_active(&self) -> MutexGuard<'_, Option<Arc<ScanSession>>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn active(&self) -> Option<Arc<ScanSession>> {
        self.lock_active().clone()
    }

    /// Send an event, giving up if the scan is cancelled while waiting.
    async fn deliver(&self, session: &ScanSession, event: ScanEvent) -> Result<(), ScanError> {
        tokio::select! {
            _ = session.control().token().cancelled() => Err(ScanError::Cancelled),
            sent = self.events.send(event) => sent.map_err(|_| ScanError::Delivery),
        }
    }

    async fn transition(&self, session: &ScanSession, state: ScanState) -> Result<(), ScanError> {
        self.state.send_replace(state);
        info!(session = session.id(), %state, "Lifecycle transition");
        self.deliver(session, ScanEvent::Lifecycle { state }).await
    }
}

/// Drive one scan, then tear down its scope and publish the final state.
async fn run_scan(inner: Arc<Inner>, session: Arc<ScanSession>, config: ScanConfig) -> ScanOutcome {
    let scope = TaskTracker::new();
    let scope_token = session.control().token().child_token();

    let result = drive(&inner, &session, &config, &scope, &scope_token).await;

    match &result {
        Ok(_) | Err(ScanError::Cancelled) => {}
        Err(err) => {
            warn!(session = session.id(), error = %err, "Scan failed");
            // Stop a walker that may still be running.
            session.control().cancel();
            if session.try_finish() {
                let event = ScanEvent::Error {
                    error_message: err.to_string(),
                };
                // The sink may be what failed.
                let _ = inner.events.send(event).await;
            }
        }
    }

    scope_token.cancel();
    scope.close();
    scope.wait().await;
    debug!(session = session.id(), "Scan scope closed");

    let (state, outcome) = match result {
        Ok(summary) => (ScanState::Completed, ScanOutcome::Completed(summary)),
        Err(ScanError::Cancelled) => {
            info!(session = session.id(), "Scan cancelled");
            (ScanState::Idle, ScanOutcome::Cancelled)
        }
        Err(err) => (ScanState::Error, ScanOutcome::Failed(err.to_string())),
    };

    {
        let mut active = inner.lock_active();
        if active.as_ref().is_some_and(|s| s.id() == session.id()) {
            *active = None;
        }
    }
    let _ = inner.events.send(ScanEvent::Lifecycle { state }).await;
    inner.state.send_replace(state);
    info!(session = session.id(), %state, "Lifecycle transition");

    outcome
}

async fn drive(
    inner: &Arc<Inner>,
    session: &Arc<ScanSession>,
    config: &ScanConfig,
    scope: &TaskTracker,
    scope_token: &CancellationToken,
) -> Result<ScanSummary, ScanError> {
    let id = session.id();
    inner
        .deliver(session, ScanEvent::Lifecycle {
            state: ScanState::Initializing,
        })
        .await?;

    let roots = config.effective_roots();
    let walker = Arc::new(FilesystemWalker::new(config));
    let control = Arc::clone(session.control());

    // Phase 1: size estimate, only a percentage denominator.
    let total = {
        let walker = Arc::clone(&walker);
        let roots = roots.clone();
        let control = Arc::clone(&control);
        scope
            .spawn_blocking(move || walker.estimate_total_size_with(&roots, &control))
            .await
            .map_err(worker_failed)?
    };
    if session.is_cancelled() {
        return Err(ScanError::Cancelled);
    }
    session.set_total_estimated(total);
    info!(session = id, total_estimated = total, "Size estimate ready");

    // Phase 2: full traversal.
    inner.transition(session, ScanState::Scanning).await?;
    inner
        .deliver(session, ScanEvent::Progress(session.progress_event(LABEL_STARTING)))
        .await?;

    let forwarder = scope.spawn(forward_progress(
        Arc::clone(inner),
        Arc::clone(session),
        walker.subscribe(),
        scope_token.clone(),
    ));
    // The walker moves into the task and is dropped with it, closing the
    // progress channel so the forwarder drains and exits.
    let walk = scope
        .spawn_blocking(move || walker.walk(&roots, &control))
        .await
        .map_err(worker_failed)?;
    forwarder.await.map_err(worker_failed)??;

    if walk.cancelled || session.is_cancelled() {
        return Err(ScanError::Cancelled);
    }

    inner.transition(session, ScanState::Finalizing).await?;
    session.record_walk(walk.file_count(), walk.total_bytes);
    let warnings = walk.warnings.len() as u64;

    let (entries, duplicates_removed) = if config.dedupe_content {
        let partial_bytes = config.partial_hash_bytes;
        let entries = walk.entries;
        let (kept, removed) = scope
            .spawn_blocking(move || dedupe_by_content(entries, partial_bytes))
            .await
            .map_err(worker_failed)?;
        info!(session = id, removed, "Dropped content duplicates");
        (kept, removed as u64)
    } else {
        (walk.entries, 0)
    };
    let total_files_found = entries.len() as u64;

    deliver_batches(inner, session, config, entries).await?;

    let mut done = session.progress_event(LABEL_FINALIZING);
    done.progress = 100.0;
    inner.deliver(session, ScanEvent::Progress(done)).await?;

    let summary = ScanSummary {
        total_files_found,
        total_bytes_scanned: session.bytes_scanned(),
        categories_summary: session.found(),
        duplicates_removed,
        warnings,
    };

    if session.try_finish() {
        inner
            .deliver(session, ScanEvent::Completed(summary.clone()))
            .await?;
        info!(
            session = id,
            files = summary.total_files_found,
            bytes = summary.total_bytes_scanned,
            "Scan completed"
        );
    } else {
        warn!(session = id, "Completion already signalled; skipping duplicate");
    }

    Ok(summary)
}

/// Send entries grouped by category, `batch_size` at a time.
///
/// Found counters grow per batch, so progress reflects what the consumer
/// has actually received.
async fn deliver_batches(
    inner: &Inner,
    session: &ScanSession,
    config: &ScanConfig,
    entries: Vec<ScannedEntry>,
) -> Result<(), ScanError> {
    let delay = Duration::from_millis(config.batch_delay_ms);

    for (category, files) in partition_by_category(entries) {
        let batches = category_batches(category, files, config.batch_size);
        let count = batches.len();

        for batch in batches {
            let running = tokio::select! {
                running = session.checkpoint() => running,
                _ = inner.events.closed() => return Err(ScanError::Delivery),
            };
            if !running {
                debug!(session = session.id(), "Cancelled during batch delivery");
                return Err(ScanError::Cancelled);
            }

            let size = batch.files.len();
            session.add_found(category, size as u64);
            debug!(
                session = session.id(),
                %category,
                batch = batch.batch_index + 1,
                of = count,
                files = size,
                "Sending batch"
            );
            inner.deliver(session, ScanEvent::FileBatch(batch)).await?;
            inner
                .deliver(session, ScanEvent::Progress(session.progress_event(LABEL_PROCESSING)))
                .await?;

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
    Ok(())
}

/// Turn walker progress into progress events until the walk ends.
///
/// A failed delivery cancels the session so the blocking walk stops too.
async fn forward_progress(
    inner: Arc<Inner>,
    session: Arc<ScanSession>,
    progress_rx: broadcast::Receiver<WalkProgress>,
    stop: CancellationToken,
) -> Result<(), ScanError> {
    let result = forward_until_closed(&inner, &session, progress_rx, &stop).await;
    if matches!(result, Err(ScanError::Delivery)) {
        debug!(session = session.id(), "Event receiver gone, stopping walk");
        session.control().cancel();
    }
    result
}

async fn forward_until_closed(
    inner: &Inner,
    session: &ScanSession,
    mut progress_rx: broadcast::Receiver<WalkProgress>,
    stop: &CancellationToken,
) -> Result<(), ScanError> {
    loop {
        let progress = tokio::select! {
            _ = stop.cancelled() => return Ok(()),
            // Noticed even while the walk is paused and nothing is being sent.
            _ = inner.events.closed() => return Err(ScanError::Delivery),
            received = progress_rx.recv() => match received {
                Ok(progress) => progress,
                Err(RecvError::Lagged(skipped)) => {
                    debug!(session = session.id(), skipped, "Progress forwarder lagged");
                    continue;
                }
                Err(RecvError::Closed) => return Ok(()),
            },
        };

        session.record_walk(progress.files_scanned, progress.bytes_scanned);
        let event = session.progress_event(progress.current_dir.display().to_string());
        inner.deliver(session, ScanEvent::Progress(event)).await?;
    }
}

fn worker_failed(err: JoinError) -> ScanError {
    ScanError::Worker {
        message: err.to_string(),
    }
}
