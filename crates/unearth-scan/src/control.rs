//! Cooperative pause and cancellation for a running walk.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// How long a paused walk sleeps between checks of its flags.
const PAUSE_POLL: Duration = Duration::from_millis(25);

/// Shared switches a walk checks between entries.
///
/// Pausing never discards walker state: the walk simply stops advancing
/// until it is resumed or cancelled.
#[derive(Debug, Default)]
pub struct WalkControl {
    cancel: CancellationToken,
    paused: AtomicBool,
}

impl WalkControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Control tied to an existing cancellation token.
    pub fn with_token(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            paused: AtomicBool::new(false),
        }
    }

    /// The token cancelled by [`WalkControl::cancel`].
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Block the calling thread while paused.
    ///
    /// Returns `false` once the walk has been cancelled, `true` when it may
    /// continue. Must only be called from a blocking context.
    pub fn checkpoint(&self) -> bool {
        while self.is_paused() && !self.is_cancelled() {
            std::thread::sleep(PAUSE_POLL);
        }
        !self.is_cancelled()
    }
}
