//! Local change capture and debounce batching.

use std::time::Duration;

use tandem_editor_core::TextChange;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::guard::LoopbackGuard;
use crate::operation::{Operation, OperationBatch};

/// Receiving end of the local change queue.
pub type LocalChanges = mpsc::UnboundedReceiver<TextChange>;

/// Handed to a `Document` to report edits.
///
/// Changes reported while the loopback guard is held are dropped here, at
/// the moment they happen, so remote edits never reach the outbound queue.
#[derive(Debug, Clone)]
pub struct ChangeObserver {
    guard: LoopbackGuard,
    tx: mpsc::UnboundedSender<TextChange>,
}

impl ChangeObserver {
    pub fn new(guard: LoopbackGuard) -> (Self, LocalChanges) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { guard, tx }, rx)
    }

    /// Report one change. Returns whether it was queued.
    pub fn notify(&self, change: TextChange) -> bool {
        if self.guard.is_suppressed() {
            tracing::trace!(range = %change.range, "suppressed change from remote apply");
            metrics::counter!("tandem_suppressed_changes_total").increment(1);
            return false;
        }
        if self.tx.send(change).is_err() {
            tracing::debug!("change queue closed, session has ended");
            return false;
        }
        true
    }
}

/// Why a batch left the debouncer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    /// No edit for a full debounce window. Ends the local typing run.
    Quiet,
    /// Edits kept arriving past the max-wait ceiling.
    MaxWait,
}

/// A batch ready to publish. The batch may be empty on a quiet flush that
/// follows a max-wait flush.
#[derive(Debug, Clone, PartialEq)]
pub struct Flush {
    pub batch: OperationBatch,
    pub reason: FlushReason,
}

/// Trailing-edge debounce with an optional ceiling.
///
/// Pure timer state: callers pass the current instant and sleep until
/// `deadline()`.
#[derive(Debug, Clone)]
pub struct Debouncer {
    pending: OperationBatch,
    quiet_at: Option<Instant>,
    first_pending_at: Option<Instant>,
    window: Duration,
    max_wait: Option<Duration>,
}

impl Debouncer {
    pub fn new(window: Duration, max_wait: Option<Duration>) -> Self {
        Self {
            pending: OperationBatch::new(),
            quiet_at: None,
            first_pending_at: None,
            window,
            max_wait,
        }
    }

    /// Queue an operation and restart the quiet window.
    pub fn push(&mut self, op: Operation, now: Instant) {
        self.pending.push(op);
        self.first_pending_at.get_or_insert(now);
        self.quiet_at = Some(now + self.window);
    }

    fn ceiling(&self) -> Option<Instant> {
        match (self.first_pending_at, self.max_wait) {
            (Some(first), Some(max)) => Some(first + max),
            _ => None,
        }
    }

    /// When the next flush is due, if anything is armed.
    pub fn deadline(&self) -> Option<Instant> {
        match (self.quiet_at, self.ceiling()) {
            (Some(quiet), Some(ceiling)) => Some(quiet.min(ceiling)),
            (quiet, ceiling) => quiet.or(ceiling),
        }
    }

    /// Whether a flush is due at `now`, and why.
    pub fn due(&self, now: Instant) -> Option<FlushReason> {
        if self.quiet_at.is_some_and(|at| now >= at) {
            Some(FlushReason::Quiet)
        } else if self.ceiling().is_some_and(|at| now >= at) {
            Some(FlushReason::MaxWait)
        } else {
            None
        }
    }

    /// Take the batch if a flush is due.
    ///
    /// A max-wait flush keeps the quiet window armed so the run still ends
    /// with a quiet flush once edits stop.
    pub fn poll(&mut self, now: Instant) -> Option<Flush> {
        let reason = self.due(now)?;
        if reason == FlushReason::Quiet {
            self.quiet_at = None;
        }
        self.first_pending_at = None;
        Some(Flush {
            batch: std::mem::take(&mut self.pending),
            reason,
        })
    }

    /// Take everything now, disarming all timers.
    pub fn take(&mut self) -> OperationBatch {
        self.quiet_at = None;
        self.first_pending_at = None;
        std::mem::take(&mut self.pending)
    }

    /// Drop pending operations. Returns how many were dropped.
    ///
    /// The quiet window stays armed so the typing run still ends normally.
    pub fn discard(&mut self) -> usize {
        self.first_pending_at = None;
        std::mem::take(&mut self.pending).len()
    }

    pub fn pending(&self) -> &OperationBatch {
        &self.pending
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.quiet_at.is_none()
    }
}
