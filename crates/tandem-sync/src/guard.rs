//! Loopback suppression.
//!
//! Remote edits applied to the local buffer must not be captured and sent
//! back out. The session owns one `LoopbackGuard`; every remote mutation runs
//! inside `run_suppressed`, and the change observer drops whatever the
//! buffer reports while the guard is held.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared suppression flag with scoped acquisition.
#[derive(Debug, Clone, Default)]
pub struct LoopbackGuard {
    suppressed: Arc<AtomicBool>,
}

impl LoopbackGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed.load(Ordering::Acquire)
    }

    /// Set suppression until the returned scope is dropped.
    ///
    /// Dropping restores the value seen on entry, so scopes nest.
    pub fn suppress(&self) -> SuppressionScope {
        let prior = self.suppressed.swap(true, Ordering::AcqRel);
        SuppressionScope {
            flag: self.suppressed.clone(),
            prior,
        }
    }

    /// Run `action` and await the future it returns with suppression held.
    ///
    /// `action` is only called once the flag is set, so documents that mutate
    /// eagerly when the call is made are covered as well as lazy ones. The
    /// flag is released when the mutation settles, fails, panics, or is
    /// dropped before completion.
    pub async fn run_suppressed<F, Fut>(&self, action: F) -> Fut::Output
    where
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        let _scope = self.suppress();
        action().await
    }
}

/// Holds suppression for as long as it lives.
#[must_use = "suppression ends as soon as the scope is dropped"]
#[derive(Debug)]
pub struct SuppressionScope {
    flag: Arc<AtomicBool>,
    prior: bool,
}

impl Drop for SuppressionScope {
    fn drop(&mut self) {
        self.flag.store(self.prior, Ordering::Release);
    }
}
