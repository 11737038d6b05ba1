//! Who is typing, and the advisory soft lock that goes with it.
//!
//! Local and remote typing are independent flags. Remote typing is tracked
//! per author: `typing=false` only clears an author after a grace delay, and
//! the soft lock is held until the last remote typist has cleared. The lock
//! never blocks remote apply; it only makes the local surface read-only.

use std::collections::HashMap;
use std::time::Duration;

use smol_str::SmolStr;
use tandem_common::transport::{Collaborator, PresenceTracker};
use tokio::time::Instant;

use crate::presenter::Presenter;

/// How long a remote typist may stay silent before being cleared anyway.
///
/// Covers peers that vanish without sending `typing=false`. Edits from a
/// typist refresh the timer.
pub const STALE_TYPIST_AFTER: Duration = Duration::from_secs(30);

/// Combined typing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingPhase {
    Idle,
    LocalTyping,
    RemoteTyping,
    Both,
}

/// Typing state of one session.
#[derive(Debug)]
pub struct TypingState {
    local: bool,
    /// Whether this local run was announced with `typing=true`.
    announced: bool,
    presence: PresenceTracker,
    /// Pending clears after `typing=false`.
    grace_at: HashMap<SmolStr, Instant>,
    /// Clears for typists that went silent.
    stale_at: HashMap<SmolStr, Instant>,
    grace: Duration,
    soft_lock: bool,
    /// Read-only value from before the lock engaged. `Some` while locked.
    lock: Option<bool>,
}

impl TypingState {
    pub fn new(grace: Duration, soft_lock: bool) -> Self {
        Self {
            local: false,
            announced: false,
            presence: PresenceTracker::new(),
            grace_at: HashMap::new(),
            stale_at: HashMap::new(),
            grace,
            soft_lock,
            lock: None,
        }
    }

    pub fn phase(&self) -> TypingPhase {
        match (self.local, self.is_remote_typing()) {
            (false, false) => TypingPhase::Idle,
            (true, false) => TypingPhase::LocalTyping,
            (false, true) => TypingPhase::RemoteTyping,
            (true, true) => TypingPhase::Both,
        }
    }

    pub fn is_local_typing(&self) -> bool {
        self.local
    }

    pub fn is_remote_typing(&self) -> bool {
        self.presence.anyone_typing()
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_some()
    }

    pub fn typists(&self) -> impl Iterator<Item = &Collaborator> {
        self.presence.typists()
    }

    pub fn collaborators(&self) -> impl Iterator<Item = &Collaborator> {
        self.presence.collaborators()
    }

    /// Mark the local participant as typing.
    ///
    /// Returns true when `typing=true` should be published: only for the
    /// first edit after both sides were idle. A run that starts while a peer
    /// types is not announced.
    pub fn begin_local(&mut self) -> bool {
        let announce = self.phase() == TypingPhase::Idle;
        self.local = true;
        self.announced |= announce;
        announce
    }

    /// Mark the local participant idle. Returns true when the run was
    /// announced and `typing=false` should follow.
    pub fn end_local(&mut self) -> bool {
        let was_local = std::mem::replace(&mut self.local, false);
        let announced = std::mem::replace(&mut self.announced, false);
        was_local && announced
    }

    /// Apply a remote typing notification.
    pub fn remote_typing(
        &mut self,
        author: &str,
        display_name: Option<&str>,
        typing: bool,
        now: Instant,
        presenter: &mut impl Presenter,
    ) {
        if typing {
            let collab = self.presence.set_typing(author, display_name, true);
            self.grace_at.remove(author);
            self.stale_at.insert(collab.author.clone(), now + STALE_TYPIST_AFTER);
            tracing::debug!(%author, "remote typing started");
            if self.soft_lock && self.lock.is_none() {
                self.lock = Some(presenter.is_read_only());
                presenter.set_read_only(true);
            }
            presenter.show_remote_typing(collab);
        } else if self.presence.get(author).is_some_and(|c| c.typing) {
            // A repeated false keeps the earlier deadline
            self.grace_at.entry(author.into()).or_insert(now + self.grace);
        }
    }

    /// An edit arrived from `author`; they are evidently still around.
    pub fn heard_from(&mut self, author: &str, now: Instant) {
        if let Some(at) = self.stale_at.get_mut(author) {
            *at = now + STALE_TYPIST_AFTER;
        }
    }

    /// Next time `poll` has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.grace_at.values().chain(self.stale_at.values()).min().copied()
    }

    /// Clear remote typists whose time is up. Returns the cleared authors.
    pub fn poll(&mut self, now: Instant, presenter: &mut impl Presenter) -> Vec<SmolStr> {
        let mut expired: Vec<SmolStr> = self
            .grace_at
            .iter()
            .chain(self.stale_at.iter())
            .filter(|(_, at)| **at <= now)
            .map(|(author, _)| author.clone())
            .collect();
        if expired.is_empty() {
            return expired;
        }
        expired.sort();
        expired.dedup();

        for author in &expired {
            self.grace_at.remove(author);
            self.stale_at.remove(author);
            self.presence.set_typing(author, None, false);
            tracing::debug!(%author, "remote typing cleared");
        }

        let still_typing = self.presence.typists().next().cloned();
        match still_typing {
            Some(collab) => presenter.show_remote_typing(&collab),
            None => self.unlock(presenter),
        }
        expired
    }

    /// Drop all remote typists and release the lock, e.g. on leave.
    pub fn reset(&mut self, presenter: &mut impl Presenter) {
        self.local = false;
        self.announced = false;
        let typing: Vec<SmolStr> = self.presence.typists().map(|c| c.author.clone()).collect();
        for author in typing {
            self.presence.set_typing(&author, None, false);
        }
        self.grace_at.clear();
        self.stale_at.clear();
        self.unlock(presenter);
    }

    fn unlock(&mut self, presenter: &mut impl Presenter) {
        if let Some(prior) = self.lock.take() {
            presenter.set_read_only(prior);
        }
        presenter.hide_remote_typing();
    }
}
