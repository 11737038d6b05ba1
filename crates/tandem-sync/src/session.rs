//! A pairing session: one room, one channel, one document.
//!
//! The session owns everything that used to be ambient state: the channel
//! handle, the loopback guard, the debouncer and the typing state. All of it
//! is driven from a single task. `run` multiplexes local changes, inbound
//! frames, user commands and timers; the step methods it calls are public so
//! callers can drive a session by hand.

use n0_future::StreamExt;
use rand::Rng;
use smol_str::{SmolStr, format_smolstr};
use tandem_common::SyncSettings;
use tandem_common::TransportError;
use tandem_common::transport::{
    Ack, Broadcast, Channel, Collaborator, Inbound, RoomCode, Transport,
};
use tandem_editor_core::{TextChange, TextRange};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::apply::apply_batch;
use crate::capture::{ChangeObserver, Debouncer, Flush, FlushReason, LocalChanges};
use crate::coordinator::SessionState;
use crate::document::{Document, appended_line};
use crate::error::{DocumentError, SyncError};
use crate::guard::LoopbackGuard;
use crate::hard_sync::{apply_hard_sync, snapshot};
use crate::operation::encode;
use crate::presenter::{Notice, Presenter};
use crate::typing::TypingState;
use crate::wire::SyncMessage;

/// User requests fed into `Session::run`.
#[derive(Debug)]
pub enum Command {
    /// Edit the local document as the user.
    Edit { range: TextRange, text: String },
    /// Add a line at the end of the document as the user.
    AppendLine(String),
    /// Overwrite every peer's buffer with ours.
    HardSync,
    /// Reply with the current document text.
    Snapshot(oneshot::Sender<String>),
    /// Reply with everyone heard from in the room.
    Collaborators(oneshot::Sender<Vec<Collaborator>>),
    Leave,
}

/// One participant's membership in a room.
pub struct Session<C: Channel, D: Document, P: Presenter> {
    room: RoomCode,
    author: SmolStr,
    settings: SyncSettings,
    channel: C,
    document: D,
    presenter: P,
    guard: LoopbackGuard,
    changes: LocalChanges,
    debouncer: Debouncer,
    typing: TypingState,
    state: SessionState,
}

impl<C: Channel, D: Document, P: Presenter> std::fmt::Debug for Session<C, D, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("room", &self.room)
            .field("author", &self.author)
            .field("state", &self.state)
            .field("pending", &self.debouncer.pending().len())
            .finish_non_exhaustive()
    }
}

/// Unique per-session author id, so two participants sharing a name are
/// still told apart.
fn author_id(username: &str) -> SmolStr {
    let suffix: u16 = rand::rng().random();
    format_smolstr!("{username}-{suffix:04x}")
}

impl<C: Channel, D: Document, P: Presenter> Session<C, D, P> {
    /// Open the room's topic, subscribe and start observing the document.
    ///
    /// Returns the session and its inbound frame stream; hand both to `run`,
    /// or drive them with the step methods.
    pub async fn join<T>(
        transport: &T,
        room: RoomCode,
        settings: SyncSettings,
        mut document: D,
        mut presenter: P,
    ) -> Result<(Self, Inbound), SyncError>
    where
        T: Transport<Channel = C>,
    {
        presenter.state_changed(&SessionState::Connecting);
        let topic = room.topic();

        let opened = async {
            let mut channel = transport.open(&topic, settings.ack).await?;
            let inbound = channel.subscribe()?;
            Ok::<_, TransportError>((channel, inbound))
        }
        .await;
        let (channel, inbound) = match opened {
            Ok(opened) => opened,
            Err(e) => {
                tracing::warn!(%room, error = %e, "failed to join room");
                let state = SessionState::Error(format_smolstr!("{e}"));
                presenter.state_changed(&state);
                presenter.notify(Notice::error(format!("could not join room {room}: {e}")));
                return Err(e.into());
            }
        };

        let guard = LoopbackGuard::new();
        let (observer, changes) = ChangeObserver::new(guard.clone());
        document.attach(observer);

        let author = author_id(&settings.username);
        let state = SessionState::Active { room: room.clone() };
        presenter.state_changed(&state);
        presenter.notify(Notice::info(format!("connected to room {room}")));
        tracing::info!(%room, %author, "joined pairing room");

        let session = Self {
            debouncer: Debouncer::new(settings.debounce, settings.max_wait),
            typing: TypingState::new(settings.typing_grace, settings.soft_lock),
            room,
            author,
            settings,
            channel,
            document,
            presenter,
            guard,
            changes,
            state,
        };
        Ok((session, inbound))
    }

    pub fn room(&self) -> &RoomCode {
        &self.room
    }

    /// Id stamped on every frame this session sends.
    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    /// Mutable access for the editing surface. Edits made here are reported
    /// through the observer and captured like any other local edit.
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn typing(&self) -> &TypingState {
        &self.typing
    }

    pub fn guard(&self) -> &LoopbackGuard {
        &self.guard
    }

    /// Operations captured but not yet published.
    pub fn pending_ops(&self) -> usize {
        self.debouncer.pending().len()
    }

    /// Earliest timer the session needs to wake for.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.debouncer.deadline(), self.typing.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Edit the document on behalf of the local user.
    ///
    /// Refused while the surface is read-only, which includes the soft lock
    /// held while a peer types.
    pub async fn edit(&mut self, range: TextRange, text: &str) -> Result<(), SyncError> {
        if self.presenter.is_read_only() {
            return Err(DocumentError::ReadOnly.into());
        }
        self.document.replace_range(range, text).await?;
        self.pump_local_changes().await?;
        Ok(())
    }

    /// Add `line` as a new last line, as the local user.
    pub async fn append_line(&mut self, line: &str) -> Result<(), SyncError> {
        let op = appended_line(&self.document, line);
        self.edit(op.range, &op.text).await
    }

    /// Move every queued local change into the pending batch.
    ///
    /// Returns how many changes were captured.
    pub async fn pump_local_changes(&mut self) -> Result<usize, SyncError> {
        let mut captured = 0;
        while let Ok(change) = self.changes.try_recv() {
            self.capture(change).await?;
            captured += 1;
        }
        Ok(captured)
    }

    async fn capture(&mut self, change: TextChange) -> Result<(), SyncError> {
        let op = encode(&change)?;
        self.debouncer.push(op, Instant::now());
        if self.typing.begin_local() {
            let typing = SyncMessage::typing(self.settings.username.clone(), true);
            self.publish(&typing).await?;
        }
        Ok(())
    }

    /// Fire whatever timers are due at `now`.
    pub async fn poll_timers(&mut self, now: Instant) -> Result<(), SyncError> {
        while let Some(flush) = self.debouncer.poll(now) {
            self.flush(flush).await?;
        }
        self.typing.poll(now, &mut self.presenter);
        Ok(())
    }

    async fn flush(&mut self, flush: Flush) -> Result<(), SyncError> {
        let Flush { batch, reason } = flush;
        if !batch.is_empty() {
            let ops = batch.len();
            let ack = self.publish(&SyncMessage::CodeChange(batch)).await?;
            metrics::counter!("tandem_ops_published_total").increment(ops as u64);
            tracing::debug!(room = %self.room, ops, ?reason, ?ack, "published batch");
        }
        if reason == FlushReason::Quiet && self.typing.end_local() {
            let typing = SyncMessage::typing(self.settings.username.clone(), false);
            self.publish(&typing).await?;
        }
        Ok(())
    }

    /// Send the whole buffer to every peer.
    ///
    /// Pending operations are dropped first: peers take the snapshot as is,
    /// and replaying older operations on top of it would corrupt them.
    pub async fn hard_sync(&mut self) -> Result<(), SyncError> {
        self.pump_local_changes().await?;
        let dropped = self.debouncer.discard();
        let payload = snapshot(&self.document);
        let chars = payload.content.chars().count();
        self.publish(&SyncMessage::HardSync(payload)).await?;
        metrics::counter!("tandem_hard_syncs_total", "direction" => "sent").increment(1);
        tracing::info!(room = %self.room, chars, dropped, "sent hard sync");
        self.presenter.notify(Notice::info("sent full buffer to peers"));
        Ok(())
    }

    /// Handle one inbound frame.
    pub async fn handle_broadcast(&mut self, frame: Broadcast) -> Result<(), SyncError> {
        if frame.from == self.author {
            tracing::trace!(event = %frame.event, "ignoring own frame");
            return Ok(());
        }
        let Some(message) = SyncMessage::from_broadcast(&frame)? else {
            tracing::debug!(event = %frame.event, "ignoring unknown event");
            return Ok(());
        };

        let now = Instant::now();
        match message {
            SyncMessage::CodeChange(batch) => {
                self.typing.heard_from(&frame.from, now);
                // Changes the user made since the last pump are positioned
                // against the buffer before this batch; capture them first.
                self.pump_local_changes().await?;
                let applied = apply_batch(&mut self.document, &self.guard, &batch).await?;
                metrics::counter!("tandem_batches_applied_total").increment(1);
                tracing::debug!(room = %self.room, from = %frame.from, ops = applied, "applied batch");
            }
            SyncMessage::Typing(typing) => {
                let author = if frame.from.is_empty() {
                    typing.username.clone().unwrap_or_else(|| SmolStr::new_static("peer"))
                } else {
                    frame.from.clone()
                };
                self.typing.remote_typing(
                    &author,
                    typing.username.as_deref(),
                    typing.is_typing,
                    now,
                    &mut self.presenter,
                );
            }
            SyncMessage::HardSync(payload) => {
                self.pump_local_changes().await?;
                let dropped = self.debouncer.discard();
                apply_hard_sync(&mut self.document, &self.guard, &payload).await?;
                metrics::counter!("tandem_hard_syncs_total", "direction" => "received")
                    .increment(1);
                tracing::info!(room = %self.room, from = %frame.from, dropped, "applied hard sync");
                self.presenter
                    .notify(Notice::warn("buffer replaced by a peer's hard sync"));
            }
        }
        Ok(())
    }

    async fn publish(&mut self, message: &SyncMessage) -> Result<Ack, SyncError> {
        let frame = message.to_broadcast(&self.author)?;
        match self.channel.publish(frame).await {
            Ok(ack) => Ok(ack),
            Err(e) => {
                metrics::counter!("tandem_publish_failures_total", "event" => message.event())
                    .increment(1);
                tracing::warn!(room = %self.room, event = message.event(), error = %e, "publish failed");
                self.presenter
                    .notify(Notice::error(format!("failed to send {}: {e}", message.event())));
                Err(e.into())
            }
        }
    }

    /// Flush what is pending, announce we stopped typing and close the channel.
    ///
    /// Publish failures here are logged and do not stop the session closing.
    pub async fn leave(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        if let Err(e) = self.pump_local_changes().await {
            tracing::warn!(error = %e, "failed to capture final changes");
        }
        let batch = self.debouncer.take();
        if !batch.is_empty() {
            let flush = Flush {
                batch,
                reason: FlushReason::Quiet,
            };
            if let Err(e) = self.flush(flush).await {
                tracing::warn!(error = %e, "failed to flush on leave");
            }
        } else if self.typing.end_local() {
            let typing = SyncMessage::typing(self.settings.username.clone(), false);
            if let Err(e) = self.publish(&typing).await {
                tracing::warn!(error = %e, "failed to clear typing on leave");
            }
        }

        self.typing.reset(&mut self.presenter);
        self.document.detach();
        self.channel.close().await;
        self.state = SessionState::Closed;
        self.presenter.state_changed(&self.state);
        tracing::info!(room = %self.room, "left pairing room");
    }

    /// Surface a failed step to the presenter.
    pub fn report(&mut self, error: &SyncError) {
        match error {
            // Already shown when the publish failed
            SyncError::Transport(_) => {}
            SyncError::Document(DocumentError::ReadOnly) => {
                let message = if self.typing.is_locked() {
                    "buffer is locked while a peer is typing"
                } else {
                    "buffer is read-only"
                };
                self.presenter.notify(Notice::warn(message));
            }
            other => {
                tracing::warn!(room = %self.room, error = %other, "sync step failed");
                self.presenter.notify(Notice::error(other.to_string()));
            }
        }
    }

    /// Drive the session until `Leave`, the command channel closing, or the
    /// inbound stream ending.
    ///
    /// Step failures are reported to the presenter and the loop carries on.
    /// Nothing is retried.
    pub async fn run(
        &mut self,
        mut inbound: Inbound,
        mut commands: mpsc::Receiver<Command>,
    ) -> Result<(), SyncError> {
        loop {
            let deadline = self.next_deadline();
            let step = tokio::select! {
                biased;

                Some(change) = self.changes.recv() => {
                    match self.capture(change).await {
                        Ok(()) => self.pump_local_changes().await.map(|_| ()),
                        Err(e) => Err(e),
                    }
                }
                frame = inbound.next() => match frame {
                    Some(frame) => self.handle_broadcast(frame).await,
                    None => {
                        tracing::warn!(room = %self.room, "inbound stream ended");
                        self.state = SessionState::Error("connection lost".into());
                        self.presenter.state_changed(&self.state);
                        self.presenter.notify(Notice::error("connection to the room was lost"));
                        self.channel.close().await;
                        return Err(TransportError::Closed.into());
                    }
                },
                command = commands.recv() => match command {
                    Some(Command::Edit { range, text }) => self.edit(range, &text).await,
                    Some(Command::AppendLine(line)) => self.append_line(&line).await,
                    Some(Command::HardSync) => self.hard_sync().await,
                    // A requester that gave up is not an error
                    Some(Command::Snapshot(reply)) => {
                        let _ = reply.send(self.document.text());
                        Ok(())
                    }
                    Some(Command::Collaborators(reply)) => {
                        let _ = reply.send(self.typing.collaborators().cloned().collect());
                        Ok(())
                    }
                    Some(Command::Leave) | None => {
                        self.leave().await;
                        return Ok(());
                    }
                },
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.poll_timers(Instant::now()).await
                }
            };

            if let Err(e) = step {
                self.report(&e);
            }
        }
    }
}
