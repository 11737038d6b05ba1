//! Operation-based sync engine for pair editing.
//!
//! This crate provides:
//! - `Operation` / `OperationBatch`: range-replace edits and their wire form
//! - `LoopbackGuard`: scoped suppression so applied remote edits are not echoed
//! - `ChangeObserver` / `Debouncer`: local capture and trailing-edge batching
//! - `apply_batch` / `apply_hard_sync`: remote apply and whole-buffer resync
//! - `TypingState`: per-author typing tracking and the advisory soft lock
//! - `Session`: the driver tying a document, a presenter and a channel together
//!
//! There is no merge: concurrent edits to overlapping ranges can leave peers
//! diverged. The typing lock and debounce make that unlikely and a hard sync
//! repairs it.

mod apply;
mod capture;
mod coordinator;
mod document;
mod error;
mod guard;
mod hard_sync;
mod operation;
mod presenter;
mod session;
mod typing;
pub mod wire;

pub use apply::apply_batch;
pub use capture::{ChangeObserver, Debouncer, Flush, FlushReason, LocalChanges};
pub use coordinator::SessionState;
pub use document::{Document, MemoryDocument, appended_line};
pub use error::{DocumentError, SyncError, ValidationError};
pub use guard::{LoopbackGuard, SuppressionScope};
pub use hard_sync::{apply_hard_sync, snapshot};
pub use operation::{Operation, OperationBatch, encode};
pub use presenter::{Notice, NoticeLevel, Presenter, RecordingPresenter};
pub use session::{Command, Session};
pub use typing::{STALE_TYPIST_AFTER, TypingPhase, TypingState};
pub use wire::{HardSyncPayload, SyncMessage, TypingPayload};

pub use tandem_editor_core::{Position, TextChange, TextRange};
