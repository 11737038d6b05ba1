//! Error types for the sync engine.

use miette::Diagnostic;
use smol_str::SmolStr;
use tandem_common::TransportError;
use tandem_editor_core::{Position, TextRange};
use thiserror::Error;

/// A malformed operation or payload. Rejected, never applied.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("range end {end} is before start {start}")]
    #[diagnostic(code(tandem::sync::reversed_range))]
    ReversedRange { start: Position, end: Position },

    #[error("operation {index} of the batch is malformed")]
    #[diagnostic(code(tandem::sync::batch))]
    InBatch {
        index: usize,
        #[source]
        source: Box<ValidationError>,
    },

    #[error("malformed {event} payload: {message}")]
    #[diagnostic(code(tandem::sync::payload))]
    Payload { event: SmolStr, message: String },
}

/// Failures reported by a `Document`.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DocumentError {
    #[error("document is read-only")]
    #[diagnostic(
        code(tandem::document::read_only),
        help("a peer is typing; wait for them to pause or turn off the soft lock")
    )]
    ReadOnly,

    #[error("cannot replace {range}: {reason}")]
    #[diagnostic(code(tandem::document::rejected))]
    Rejected { range: TextRange, reason: String },
}

/// Anything a session step can fail with.
#[derive(Error, Debug, Diagnostic)]
pub enum SyncError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Document(#[from] DocumentError),

    #[error("failed to encode {event} payload")]
    #[diagnostic(code(tandem::sync::encode))]
    Encode {
        event: SmolStr,
        #[source]
        source: serde_json::Error,
    },
}

impl SyncError {
    /// Errors that end the session rather than a single step.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::Transport(TransportError::Closed))
    }
}
