//! Whole-document reconciliation.
//!
//! A hard sync overwrites the receiver's buffer with the sender's, no diffing
//! and no merge. It is the escape hatch when peers have drifted apart.

use tandem_editor_core::{Position, TextRange};

use crate::document::Document;
use crate::error::DocumentError;
use crate::guard::LoopbackGuard;
use crate::wire::HardSyncPayload;

/// Capture the full buffer for sending.
pub fn snapshot<D: Document>(document: &D) -> HardSyncPayload {
    HardSyncPayload {
        content: document.text(),
    }
}

/// Replace the whole buffer with `payload`, suppressed.
pub async fn apply_hard_sync<D: Document>(
    document: &mut D,
    guard: &LoopbackGuard,
    payload: &HardSyncPayload,
) -> Result<(), DocumentError> {
    guard
        .run_suppressed(move || async move {
            let whole = TextRange::new(Position::ZERO, document.end_position());
            document.replace_range(whole, &payload.content).await
        })
        .await
}
