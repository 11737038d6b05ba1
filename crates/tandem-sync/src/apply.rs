//! Applying remote batches to the local document.

use crate::document::Document;
use crate::error::{DocumentError, SyncError};
use crate::guard::LoopbackGuard;
use crate::operation::OperationBatch;

/// Apply a remote batch under loopback suppression.
///
/// The whole batch is validated first; a malformed batch changes nothing.
/// Operations then run in order, each against the buffer the previous one
/// left behind. A document failure part way through stops the batch, releases
/// the guard and is returned. Operations already applied stay applied.
///
/// Returns the number of operations applied.
pub async fn apply_batch<D: Document>(
    document: &mut D,
    guard: &LoopbackGuard,
    batch: &OperationBatch,
) -> Result<usize, SyncError> {
    batch.validate()?;

    let applied = guard
        .run_suppressed(move || async move {
            for op in batch {
                document.replace_range(op.range, &op.text).await?;
            }
            Ok::<_, DocumentError>(batch.len())
        })
        .await?;

    tracing::debug!(ops = applied, "applied remote batch");
    Ok(applied)
}
