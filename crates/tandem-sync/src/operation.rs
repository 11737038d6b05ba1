//! Operations: the unit of incremental change sent between peers.
//!
//! An `Operation` replaces `[start, end)` with `text`. Operations in an
//! `OperationBatch` are applied in order, each against the buffer as left by
//! the ones before it. This is how editors report successive changes, so a
//! batch can be replayed without rebasing.

use serde::{Deserialize, Serialize};
use tandem_editor_core::{EditorRope, Position, TextBuffer, TextChange, TextRange};

use crate::error::ValidationError;

/// Replace a range with text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(flatten)]
    pub range: TextRange,
    pub text: String,
}

impl Operation {
    pub fn new(range: TextRange, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    pub fn insert(at: Position, text: impl Into<String>) -> Self {
        Self::new(TextRange::at(at), text)
    }

    pub fn delete(range: TextRange) -> Self {
        Self::new(range, String::new())
    }

    pub fn replace(range: TextRange, text: impl Into<String>) -> Self {
        Self::new(range, text)
    }

    /// Check that the range is in document order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.range.is_ordered() {
            Ok(())
        } else {
            Err(ValidationError::ReversedRange {
                start: self.range.start,
                end: self.range.end,
            })
        }
    }

    /// The range to hand back to the buffer.
    pub fn to_native_range(&self) -> Result<TextRange, ValidationError> {
        self.validate()?;
        Ok(self.range)
    }

    pub fn is_insertion(&self) -> bool {
        self.range.is_empty()
    }

    pub fn is_deletion(&self) -> bool {
        !self.range.is_empty() && self.text.is_empty()
    }

    /// Apply to a string, clamping positions the way a buffer does.
    pub fn apply_to_text(&self, text: &str) -> String {
        let mut rope = EditorRope::from_str(text);
        self.apply_to(&mut rope);
        rope.to_string()
    }

    fn apply_to(&self, buffer: &mut impl TextBuffer) {
        let chars = buffer.char_range(self.range);
        buffer.replace(chars, &self.text);
    }
}

/// Map an editor change notification to an operation.
pub fn encode(change: &TextChange) -> Result<Operation, ValidationError> {
    let op = Operation::new(change.range, change.text.clone());
    op.validate()?;
    Ok(op)
}

/// Ordered operations, applied progressively.
///
/// Serializes as a JSON array. A bare operation object is also accepted and
/// read as a batch of one, which is what older peers sent for single edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BatchRepr", into = "Vec<Operation>")]
pub struct OperationBatch(Vec<Operation>);

#[derive(Deserialize)]
#[serde(untagged)]
enum BatchRepr {
    Many(Vec<Operation>),
    One(Operation),
}

impl From<BatchRepr> for OperationBatch {
    fn from(repr: BatchRepr) -> Self {
        match repr {
            BatchRepr::Many(ops) => Self(ops),
            BatchRepr::One(op) => Self(vec![op]),
        }
    }
}

impl From<OperationBatch> for Vec<Operation> {
    fn from(batch: OperationBatch) -> Self {
        batch.0
    }
}

impl From<Vec<Operation>> for OperationBatch {
    fn from(ops: Vec<Operation>) -> Self {
        Self(ops)
    }
}

impl FromIterator<Operation> for OperationBatch {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for OperationBatch {
    type Item = Operation;
    type IntoIter = std::vec::IntoIter<Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a OperationBatch {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl OperationBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: Operation) {
        self.0.push(op);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Operation] {
        &self.0
    }

    /// Validate every operation. One bad operation rejects the whole batch.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (index, op) in self.0.iter().enumerate() {
            op.validate().map_err(|e| ValidationError::InBatch {
                index,
                source: Box::new(e),
            })?;
        }
        Ok(())
    }

    /// Apply every operation in order to a string.
    pub fn apply_to_text(&self, text: &str) -> String {
        let mut rope = EditorRope::from_str(text);
        for op in &self.0 {
            op.apply_to(&mut rope);
        }
        rope.to_string()
    }
}
