//! Core addressing types: positions, ranges and change notifications.
//!
//! These types are editor-agnostic. Hosts translate their own change events
//! into `TextChange` and the sync engine works purely in these terms.

use serde::{Deserialize, Serialize};

/// A location in the buffer.
///
/// Both fields are zero-based. `character` counts Unicode scalar values (chars)
/// from the start of the line, NOT bytes or UTF-16 units.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

impl Position {
    pub const ZERO: Self = Self {
        line: 0,
        character: 0,
    };

    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.character)
    }
}

/// A half-open span `[start, end)` between two positions.
///
/// Derived `Ord` on `Position` compares line first, then character, which is
/// document order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRange {
    pub start: Position,
    pub end: Position,
}

impl TextRange {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// A collapsed range (insertion point).
    pub fn at(position: Position) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    /// Check if start is not after end.
    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }

    /// Check if the range is collapsed.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl std::fmt::Display for TextRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A single content change as reported by the editor.
///
/// `range` is expressed against the buffer as it was *before* this change.
/// When an editor reports several changes for one edit, each is relative to
/// the buffer after the previous ones were applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextChange {
    /// Replaced range, pre-change coordinates.
    pub range: TextRange,
    /// Char offset of `range.start`.
    pub range_offset: usize,
    /// Length of the replaced range in chars.
    pub range_length: usize,
    /// Text that replaced the range.
    pub text: String,
}

impl TextChange {
    /// Check if this change only inserts text.
    pub fn is_insertion(&self) -> bool {
        self.range_length == 0 && !self.text.is_empty()
    }

    /// Check if this change only removes text.
    pub fn is_deletion(&self) -> bool {
        self.range_length > 0 && self.text.is_empty()
    }
}
