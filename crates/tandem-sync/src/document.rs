//! The buffer a session edits, and an in-memory implementation.

use std::future::Future;

use tandem_editor_core::{EditorRope, Position, TextBuffer, TextChange, TextRange};

use crate::capture::ChangeObserver;
use crate::error::DocumentError;
use crate::operation::Operation;

/// A text buffer owned by the editing surface.
///
/// Every mutation, local or remote, must be reported to the attached
/// `ChangeObserver` with its pre-change range. The observer decides whether
/// the change is captured.
pub trait Document {
    /// Full current content.
    fn text(&self) -> String;

    fn len_chars(&self) -> usize;

    /// Position of a char offset, clamped to the buffer.
    fn position_at(&self, offset: usize) -> Position;

    /// Position just past the last char.
    fn end_position(&self) -> Position;

    /// Replace `range` with `text`. Positions outside the buffer clamp.
    fn replace_range(
        &mut self,
        range: TextRange,
        text: &str,
    ) -> impl Future<Output = Result<(), DocumentError>> + Send;

    /// Start reporting changes to `observer`, replacing any previous one.
    fn attach(&mut self, observer: ChangeObserver);

    /// Stop reporting changes.
    fn detach(&mut self) -> Option<ChangeObserver>;
}

/// Rope-backed document living in memory.
#[derive(Clone, Default)]
pub struct MemoryDocument {
    rope: EditorRope,
    observer: Option<ChangeObserver>,
}

impl std::fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDocument")
            .field("len_chars", &self.rope.len_chars())
            .field("attached", &self.observer.is_some())
            .finish()
    }
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            rope: EditorRope::from_str(text),
            observer: None,
        }
    }

    /// Apply an edit immediately and report it. Returns the change as reported.
    pub fn edit(&mut self, range: TextRange, text: &str) -> Result<TextChange, DocumentError> {
        if !range.is_ordered() {
            return Err(DocumentError::Rejected {
                range,
                reason: "end is before start".into(),
            });
        }

        let chars = self.rope.char_range(range);
        let change = TextChange {
            range: TextRange::new(
                self.rope.position_at(chars.start),
                self.rope.position_at(chars.end),
            ),
            range_offset: chars.start,
            range_length: chars.len(),
            text: text.to_string(),
        };

        self.rope.replace(chars, text);

        if let Some(observer) = &self.observer {
            observer.notify(change.clone());
        }
        Ok(change)
    }

}

/// The insertion that adds `line` as a new last line of `document`.
///
/// A line break is put in front when the buffer does not already end on one.
pub fn appended_line(document: &impl Document, line: &str) -> Operation {
    let end = document.end_position();
    let text = if end.character == 0 {
        format!("{line}\n")
    } else {
        format!("\n{line}\n")
    };
    Operation::insert(end, text)
}

impl Document for MemoryDocument {
    fn text(&self) -> String {
        self.rope.to_string()
    }

    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn position_at(&self, offset: usize) -> Position {
        self.rope.position_at(offset)
    }

    fn end_position(&self) -> Position {
        self.rope.end_position()
    }

    fn replace_range(
        &mut self,
        range: TextRange,
        text: &str,
    ) -> impl Future<Output = Result<(), DocumentError>> + Send {
        // Mutates at call time, like editors that apply synchronously and
        // resolve a promise afterwards.
        std::future::ready(self.edit(range, text).map(|_| ()))
    }

    fn attach(&mut self, observer: ChangeObserver) {
        self.observer = Some(observer);
    }

    fn detach(&mut self) -> Option<ChangeObserver> {
        self.observer.take()
    }
}
