//! Text buffer abstraction for editor storage.
//!
//! The `TextBuffer` trait provides a common interface for text storage, so the
//! sync engine can address any backend by line/character positions.

use std::ops::Range;

use crate::types::{Position, TextRange};

/// A text buffer that supports efficient editing and offset conversion.
///
/// All offsets are in Unicode scalar values (chars), not bytes or UTF-16.
pub trait TextBuffer {
    /// Total length in chars (Unicode scalar values).
    fn len_chars(&self) -> usize;

    /// Check if empty.
    fn is_empty(&self) -> bool {
        self.len_chars() == 0
    }

    /// Number of lines. An empty buffer has one line, and a trailing line
    /// break opens a new, empty last line.
    fn len_lines(&self) -> usize;

    /// Length of a line in chars, excluding its line break.
    /// Returns None if the line does not exist.
    fn line_len(&self, line: usize) -> Option<usize>;

    /// Char offset of the first char of a line.
    /// Returns None if the line does not exist.
    fn line_start(&self, line: usize) -> Option<usize>;

    /// Insert text at char offset.
    fn insert(&mut self, char_offset: usize, text: &str);

    /// Delete char range.
    fn delete(&mut self, char_range: Range<usize>);

    /// Replace char range with text.
    fn replace(&mut self, char_range: Range<usize>, text: &str) {
        self.delete(char_range.clone());
        self.insert(char_range.start, text);
    }

    /// Get character at offset. Returns None if out of bounds.
    fn char_at(&self, char_offset: usize) -> Option<char>;

    /// Convert entire buffer to String.
    fn to_string(&self) -> String;

    /// Position of a char offset. Offsets past the end clamp to the end.
    fn position_at(&self, char_offset: usize) -> Position;

    /// Char offset of a position, clamped like an editor validates positions:
    /// a character past the line end lands on the line end, a line past the
    /// last line lands on the end of the buffer.
    fn offset_at(&self, position: Position) -> usize {
        match (self.line_start(position.line), self.line_len(position.line)) {
            (Some(start), Some(len)) => start + position.character.min(len),
            _ => self.len_chars(),
        }
    }

    /// Position just past the last char.
    fn end_position(&self) -> Position {
        self.position_at(self.len_chars())
    }

    /// Char range covered by a position range, after clamping.
    fn char_range(&self, range: TextRange) -> Range<usize> {
        self.offset_at(range.start)..self.offset_at(range.end)
    }
}

/// Ropey-backed text buffer for local editing.
///
/// Provides O(log n) editing operations and offset conversions.
#[derive(Clone, Default)]
pub struct EditorRope {
    rope: ropey::Rope,
}

impl EditorRope {
    /// Create a new empty rope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from string.
    pub fn from_str(s: &str) -> Self {
        Self {
            rope: ropey::Rope::from_str(s),
        }
    }

    /// Get a reference to the underlying rope (for advanced operations).
    pub fn rope(&self) -> &ropey::Rope {
        &self.rope
    }
}

impl TextBuffer for EditorRope {
    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    fn line_len(&self, line: usize) -> Option<usize> {
        if line >= self.rope.len_lines() {
            return None;
        }
        let slice = self.rope.line(line);
        let mut len = slice.len_chars();
        // Strip "\n", "\r\n" or a lone "\r".
        if len > 0 && slice.char(len - 1) == '\n' {
            len -= 1;
        }
        if len > 0 && slice.char(len - 1) == '\r' {
            len -= 1;
        }
        Some(len)
    }

    fn line_start(&self, line: usize) -> Option<usize> {
        if line >= self.rope.len_lines() {
            return None;
        }
        Some(self.rope.line_to_char(line))
    }

    fn insert(&mut self, char_offset: usize, text: &str) {
        self.rope.insert(char_offset, text);
    }

    fn delete(&mut self, char_range: Range<usize>) {
        self.rope.remove(char_range);
    }

    fn char_at(&self, char_offset: usize) -> Option<char> {
        if char_offset >= self.len_chars() {
            return None;
        }
        Some(self.rope.char(char_offset))
    }

    fn to_string(&self) -> String {
        self.rope.to_string()
    }

    fn position_at(&self, char_offset: usize) -> Position {
        let offset = char_offset.min(self.rope.len_chars());
        let line = self.rope.char_to_line(offset);
        let character = offset - self.rope.line_to_char(line);
        Position { line, character }
    }
}

impl From<&str> for EditorRope {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}

impl From<String> for EditorRope {
    fn from(s: String) -> Self {
        Self::from_str(&s)
    }
}
