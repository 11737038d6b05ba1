//! tandem-editor-core: text addressing shared by the sync engine and editor hosts.
//!
//! This crate provides:
//! - `Position` / `TextRange` - line/character addressing, the buffer's native unit
//! - `TextChange` - a change notification as an editor reports it
//! - `TextBuffer` trait for text storage abstraction
//! - `EditorRope` - ropey-backed implementation

pub mod text;
pub mod types;

pub use smol_str::SmolStr;
pub use text::{EditorRope, TextBuffer};
pub use types::{Position, TextChange, TextRange};
