//! Presence tracking for pairing sessions.
//!
//! Tracks remote collaborators, whether they are typing, and display info.

use std::collections::HashMap;

use smol_str::SmolStr;

/// A remote collaborator seen on the topic.
#[derive(Debug, Clone, PartialEq)]
pub struct Collaborator {
    /// Author id from the frame.
    pub author: SmolStr,
    /// Display name for UI. Falls back to the author id.
    pub display_name: SmolStr,
    /// Assigned colour (RGBA).
    pub color: u32,
    /// Whether the collaborator last reported typing.
    pub typing: bool,
}

/// Tracks all collaborators in a session.
#[derive(Debug, Default, Clone)]
pub struct PresenceTracker {
    collaborators: HashMap<SmolStr, Collaborator>,
    next_color_index: usize,
}

/// Predefined collaborator colours (pastel-ish for readability).
const COLLABORATOR_COLORS: [u32; 8] = [
    0xFF6B6BFF, // Red
    0x4ECDC4FF, // Teal
    0xFFE66DFF, // Yellow
    0x95E1D3FF, // Mint
    0xF38181FF, // Coral
    0xAA96DAFF, // Purple
    0xFCBF49FF, // Orange
    0x2EC4B6FF, // Cyan
];

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a collaborator's typing state, adding them if unseen.
    ///
    /// Returns the updated collaborator.
    pub fn set_typing(
        &mut self,
        author: &str,
        display_name: Option<&str>,
        typing: bool,
    ) -> &Collaborator {
        let next_color_index = &mut self.next_color_index;
        let collab = self
            .collaborators
            .entry(author.into())
            .or_insert_with(|| {
                let color = COLLABORATOR_COLORS[*next_color_index % COLLABORATOR_COLORS.len()];
                *next_color_index += 1;
                Collaborator {
                    author: author.into(),
                    display_name: display_name.unwrap_or(author).into(),
                    color,
                    typing,
                }
            });
        if let Some(name) = display_name {
            collab.display_name = name.into();
        }
        collab.typing = typing;
        collab
    }

    pub fn get(&self, author: &str) -> Option<&Collaborator> {
        self.collaborators.get(author)
    }

    /// Get all known collaborators.
    pub fn collaborators(&self) -> impl Iterator<Item = &Collaborator> {
        self.collaborators.values()
    }

    /// Collaborators currently typing.
    pub fn typists(&self) -> impl Iterator<Item = &Collaborator> {
        self.collaborators.values().filter(|c| c.typing)
    }

    /// Check if anyone is typing.
    pub fn anyone_typing(&self) -> bool {
        self.collaborators.values().any(|c| c.typing)
    }
}
