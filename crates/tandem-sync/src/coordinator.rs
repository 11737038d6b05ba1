//! Session lifecycle state.

use smol_str::SmolStr;
use tandem_common::transport::RoomCode;

/// Session state machine states.
///
/// Tracks the lifecycle of a pairing session from joining through leaving.
/// Presenters use this to show appropriate status indicators.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// Opening and subscribing to the room topic.
    #[default]
    Connecting,
    /// Exchanging edits in a room.
    Active {
        room: RoomCode,
    },
    /// Left the room.
    Closed,
    /// The channel failed; the session no longer syncs.
    Error(SmolStr),
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Active { room } => write!(f, "pairing in room {room}"),
            Self::Closed => write!(f, "closed"),
            Self::Error(msg) => write!(f, "error: {msg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_state_default() {
        assert_eq!(SessionState::default(), SessionState::Connecting);
    }

    #[test]
    fn test_session_state_display() {
        let room = RoomCode::parse("482913").unwrap();
        assert_eq!(
            SessionState::Active { room }.to_string(),
            "pairing in room 482913"
        );
        assert_eq!(
            SessionState::Error("channel closed".into()).to_string(),
            "error: channel closed"
        );
    }
}
