//! Wire frame for everything published on a room topic.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::TransportError;

/// Newest frame version this build writes and understands.
///
/// Version 0 frames are the unversioned legacy shape: the same fields with no
/// `version` key.
pub const WIRE_VERSION: u16 = 1;

/// A named event broadcast to every participant on a topic.
///
/// The payload is opaque to the transport; the sync engine owns its schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Broadcast {
    /// Frame version, absent on legacy frames.
    #[serde(default)]
    pub version: u16,
    /// Event name, e.g. `code_change`.
    pub event: SmolStr,
    /// Author id of the sender.
    #[serde(default)]
    pub from: SmolStr,
    /// Event payload.
    pub payload: serde_json::Value,
}

impl Broadcast {
    /// Build a current-version frame.
    pub fn new(
        event: impl Into<SmolStr>,
        from: impl Into<SmolStr>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            version: WIRE_VERSION,
            event: event.into(),
            from: from.into(),
            payload,
        }
    }

    /// Serialize the frame to JSON bytes for wire transmission.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TransportError> {
        serde_json::to_vec(self).map_err(TransportError::Decode)
    }

    /// Deserialize a frame from JSON bytes, rejecting versions from the future.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransportError> {
        let frame: Self = serde_json::from_slice(bytes).map_err(TransportError::Decode)?;
        if frame.version > WIRE_VERSION {
            return Err(TransportError::UnsupportedVersion {
                found: frame.version,
                supported: WIRE_VERSION,
            });
        }
        Ok(frame)
    }
}
