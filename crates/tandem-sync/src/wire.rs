//! Event payloads carried in `Broadcast` frames.
//!
//! | event         | payload                                   |
//! |---------------|-------------------------------------------|
//! | `code_change` | array of `{start, end, text}` operations  |
//! | `typing`      | `{username, isTyping}`                    |
//! | `hard_sync`   | `{content}`                               |
//!
//! Older peers sent a single operation object for `code_change`, a bare
//! `{typing}` payload, and sometimes named the typing event `user_typing`.
//! All of those are still read.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tandem_common::TransportError;
use tandem_common::transport::{Broadcast, WIRE_VERSION};

use crate::error::{SyncError, ValidationError};
use crate::operation::OperationBatch;

pub const CODE_CHANGE: &str = "code_change";
pub const TYPING: &str = "typing";
pub const HARD_SYNC: &str = "hard_sync";

const LEGACY_TYPING: &str = "user_typing";

/// Typing notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<SmolStr>,
    #[serde(alias = "typing")]
    pub is_typing: bool,
}

/// Whole-buffer replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardSyncPayload {
    pub content: String,
}

/// A decoded event.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncMessage {
    CodeChange(OperationBatch),
    Typing(TypingPayload),
    HardSync(HardSyncPayload),
}

impl SyncMessage {
    pub fn typing(username: impl Into<SmolStr>, is_typing: bool) -> Self {
        Self::Typing(TypingPayload {
            username: Some(username.into()),
            is_typing,
        })
    }

    pub fn event(&self) -> &'static str {
        match self {
            Self::CodeChange(_) => CODE_CHANGE,
            Self::Typing(_) => TYPING,
            Self::HardSync(_) => HARD_SYNC,
        }
    }

    /// Wrap in a current-version frame.
    pub fn to_broadcast(&self, from: &str) -> Result<Broadcast, SyncError> {
        let payload = match self {
            Self::CodeChange(batch) => serde_json::to_value(batch),
            Self::Typing(typing) => serde_json::to_value(typing),
            Self::HardSync(sync) => serde_json::to_value(sync),
        }
        .map_err(|source| SyncError::Encode {
            event: self.event().into(),
            source,
        })?;
        Ok(Broadcast::new(self.event(), from, payload))
    }

    /// Decode a frame. Unknown events yield `Ok(None)`.
    pub fn from_broadcast(frame: &Broadcast) -> Result<Option<Self>, SyncError> {
        if frame.version > WIRE_VERSION {
            return Err(TransportError::UnsupportedVersion {
                found: frame.version,
                supported: WIRE_VERSION,
            }
            .into());
        }

        let message = match frame.event.as_str() {
            CODE_CHANGE => Self::CodeChange(decode(frame)?),
            TYPING | LEGACY_TYPING => Self::Typing(decode(frame)?),
            HARD_SYNC => Self::HardSync(decode(frame)?),
            _ => return Ok(None),
        };
        Ok(Some(message))
    }
}

fn decode<T: serde::de::DeserializeOwned>(frame: &Broadcast) -> Result<T, ValidationError> {
    T::deserialize(&frame.payload).map_err(|e| ValidationError::Payload {
        event: frame.event.clone(),
        message: e.to_string(),
    })
}
