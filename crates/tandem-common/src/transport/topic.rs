//! Room codes and the topic names derived from them.

use rand::Rng;
use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, format_smolstr};
use std::str::FromStr;

use crate::error::RoomCodeError;

/// Prefix of every room topic.
pub const TOPIC_PREFIX: &str = "pair_programming_";

const ROOM_CODE_MIN: u32 = 100_000;
const ROOM_CODE_MAX: u32 = 999_999;

/// A six-digit numeric room code, e.g. `482913`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(SmolStr);

impl RoomCode {
    /// Generate a random code in `[100000, 999999]`.
    pub fn generate() -> Self {
        let n = rand::rng().random_range(ROOM_CODE_MIN..=ROOM_CODE_MAX);
        Self(format_smolstr!("{n}"))
    }

    /// Validate user input as a room code.
    ///
    /// Surrounding whitespace is ignored; anything else must be exactly six
    /// ASCII digits without a leading zero.
    pub fn parse(input: &str) -> Result<Self, RoomCodeError> {
        let code = input.trim();
        let len = code.chars().count();
        if len != 6 {
            return Err(RoomCodeError::Length(len));
        }
        if !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RoomCodeError::NotNumeric(code.to_string()));
        }
        if code.starts_with('0') {
            return Err(RoomCodeError::LeadingZero(code.to_string()));
        }
        Ok(Self(code.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Topic every participant of this room subscribes to.
    pub fn topic(&self) -> Topic {
        Topic(format_smolstr!("{TOPIC_PREFIX}{}", self.0))
    }
}

impl FromStr for RoomCode {
    type Err = RoomCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = RoomCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0.to_string()
    }
}

impl std::fmt::Display for RoomCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of a broadcast topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic(SmolStr);

impl Topic {
    /// Topic with an arbitrary name, for transports shared with other tools.
    pub fn named(name: impl Into<SmolStr>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive a gossip topic id from the name.
    ///
    /// blake3 of the topic name gives every participant the same stable
    /// 32-byte id without coordination.
    #[cfg(feature = "iroh")]
    pub fn gossip_id(&self) -> iroh_gossip::TopicId {
        let hash = blake3::hash(self.0.as_bytes());
        iroh_gossip::TopicId::from_bytes(*hash.as_bytes())
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
