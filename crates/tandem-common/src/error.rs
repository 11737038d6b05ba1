//! Error types shared across tandem crates.

use miette::Diagnostic;
use std::path::PathBuf;

/// Error type for transport operations.
///
/// Failures are reported to the caller and never retried at this layer.
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum TransportError {
    #[error("failed to bind endpoint")]
    #[diagnostic(code(tandem::transport::bind))]
    Bind(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("invalid peer id {id:?}")]
    #[diagnostic(
        code(tandem::transport::peer),
        help("peer ids are the node ids printed by `tandem host`")
    )]
    InvalidPeer {
        id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to subscribe to topic {topic}")]
    #[diagnostic(code(tandem::transport::subscribe))]
    Subscribe {
        topic: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("topic {topic} already has a subscriber")]
    #[diagnostic(
        code(tandem::transport::subscribe),
        help("a channel hands out its receive side once; open a new channel instead")
    )]
    AlreadySubscribed { topic: String },

    #[error("failed to publish {event}")]
    #[diagnostic(code(tandem::transport::publish))]
    Publish {
        event: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to decode broadcast frame")]
    #[diagnostic(code(tandem::transport::decode))]
    Decode(#[source] serde_json::Error),

    #[error("unsupported frame version {found} (newest understood is {supported})")]
    #[diagnostic(code(tandem::transport::version))]
    UnsupportedVersion { found: u16, supported: u16 },

    #[error("channel closed")]
    #[diagnostic(code(tandem::transport::closed))]
    Closed,
}

/// Error type for room code parsing.
#[derive(Debug, thiserror::Error, Diagnostic, PartialEq, Eq)]
#[diagnostic(code(tandem::room))]
pub enum RoomCodeError {
    #[error("room code must be exactly 6 characters, got {0}")]
    #[diagnostic(help("room codes are six digits between 100000 and 999999"))]
    Length(usize),

    #[error("room code must be numeric: {0:?}")]
    #[diagnostic(help("room codes are six digits between 100000 and 999999"))]
    NotNumeric(String),

    #[error("room code cannot start with 0: {0:?}")]
    #[diagnostic(help(
        "generated codes are always between 100000 and 999999, so a leading 0 is a typo; check the code your peer sent"
    ))]
    LeadingZero(String),
}

/// Configuration errors.
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config at {}", path.display())]
    #[diagnostic(code(tandem::config::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported config format for {}", path.display())]
    #[diagnostic(code(tandem::config::format), help("use a .json or .toml file"))]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to parse config: {message}")]
    #[diagnostic(code(tandem::config::parse))]
    Parse { message: String },

    #[error("invalid value for {var}: {value:?}")]
    #[diagnostic(code(tandem::config::env))]
    InvalidEnv { var: &'static str, value: String },

    #[error("{field} is {value} ms, the most allowed is {max} ms")]
    #[diagnostic(code(tandem::config::range))]
    OutOfRange {
        field: &'static str,
        value: u64,
        max: u64,
    },
}
