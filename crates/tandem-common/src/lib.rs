//! Shared infrastructure for tandem: transport, configuration, telemetry.

pub mod config;
pub mod error;
#[cfg(feature = "telemetry")]
pub mod telemetry;
pub mod transport;

pub use crate::config::{Config, FileStore, Loader, Saver, SyncSettings};
pub use crate::error::{ConfigError, RoomCodeError, TransportError};
pub use smol_str::SmolStr;

#[cfg(feature = "iroh")]
pub use blake3;
