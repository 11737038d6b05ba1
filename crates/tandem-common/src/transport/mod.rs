//! Broadcast transport for real-time pairing sessions.
//!
//! This module provides the infrastructure every session talks through:
//! - `Transport` / `Channel`: the abstract open/subscribe/publish/close contract
//! - `LocalHub`: in-process broadcast hub (tests, demos, same-process peers)
//! - `CollabNode` / `GossipTransport`: iroh endpoint + gossip (feature `iroh`)
//! - `Broadcast`: the versioned frame carried on every topic
//! - `RoomCode` / `Topic`: room naming
//! - `PresenceTracker`: who is around and who is typing

mod channel;
#[cfg(feature = "iroh")]
mod gossip;
mod local;
mod messages;
#[cfg(feature = "iroh")]
mod node;
mod presence;
mod topic;

pub use channel::{Ack, AckMode, Channel, Inbound, Transport, only_event};
#[cfg(feature = "iroh")]
pub use gossip::{GossipChannel, GossipTransport, parse_node_id};
#[cfg(feature = "iroh")]
pub use iroh::EndpointId;
pub use local::{LocalChannel, LocalHub};
pub use messages::{Broadcast, WIRE_VERSION};
#[cfg(feature = "iroh")]
pub use node::CollabNode;
pub use presence::{Collaborator, PresenceTracker};
pub use topic::{RoomCode, TOPIC_PREFIX, Topic};
