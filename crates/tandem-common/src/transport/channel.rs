//! The transport contract consumed by sync sessions.
//!
//! Delivery is at-least-once. Frames from one sender arrive in the order they
//! were published; there is no total order across senders. A channel never
//! hands a participant its own frames back.

use std::future::Future;

use n0_future::StreamExt;
use n0_future::boxed::BoxStream;

use super::{Broadcast, Topic};
use crate::error::TransportError;

/// Stream of frames received on a topic.
pub type Inbound = BoxStream<Broadcast>;

/// Whether publishes wait for the transport to confirm the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AckMode {
    #[default]
    Confirmed,
    FireAndForget,
}

/// Successful publish outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    /// The transport counted the peers that received the frame.
    Delivered(usize),
    /// The transport took the frame; delivery is not observable.
    Accepted,
}

/// Opens channels on named topics.
pub trait Transport {
    type Channel: Channel;

    /// Open a channel on a topic.
    fn open(
        &self,
        topic: &Topic,
        ack: AckMode,
    ) -> impl Future<Output = Result<Self::Channel, TransportError>> + Send;
}

/// A handle to one open topic.
pub trait Channel {
    /// Topic this channel is bound to.
    fn topic(&self) -> &Topic;

    /// Start receiving frames published by other participants.
    fn subscribe(&mut self) -> Result<Inbound, TransportError>;

    /// Publish a frame to every other participant.
    ///
    /// Failures are returned as-is; retrying is the caller's decision.
    fn publish(
        &self,
        frame: Broadcast,
    ) -> impl Future<Output = Result<Ack, TransportError>> + Send;

    /// Leave the topic. Later publishes fail with `TransportError::Closed`.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Narrow a subscription to a single event name.
pub fn only_event(inbound: Inbound, event: &'static str) -> Inbound {
    Box::pin(inbound.filter(move |frame| frame.event == event))
}
