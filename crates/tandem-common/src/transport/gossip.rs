//! Gossip-backed transport: one iroh-gossip swarm per room topic.

use std::str::FromStr;
use std::sync::Arc;

use iroh::EndpointId;
use iroh_gossip::api::{Event, GossipReceiver, GossipSender};
use n0_future::StreamExt;
use n0_future::stream;

use super::{Ack, AckMode, Broadcast, Channel, CollabNode, Inbound, Topic, Transport};
use crate::error::TransportError;

/// Parse an EndpointId from its z-base32 string form.
pub fn parse_node_id(s: &str) -> Result<EndpointId, TransportError> {
    EndpointId::from_str(s.trim()).map_err(|e| TransportError::InvalidPeer {
        id: s.to_string(),
        source: Box::new(e),
    })
}

/// Opens room topics on a shared `CollabNode`.
#[derive(Clone)]
pub struct GossipTransport {
    node: Arc<CollabNode>,
    bootstrap: Vec<EndpointId>,
}

impl GossipTransport {
    /// Bootstrap peers are node ids of participants already in the room.
    /// The room creator passes none and waits for others to dial in.
    pub fn new(node: Arc<CollabNode>, bootstrap: Vec<EndpointId>) -> Self {
        Self { node, bootstrap }
    }

    pub fn node(&self) -> &Arc<CollabNode> {
        &self.node
    }
}

impl Transport for GossipTransport {
    type Channel = GossipChannel;

    async fn open(&self, topic: &Topic, _ack: AckMode) -> Result<GossipChannel, TransportError> {
        let (sender, receiver) = self
            .node
            .gossip()
            .subscribe(topic.gossip_id(), self.bootstrap.clone())
            .await
            .map_err(|e| TransportError::Subscribe {
                topic: topic.to_string(),
                source: Box::new(e),
            })?
            .split();

        tracing::info!(%topic, peers = self.bootstrap.len(), "joined gossip topic");

        Ok(GossipChannel {
            topic: topic.clone(),
            sender: Some(sender),
            receiver: Some(receiver),
            _node: self.node.clone(),
        })
    }
}

/// A channel on one gossip topic.
pub struct GossipChannel {
    topic: Topic,
    sender: Option<GossipSender>,
    receiver: Option<GossipReceiver>,
    _node: Arc<CollabNode>,
}

impl GossipChannel {
    /// Convert the gossip receiver into a stream of decoded frames.
    fn frame_stream(receiver: GossipReceiver) -> Inbound {
        let stream = stream::unfold(receiver, |mut receiver| async move {
            loop {
                match receiver.next().await {
                    Some(Ok(Event::Received(msg))) => match Broadcast::from_bytes(&msg.content) {
                        Ok(frame) => return Some((frame, receiver)),
                        Err(e) => {
                            tracing::warn!(from = %msg.delivered_from, ?e, "dropping undecodable frame");
                            continue;
                        }
                    },
                    Some(Ok(Event::NeighborUp(peer))) => {
                        tracing::debug!(%peer, "gossip neighbor up");
                    }
                    Some(Ok(Event::NeighborDown(peer))) => {
                        tracing::debug!(%peer, "gossip neighbor down");
                    }
                    Some(Ok(Event::Lagged)) => {
                        tracing::warn!("gossip receiver lagged, some messages may be lost");
                    }
                    Some(Err(e)) => {
                        tracing::warn!(?e, "gossip receiver error");
                    }
                    None => return None,
                }
            }
        });

        Box::pin(stream)
    }
}

impl Channel for GossipChannel {
    fn topic(&self) -> &Topic {
        &self.topic
    }

    fn subscribe(&mut self) -> Result<Inbound, TransportError> {
        if self.sender.is_none() {
            return Err(TransportError::Closed);
        }
        let receiver = self
            .receiver
            .take()
            .ok_or_else(|| TransportError::AlreadySubscribed {
                topic: self.topic.to_string(),
            })?;
        Ok(Self::frame_stream(receiver))
    }

    async fn publish(&self, frame: Broadcast) -> Result<Ack, TransportError> {
        let sender = self.sender.as_ref().ok_or(TransportError::Closed)?;
        let event = frame.event.to_string();
        let bytes = frame.to_bytes()?;

        sender
            .broadcast(bytes.into())
            .await
            .map_err(|e| TransportError::Publish {
                event,
                source: Box::new(e),
            })?;

        // Gossip cannot count receivers, so both modes report acceptance.
        Ok(Ack::Accepted)
    }

    async fn close(&mut self) {
        if self.sender.take().is_some() {
            self.receiver = None;
            tracing::info!(topic = %self.topic, "left gossip topic");
        }
    }
}
