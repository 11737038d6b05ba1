//! In-process broadcast hub.
//!
//! Every `LocalChannel` opened on the same `LocalHub` and topic sees the
//! frames the others publish. Used for tests, demos and peers that share a
//! process.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use n0_future::stream;
use tokio::sync::{broadcast, watch};

use super::{Ack, AckMode, Broadcast, Channel, Inbound, Topic, Transport};
use crate::error::TransportError;

/// Frames buffered per subscriber before the slowest one starts lagging.
const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
struct Envelope {
    peer: u64,
    frame: Broadcast,
}

/// Shared registry of in-process topics.
#[derive(Clone)]
pub struct LocalHub {
    topics: Arc<Mutex<HashMap<Topic, broadcast::Sender<Envelope>>>>,
    next_peer: Arc<AtomicU64>,
    capacity: usize,
}

impl Default for LocalHub {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl LocalHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            topics: Arc::new(Mutex::new(HashMap::new())),
            next_peer: Arc::new(AtomicU64::new(1)),
            capacity,
        }
    }

    /// Number of live subscriptions on a topic.
    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        let topics = self.topics.lock().unwrap_or_else(|e| e.into_inner());
        topics.get(topic).map_or(0, |tx| tx.receiver_count())
    }

    fn sender(&self, topic: &Topic) -> broadcast::Sender<Envelope> {
        let mut topics = self.topics.lock().unwrap_or_else(|e| e.into_inner());
        topics
            .entry(topic.clone())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

impl Transport for LocalHub {
    type Channel = LocalChannel;

    async fn open(&self, topic: &Topic, ack: AckMode) -> Result<LocalChannel, TransportError> {
        let peer = self.next_peer.fetch_add(1, Ordering::Relaxed);
        let (closed_tx, _) = watch::channel(false);
        tracing::debug!(%topic, peer, "local channel opened");
        Ok(LocalChannel {
            topic: topic.clone(),
            peer,
            sender: self.sender(topic),
            closed: closed_tx,
            subscribed: false,
            ack,
        })
    }
}

/// One participant's handle on a `LocalHub` topic.
pub struct LocalChannel {
    topic: Topic,
    peer: u64,
    sender: broadcast::Sender<Envelope>,
    closed: watch::Sender<bool>,
    subscribed: bool,
    ack: AckMode,
}

impl LocalChannel {
    fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

impl Channel for LocalChannel {
    fn topic(&self) -> &Topic {
        &self.topic
    }

    fn subscribe(&mut self) -> Result<Inbound, TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        if self.subscribed {
            return Err(TransportError::AlreadySubscribed {
                topic: self.topic.to_string(),
            });
        }
        self.subscribed = true;

        let state = (self.sender.subscribe(), self.closed.subscribe(), self.peer);
        let stream = stream::unfold(state, |(mut rx, mut closed, me)| async move {
            loop {
                if *closed.borrow() {
                    return None;
                }
                tokio::select! {
                    received = rx.recv() => match received {
                        Ok(envelope) if envelope.peer == me => continue,
                        Ok(envelope) => return Some((envelope.frame, (rx, closed, me))),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "local subscriber lagged, frames lost");
                            continue;
                        }
                        Err(broadcast::error::RecvError::Closed) => return None,
                    },
                    changed = closed.changed() => {
                        if changed.is_err() {
                            return None;
                        }
                    }
                }
            }
        });
        Ok(Box::pin(stream))
    }

    async fn publish(&self, frame: Broadcast) -> Result<Ack, TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        let envelope = Envelope {
            peer: self.peer,
            frame,
        };
        // No live receivers is not a failure for a broadcast.
        let receivers = self.sender.send(envelope).unwrap_or(0);
        let others = receivers.saturating_sub(usize::from(self.subscribed));
        Ok(match self.ack {
            AckMode::Confirmed => Ack::Delivered(others),
            AckMode::FireAndForget => Ack::Accepted,
        })
    }

    async fn close(&mut self) {
        if !self.is_closed() {
            self.closed.send_replace(true);
            tracing::debug!(topic = %self.topic, peer = self.peer, "local channel closed");
        }
    }
}
