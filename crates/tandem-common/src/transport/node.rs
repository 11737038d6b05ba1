//! CollabNode - iroh endpoint with gossip router for pairing sessions.

use std::sync::Arc;

use iroh::Endpoint;
use iroh::EndpointId;
use iroh::SecretKey;
use iroh_gossip::net::{GOSSIP_ALPN, Gossip};

use crate::error::TransportError;

/// A collaboration node wrapping an iroh endpoint and gossip router.
///
/// There should be one CollabNode per process. It manages:
/// - The iroh QUIC endpoint (with relay fallback)
/// - The gossip protocol handler
/// - The protocol router for ALPN dispatch
pub struct CollabNode {
    endpoint: Endpoint,
    gossip: Gossip,
    // Dropping the router stops accepting gossip connections.
    _router: iroh::protocol::Router,
}

impl CollabNode {
    /// Spawn a new collaboration node.
    ///
    /// If no secret key is provided, a new one is generated, so every run
    /// gets a fresh node id.
    pub async fn spawn(secret_key: Option<SecretKey>) -> Result<Arc<Self>, TransportError> {
        let secret_key = secret_key.unwrap_or_else(|| SecretKey::generate(&mut rand::rng()));

        let endpoint = Endpoint::builder()
            .secret_key(secret_key)
            .alpns(vec![GOSSIP_ALPN.to_vec()])
            .bind()
            .await
            .map_err(|e| TransportError::Bind(Box::new(e)))?;

        let gossip = Gossip::builder().spawn(endpoint.clone());

        let router = iroh::protocol::Router::builder(endpoint.clone())
            .accept(GOSSIP_ALPN, gossip.clone())
            .spawn();

        tracing::info!(node_id = %endpoint.id(), "CollabNode started");

        Ok(Arc::new(Self {
            endpoint,
            gossip,
            _router: router,
        }))
    }

    /// This node's public identifier. Peers pass it to `--peer` to join.
    pub fn node_id(&self) -> EndpointId {
        self.endpoint.id()
    }

    /// Get a reference to the gossip handler for joining topics.
    pub fn gossip(&self) -> &Gossip {
        &self.gossip
    }

    /// Get a reference to the underlying endpoint.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Get the relay URL this node is connected to (if any).
    pub fn relay_url(&self) -> Option<String> {
        self.endpoint
            .addr()
            .relay_urls()
            .next()
            .map(|url| url.to_string())
    }

    /// Wait for the endpoint to be online (relay connected).
    pub async fn wait_online(&self) {
        self.endpoint.online().await;
    }
}
