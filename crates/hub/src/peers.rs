//! Peer replication
//!
//! Re-POSTs accepted envelopes to every configured peer hub. The
//! `X-LogHUD-Origin` header is the loop-prevention token: receivers
//! forward only requests that arrive without it, so a publish fans out
//! across the cluster exactly once.

use std::time::Duration;

use bytes::Bytes;
use tracing::debug;

/// Header marking a request as an already-forwarded copy
pub const ORIGIN_HEADER: &str = "X-LogHUD-Origin";

/// Per-peer request timeout
const PEER_TIMEOUT: Duration = Duration::from_secs(2);

/// Forwards envelopes to peer hubs
#[derive(Clone)]
pub struct PeerForwarder {
    node_id: String,
    peers: Vec<String>,
    client: reqwest::Client,
}

impl PeerForwarder {
    /// Create a forwarder for this node's peer list
    pub fn new(node_id: impl Into<String>, peers: Vec<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(PEER_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            node_id: node_id.into(),
            peers,
            client,
        }
    }

    /// Whether any peers are configured
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// POST the envelope bytes verbatim to `peer_base + channel` on
    /// every peer. Failures are swallowed: peer replication is
    /// opportunistic and never surfaces to the original publisher.
    pub async fn forward(&self, channel: &str, envelope: Bytes) {
        for peer in &self.peers {
            let url = format!("{}{}", peer.trim_end_matches('/'), channel);
            let result = self
                .client
                .post(&url)
                .header("Content-Type", "application/json")
                .header(ORIGIN_HEADER, &self.node_id)
                .body(envelope.clone())
                .send()
                .await;

            if let Err(e) = result {
                debug!(peer = %url, error = %e, "peer forward failed");
            }
        }
    }
}
