//! Hub configuration from the environment
//!
//! The hub is configured entirely through environment variables:
//!
//! - `PORT` - listen port (default `8080`)
//! - `NODE_ID` - this hub's identity in the cluster (default `node-local`)
//! - `CLUSTER_KEY` - shared HMAC key; an insecure dev default is used
//!   (and warned about) when unset
//! - `PEERS` - comma-separated peer base URLs

use std::env;

use tracing::warn;

use crate::error::{HubError, Result};

/// Fallback key so a single dev hub starts without setup
const DEV_CLUSTER_KEY: &str = "dev-demo-key-please-change";

/// Hub runtime configuration
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Listen port
    pub port: u16,

    /// Identity stamped into `_meta.originNodeId`
    pub node_id: String,

    /// Shared cluster HMAC key
    pub cluster_key: Vec<u8>,

    /// Peer hub base URLs (e.g. `https://hub-b.example.com`)
    pub peers: Vec<String>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            node_id: "node-local".into(),
            cluster_key: DEV_CLUSTER_KEY.as_bytes().to_vec(),
            peers: Vec::new(),
        }
    }
}

impl HubConfig {
    /// Read configuration from the process environment
    ///
    /// # Errors
    ///
    /// Fails when `PORT` is present but not a valid port number.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(port) = env::var("PORT") {
            config.port = port
                .parse()
                .map_err(|_| HubError::Config(format!("invalid PORT '{port}'")))?;
        }

        if let Ok(node_id) = env::var("NODE_ID") {
            if !node_id.is_empty() {
                config.node_id = node_id;
            }
        }

        match env::var("CLUSTER_KEY") {
            Ok(key) if !key.is_empty() => config.cluster_key = key.into_bytes(),
            _ => warn!("CLUSTER_KEY not set, using insecure dev default"),
        }

        if let Ok(peers) = env::var("PEERS") {
            config.peers = parse_peers(&peers);
        }

        Ok(config)
    }

    /// Builder-style peer list override
    #[must_use]
    pub fn with_peers(mut self, peers: Vec<String>) -> Self {
        self.peers = peers;
        self
    }

    /// Builder-style node id override
    #[must_use]
    pub fn with_node_id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = node_id.into();
        self
    }
}

/// Split a comma-separated peer list, trimming and dropping empties
fn parse_peers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}
