//! Channel registry
//!
//! Maps channel paths to their hubs, creating them on first use. Hubs
//! are never garbage-collected: the set is bounded by the channel names
//! seen over the process lifetime.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::hub::Hub;

/// Registry of per-channel hubs
pub struct HubRegistry {
    hubs: RwLock<HashMap<String, Arc<Hub>>>,
    cancel: CancellationToken,
}

impl HubRegistry {
    /// Create a registry; hubs spawned from it stop on `cancel`
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            hubs: RwLock::new(HashMap::new()),
            cancel,
        }
    }

    /// Get the hub for a channel, creating it on first use
    ///
    /// Creation spawns the hub's fan-out task. Idempotent under
    /// concurrent callers; the critical sections are a map lookup or a
    /// single insert.
    pub fn hub_for(&self, channel: &str) -> Arc<Hub> {
        if let Some(hub) = self.hubs.read().get(channel) {
            return Arc::clone(hub);
        }

        let mut hubs = self.hubs.write();
        Arc::clone(hubs.entry(channel.to_string()).or_insert_with(|| {
            info!(channel, "creating hub");
            Hub::spawn(channel, self.cancel.child_token())
        }))
    }

    /// Number of channels seen so far
    pub fn channel_count(&self) -> usize {
        self.hubs.read().len()
    }

    /// Close every subscriber on every hub (shutdown path)
    pub fn shutdown(&self) {
        let hubs = self.hubs.read();
        for hub in hubs.values() {
            hub.close_all();
        }
        info!(channels = hubs.len(), "registry shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hub_for_is_create_on_miss_and_idempotent() {
        let registry = HubRegistry::new(CancellationToken::new());
        assert_eq!(registry.channel_count(), 0);

        let first = registry.hub_for("/logs/app");
        assert_eq!(registry.channel_count(), 1);

        let second = registry.hub_for("/logs/app");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.channel_count(), 1);

        registry.hub_for("/logs/other");
        assert_eq!(registry.channel_count(), 2);
    }

    #[tokio::test]
    async fn test_registry_key_is_the_exact_channel_string() {
        let registry = HubRegistry::new(CancellationToken::new());
        let with_slash = registry.hub_for("/logs/app/");
        let without = registry.hub_for("/logs/app");
        assert!(!Arc::ptr_eq(&with_slash, &without));
    }

    #[tokio::test]
    async fn test_shutdown_closes_subscribers() {
        let registry = HubRegistry::new(CancellationToken::new());
        let hub = registry.hub_for("/x");
        let (_id, mut rx) = hub.subscribe();

        registry.shutdown();
        assert_eq!(hub.subscriber_count(), 0);
        assert!(rx.recv().await.is_none());
    }
}
