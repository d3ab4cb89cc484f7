//! Per-channel broadcast hub
//!
//! One `Hub` owns a channel's subscriber set, a bounded ingress queue
//! and a fan-out task. The pipeline is lossy at two points by design:
//! the ingress queue and each subscriber's outbound queue both drop the
//! newest envelope when full, bounding tail latency instead of blocking.
//!
//! Invariants:
//!
//! - the fan-out task only ever takes a read lock on the subscriber set
//!   and never blocks on a slow subscriber
//! - exactly one writer task drains each subscriber's queue
//! - removing a subscriber closes its queue, which stops its writer

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Hub ingress queue capacity
pub const INGRESS_CAPACITY: usize = 1024;

/// Per-subscriber outbound queue capacity
pub const SUBSCRIBER_CAPACITY: usize = 256;

/// Counter for unique subscriber ids across all hubs
static SUBSCRIBER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// One registered subscriber: an id and the sending half of its queue
#[derive(Debug)]
pub struct HubSubscriber {
    id: u64,
    sender: mpsc::Sender<Bytes>,
}

impl HubSubscriber {
    fn new(sender: mpsc::Sender<Bytes>) -> Self {
        Self {
            id: SUBSCRIBER_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            sender,
        }
    }

    /// Non-blocking enqueue; `false` means the envelope was dropped
    #[inline]
    fn try_send(&self, envelope: Bytes) -> bool {
        self.sender.try_send(envelope).is_ok()
    }
}

/// Counters for one hub
#[derive(Debug, Default)]
pub struct HubMetrics {
    /// Envelopes accepted into the ingress queue
    pub broadcasts: AtomicU64,

    /// Envelopes dropped because the ingress queue was full
    pub ingress_drops: AtomicU64,

    /// Envelopes dropped at individual subscriber queues
    pub subscriber_drops: AtomicU64,
}

impl HubMetrics {
    /// Get a point-in-time snapshot
    pub fn snapshot(&self) -> HubMetricsSnapshot {
        HubMetricsSnapshot {
            broadcasts: self.broadcasts.load(Ordering::Relaxed),
            ingress_drops: self.ingress_drops.load(Ordering::Relaxed),
            subscriber_drops: self.subscriber_drops.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of hub counters
#[derive(Debug, Clone, Copy, Default)]
pub struct HubMetricsSnapshot {
    pub broadcasts: u64,
    pub ingress_drops: u64,
    pub subscriber_drops: u64,
}

/// A channel's subscriber set plus its fan-out machinery
pub struct Hub {
    channel: String,
    subscribers: RwLock<Vec<Arc<HubSubscriber>>>,
    ingress: mpsc::Sender<Bytes>,
    metrics: HubMetrics,
}

impl Hub {
    /// Create a hub and spawn its fan-out task
    ///
    /// The task runs until cancellation; the registry hands every hub a
    /// child token of the root shutdown signal.
    pub fn spawn(channel: impl Into<String>, cancel: CancellationToken) -> Arc<Self> {
        let (ingress, rx) = mpsc::channel(INGRESS_CAPACITY);
        let hub = Arc::new(Self {
            channel: channel.into(),
            subscribers: RwLock::new(Vec::new()),
            ingress,
            metrics: HubMetrics::default(),
        });

        tokio::spawn(Arc::clone(&hub).fan_out(rx, cancel));
        hub
    }

    /// The channel path this hub serves
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Hub counters
    pub fn metrics(&self) -> &HubMetrics {
        &self.metrics
    }

    /// Enqueue an envelope for fan-out
    ///
    /// Drop-newest on a full ingress queue: staleness is worse than gaps
    /// for a live log stream.
    pub fn broadcast(&self, envelope: Bytes) {
        match self.ingress.try_send(envelope) {
            Ok(()) => {
                self.metrics.broadcasts.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.metrics.ingress_drops.fetch_add(1, Ordering::Relaxed);
                debug!(channel = %self.channel, "ingress queue full, dropping envelope");
            }
        }
    }

    /// Register a subscriber
    ///
    /// Returns its id and the receiving half of its outbound queue; the
    /// caller owns the single writer task that drains it.
    pub fn subscribe(&self) -> (u64, mpsc::Receiver<Bytes>) {
        let (sender, receiver) = mpsc::channel(SUBSCRIBER_CAPACITY);
        let subscriber = Arc::new(HubSubscriber::new(sender));
        let id = subscriber.id;

        self.subscribers.write().push(subscriber);
        debug!(channel = %self.channel, id, "subscriber added");
        (id, receiver)
    }

    /// Deregister a subscriber and close its queue
    ///
    /// Idempotent: both the writer (on write failure) and the socket
    /// reader (on disconnect) may call this.
    pub fn remove(&self, id: u64) {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        if subscribers.len() != before {
            debug!(channel = %self.channel, id, "subscriber removed");
        }
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Remove every subscriber, closing all outbound queues
    ///
    /// Used at shutdown; writers see their queues close and end each
    /// socket with a normal-closure status.
    pub fn close_all(&self) {
        let mut subscribers = self.subscribers.write();
        let closed = subscribers.len();
        subscribers.clear();
        if closed > 0 {
            debug!(channel = %self.channel, closed, "all subscribers closed");
        }
    }

    /// The fan-out loop: one ingress envelope to every subscriber queue
    async fn fan_out(self: Arc<Self>, mut rx: mpsc::Receiver<Bytes>, cancel: CancellationToken) {
        loop {
            let envelope = tokio::select! {
                _ = cancel.cancelled() => break,
                maybe = rx.recv() => match maybe {
                    Some(envelope) => envelope,
                    None => break,
                },
            };

            let subscribers = self.subscribers.read();
            let mut sent = 0usize;
            for subscriber in subscribers.iter() {
                if subscriber.try_send(envelope.clone()) {
                    sent += 1;
                } else {
                    // Slow subscriber loses this envelope; nobody else does
                    self.metrics.subscriber_drops.fetch_add(1, Ordering::Relaxed);
                }
            }
            trace!(channel = %self.channel, sent, "fanned out envelope");
        }

        debug!(channel = %self.channel, "fan-out task stopped");
    }
}

#[cfg(test)]
#[path = "hub_test.rs"]
mod tests;
