//! Record dispatcher
//!
//! Drains the tailer's record channel and POSTs each record as JSON to
//! every configured URI path on every built-in cluster base. A failed
//! destination is logged and never blocks its siblings.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use loghud_tailer::RoutedRecord;

/// Cluster ingest origins the agent ships with
pub const BUILT_IN_BASES: &[&str] = &["https://future.some.im", "https://future.wxside.com"];

/// Per-request timeout
const POST_TIMEOUT: Duration = Duration::from_secs(3);

/// Counters for one dispatcher
#[derive(Debug, Default)]
pub struct DispatcherMetrics {
    /// Records taken off the channel
    pub records: AtomicU64,

    /// Successful POSTs
    pub posts_ok: AtomicU64,

    /// Failed POSTs (transport errors, counted per destination)
    pub posts_failed: AtomicU64,
}

impl DispatcherMetrics {
    /// Get a point-in-time snapshot
    pub fn snapshot(&self) -> DispatcherMetricsSnapshot {
        DispatcherMetricsSnapshot {
            records: self.records.load(Ordering::Relaxed),
            posts_ok: self.posts_ok.load(Ordering::Relaxed),
            posts_failed: self.posts_failed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of dispatcher counters
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatcherMetricsSnapshot {
    pub records: u64,
    pub posts_ok: u64,
    pub posts_failed: u64,
}

/// POSTs routed records to the cluster
pub struct Dispatcher {
    receiver: mpsc::Receiver<RoutedRecord>,
    bases: Vec<String>,
    client: reqwest::Client,
    metrics: Arc<DispatcherMetrics>,
}

impl Dispatcher {
    /// Create a dispatcher draining `receiver` toward the built-in bases
    pub fn new(receiver: mpsc::Receiver<RoutedRecord>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(POST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            receiver,
            bases: BUILT_IN_BASES.iter().map(|b| b.to_string()).collect(),
            client,
            metrics: Arc::new(DispatcherMetrics::default()),
        }
    }

    /// Override the cluster bases (tests point this at a local server)
    #[must_use]
    pub fn with_bases(mut self, bases: Vec<String>) -> Self {
        self.bases = bases;
        self
    }

    /// Shared counters for status reporting
    pub fn metrics(&self) -> Arc<DispatcherMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Drain records until cancellation or the channel closes.
    ///
    /// An in-flight record finishes its POSTs (bounded by the request
    /// timeout) before cancellation is observed.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(bases = ?self.bases, "dispatcher started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                maybe = self.receiver.recv() => match maybe {
                    Some(routed) => self.dispatch(routed).await,
                    None => break,
                },
            }
        }

        info!("dispatcher stopped");
    }

    /// POST one record to every target path on every base
    async fn dispatch(&self, routed: RoutedRecord) {
        self.metrics.records.fetch_add(1, Ordering::Relaxed);

        let body = match serde_json::to_vec(&routed.record) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "failed to serialize record");
                return;
            }
        };

        for target in routed.targets.iter() {
            if target.is_empty() {
                continue;
            }
            let path = if target.starts_with('/') {
                target.clone()
            } else {
                format!("/{target}")
            };

            for base in &self.bases {
                let url = format!("{}{}", base.trim_end_matches('/'), path);
                match self
                    .client
                    .post(&url)
                    .header("Content-Type", "application/json")
                    .body(body.clone())
                    .send()
                    .await
                {
                    Ok(response) => {
                        self.metrics.posts_ok.fetch_add(1, Ordering::Relaxed);
                        debug!(url = %url, status = %response.status(), "record posted");
                    }
                    Err(e) => {
                        self.metrics.posts_failed.fetch_add(1, Ordering::Relaxed);
                        warn!(url = %url, error = %e, "post failed");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_test.rs"]
mod tests;
