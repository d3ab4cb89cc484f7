//! Periodic status logging for daemon mode

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use loghud_tailer::TailerMetrics;

use crate::dispatcher::DispatcherMetrics;

/// How often daemon mode reports status
const STATUS_INTERVAL: Duration = Duration::from_secs(30);

/// Log tailer and dispatcher counters until cancellation
pub async fn run(
    tailer: Arc<TailerMetrics>,
    dispatcher: Arc<DispatcherMetrics>,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(STATUS_INTERVAL);
    // The immediate first tick is not a useful report
    interval.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let t = tailer.snapshot();
                let d = dispatcher.snapshot();
                info!(
                    lines_emitted = t.lines_emitted,
                    lines_dropped = t.lines_dropped,
                    truncations = t.truncations,
                    reopens = t.reopens,
                    io_errors = t.io_errors,
                    posts_ok = d.posts_ok,
                    posts_failed = d.posts_failed,
                    "status"
                );
            }
        }
    }
}
