//! Tailer counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one `FileTailer`
///
/// Shared with the agent's status task through an `Arc`.
#[derive(Debug, Default)]
pub struct TailerMetrics {
    /// Lines emitted into the dispatcher channel
    pub lines_emitted: AtomicU64,

    /// Lines dropped because the dispatcher channel was full
    pub lines_dropped: AtomicU64,

    /// Truncate-in-place rotations handled
    pub truncations: AtomicU64,

    /// Files (re)opened after create events
    pub reopens: AtomicU64,

    /// I/O errors that reset a file to waiting-for-create
    pub io_errors: AtomicU64,
}

impl TailerMetrics {
    /// Create a zeroed metrics instance
    pub const fn new() -> Self {
        Self {
            lines_emitted: AtomicU64::new(0),
            lines_dropped: AtomicU64::new(0),
            truncations: AtomicU64::new(0),
            reopens: AtomicU64::new(0),
            io_errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_emitted(&self) {
        self.lines_emitted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dropped(&self) {
        self.lines_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_truncation(&self) {
        self.truncations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_reopen(&self) {
        self.reopens.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_io_error(&self) {
        self.io_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a point-in-time snapshot
    pub fn snapshot(&self) -> TailerMetricsSnapshot {
        TailerMetricsSnapshot {
            lines_emitted: self.lines_emitted.load(Ordering::Relaxed),
            lines_dropped: self.lines_dropped.load(Ordering::Relaxed),
            truncations: self.truncations.load(Ordering::Relaxed),
            reopens: self.reopens.load(Ordering::Relaxed),
            io_errors: self.io_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of tailer counters
#[derive(Debug, Clone, Copy, Default)]
pub struct TailerMetricsSnapshot {
    pub lines_emitted: u64,
    pub lines_dropped: u64,
    pub truncations: u64,
    pub reopens: u64,
    pub io_errors: u64,
}
