//! LogHUD Tailer - Follow append-only log files across rotations
//!
//! One `FileTailer` owns every configured file's tail state and is driven
//! by filesystem notifications. For each file it delivers every line
//! appended after startup, exactly once, across both rotation patterns:
//!
//! - **truncate-in-place** (`copytruncate`): detected when the file
//!   shrinks below its last observed size; the tailer rewinds to zero
//! - **rename+create**: the handle is dropped on rename/remove and the
//!   parent-directory watch rebinds the path on the next create
//!
//! Lines are parsed (never fatally - see `loghud-parsers`) and emitted as
//! `RoutedRecord`s into a bounded channel. The channel is lossy by
//! design: when the dispatcher falls behind, new lines are dropped and
//! counted rather than blocking file reading.
//!
//! # Example
//!
//! ```ignore
//! let files = vec![TailedFileConfig::new("/var/log/nginx/access.log", "nginx-access", ["/logs/web"])];
//! let (tailer, records) = FileTailer::new(files, 1000)?;
//! tokio::spawn(tailer.run(cancel.clone()));
//!
//! while let Some(routed) = records.recv().await {
//!     // POST routed.record to routed.targets
//! }
//! ```

mod error;
mod metrics;
mod routed;
mod tailer;

pub use error::{Result, TailerError};
pub use metrics::{TailerMetrics, TailerMetricsSnapshot};
pub use routed::RoutedRecord;
pub use tailer::{FileTailer, TailedFileConfig};
