//! Error types for the tailer crate

use std::io;
use thiserror::Error;

/// Result type for tailer operations
pub type Result<T> = std::result::Result<T, TailerError>;

/// Errors that can occur while setting up or driving the tailer
#[derive(Debug, Error)]
pub enum TailerError {
    /// I/O error on a tailed file
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Filesystem notifier error
    #[error("notifier error: {0}")]
    Notify(#[from] notify::Error),

    /// A configured file declares a format without a parser
    #[error("no parser for format '{format}'")]
    UnknownFormat {
        /// The rejected format string
        format: String,
    },
}
