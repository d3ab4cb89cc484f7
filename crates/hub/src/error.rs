//! Error types for the hub

use std::io;
use thiserror::Error;

/// Result type for hub operations
pub type Result<T> = std::result::Result<T, HubError>;

/// Errors that can occur in the hub
#[derive(Debug, Error)]
pub enum HubError {
    /// Failed to bind the listen address
    #[error("failed to bind {address}: {source}")]
    Bind {
        /// The address that could not be bound
        address: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// I/O error while serving
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Envelope (de)serialization failed
    #[error("envelope error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Envelope construction failed
    #[error("envelope error: {0}")]
    Envelope(String),

    /// Invalid environment configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}
