//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating agent configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or create the configuration file
    #[error("failed to access config file '{path}': {source}")]
    Io {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse YAML
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// No file entries configured
    #[error("at least one file must be configured")]
    NoFiles,

    /// A file entry is missing its path
    #[error("file entry {index} has an empty path")]
    EmptyPath {
        /// Position in the `files` list
        index: usize,
    },

    /// A file entry declares an unrecognized format
    #[error("file '{path}' declares unknown format '{format}'")]
    UnknownFormat {
        /// Path of the offending entry
        path: String,
        /// The rejected format string
        format: String,
    },

    /// A file entry has no target paths
    #[error("file '{path}' has no target uri paths")]
    NoTargets {
        /// Path of the offending entry
        path: String,
    },
}

impl ConfigError {
    /// Create an Io error
    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an UnknownFormat error
    pub fn unknown_format(path: impl Into<String>, format: impl Into<String>) -> Self {
        Self::UnknownFormat {
            path: path.into(),
            format: format.into(),
        }
    }
}
