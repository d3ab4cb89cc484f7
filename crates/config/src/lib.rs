//! jslwatcher Configuration
//!
//! YAML-based configuration for the tailing agent. Loading a path that
//! does not exist writes a default config there first, so a fresh
//! install starts with something sensible to edit.
//!
//! # Example
//!
//! ```yaml
//! files:
//!   - path: /var/log/nginx/access.log
//!     format: nginx-access
//!     paths: ["/logs/default"]
//! general:
//!   log_level: info
//!   buffer_size: 1000
//!   retry_count: 3
//!   retry_delay: "5s"
//!   max_file_size: "100MB"
//! ```

mod error;

pub use error::{ConfigError, Result};

use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use loghud_parsers::KNOWN_FORMATS;

/// Default location of the agent config file
pub const DEFAULT_CONFIG_PATH: &str = "/etc/jslwatcher/jslwatcher.conf";

/// Agent configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Files to tail and where to route their records
    pub files: Vec<FileConfig>,

    /// Agent-wide settings
    pub general: GeneralConfig,
}

/// One tailed file and its routing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Absolute path of the log file
    pub path: String,

    /// Parser format (`jsonlines`, `nginx-access`, `nginx-error`,
    /// `java-log`, `php-error`)
    pub format: String,

    /// URI paths the records are POSTed to (e.g. `/events/app1`)
    pub paths: Vec<String>,
}

/// Agent-wide settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Agent log level (`debug|info|warn|error`)
    pub log_level: String,

    /// Capacity of the tailer → dispatcher channel
    pub buffer_size: usize,

    /// Informational; the POST path does a single attempt per destination
    pub retry_count: u32,

    /// Informational; duration string such as `"5s"`
    #[serde(with = "humantime_serde")]
    pub retry_delay: Duration,

    /// Informational; size string such as `"100MB"`
    pub max_file_size: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            buffer_size: 1000,
            retry_count: 3,
            retry_delay: Duration::from_secs(5),
            max_file_size: "100MB".into(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file, creating it with defaults
    /// when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or created, the
    /// YAML is invalid, or validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            Self::default_config().save(path)?;
        }

        let contents =
            fs::read_to_string(path).map_err(|e| ConfigError::io(path.display().to_string(), e))?;

        Self::from_str(&contents)
    }

    /// Write this configuration to a YAML file, creating parent
    /// directories as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::io(path.display().to_string(), e))?;
        }

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml).map_err(|e| ConfigError::io(path.display().to_string(), e))
    }

    /// The configuration written on first start
    pub fn default_config() -> Self {
        Self {
            files: vec![
                FileConfig {
                    path: "/var/log/nginx/access.log".into(),
                    format: "nginx-access".into(),
                    paths: vec!["/logs/default".into()],
                },
                FileConfig {
                    path: "/var/log/nginx/error.log".into(),
                    format: "nginx-error".into(),
                    paths: vec!["/logs/errors".into()],
                },
            ],
            general: GeneralConfig::default(),
        }
    }

    /// Validate the configuration
    ///
    /// Checks that at least one file is configured and that every entry
    /// has a path, a recognized format and at least one target path.
    pub fn validate(&self) -> Result<()> {
        if self.files.is_empty() {
            return Err(ConfigError::NoFiles);
        }

        for (index, file) in self.files.iter().enumerate() {
            if file.path.is_empty() {
                return Err(ConfigError::EmptyPath { index });
            }
            if !KNOWN_FORMATS.contains(&file.format.as_str()) {
                return Err(ConfigError::unknown_format(&file.path, &file.format));
            }
            if file.paths.is_empty() {
                return Err(ConfigError::NoTargets {
                    path: file.path.clone(),
                });
            }
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
