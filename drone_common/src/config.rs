//! Configuration loading traits and types.
//!
//! Every binary in the workspace reads a single TOML file. The file embeds a
//! `[shared]` section ([`SharedConfig`]) next to its own tables and is loaded
//! through the blanket [`ConfigLoader`] implementation.
//!
//! ```rust,no_run
//! use drone_common::config::{ConfigError, ConfigLoader, SharedConfig};
//! use serde::Deserialize;
//! use std::path::Path;
//!
//! #[derive(Debug, Deserialize)]
//! struct PilotConfig {
//!     shared: SharedConfig,
//!     entity_id: String,
//! }
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = PilotConfig::load(Path::new("drone.toml"))?;
//!     println!("{} tracks {}", config.shared.service_name, config.entity_id);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error raised while reading or parsing a configuration file.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// No file at the given path.
    #[error("configuration file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The file exists but could not be read.
    #[error("failed to read {}: {reason}", .path.display())]
    Read {
        /// Offending file.
        path: PathBuf,
        /// Underlying I/O error text.
        reason: String,
    },

    /// TOML syntax or schema mismatch.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantically invalid value.
    #[error("configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log verbosity accepted in the `[shared]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Per-message tracing.
    Trace,
    /// Periodic loop statistics.
    Debug,
    /// Lifecycle events.
    #[default]
    Info,
    /// Rejected input and overruns.
    Warn,
    /// Fatal conditions only.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Fields every service config carries.
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "drone-pilot-01"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Instance name, used as a log span field.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_service_name() -> String {
    "drone-control".to_string()
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: default_service_name(),
        }
    }
}

impl SharedConfig {
    /// Reject an empty service name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load a deserializable type from TOML.
///
/// `FileNotFound` for a missing path, `Read` for other I/O failures and
/// `ParseError` for invalid TOML. Validation is left to the caller.
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Read and parse `path`.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound(path.to_path_buf())
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }
            }
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse an in-memory TOML document.
    fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
