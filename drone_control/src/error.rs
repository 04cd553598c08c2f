//! Error taxonomy of the control core.
//!
//! Errors stay local to the activity that raised them. Ingestion failures
//! are logged and dropped; only configuration and thread management errors
//! ever reach the caller of the coordinator.

use drone_common::config::ConfigError;
use thiserror::Error;

/// Errors raised by the control core.
#[derive(Debug, Error)]
pub enum ControlError {
    /// Malformed operator directive. State is left unchanged.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// No position has been received yet.
    #[error("no position received yet")]
    StaleState,

    /// Invalid construction parameters. The control loop does not start.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An activity thread could not be created.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// An activity panicked before it could be joined.
    #[error("{0} thread panicked")]
    TaskPanicked(&'static str),
}

impl ControlError {
    /// Shorthand for [`ControlError::InvalidCommand`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidCommand(reason.into())
    }

    /// Shorthand for [`ControlError::Configuration`].
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Configuration(reason.into())
    }

    /// True for errors that stop startup.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Spawn { .. })
    }
}

impl From<ConfigError> for ControlError {
    fn from(e: ConfigError) -> Self {
        Self::Configuration(e.to_string())
    }
}

/// Result alias for the control core.
pub type Result<T> = std::result::Result<T, ControlError>;
