//! Error types for configuration, host queries and admin commands.

use crate::types::RegionId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted document exists but cannot be parsed.
    #[error("configuration corrupted: {0}")]
    Corrupted(String),

    /// The document parses but breaks a value invariant.
    #[error("configuration invalid: {0}")]
    Invalid(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(e: config::ConfigError) -> Self {
        ConfigError::Corrupted(e.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Corrupted(e.to_string())
    }
}

/// Failure of one host metrics query. Contained to that region for the cycle.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    #[error("region {0} is not loaded")]
    RegionUnloaded(RegionId),

    #[error("unknown world '{0}'")]
    UnknownWorld(String),

    #[error("host query failed: {0}")]
    Query(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown subcommand '{0}'")]
    UnknownSubcommand(String),
}
