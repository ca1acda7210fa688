//! Error types.
//!
//! Only `StoreError` is fatal to a save. `LocationError` never leaves the
//! recorder: it is logged and the entry is written without coordinates.

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the durable key-value store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("history under key '{key}' is not a valid log: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize history: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("could not determine data directory")]
    NoDataDir,

    #[error("{0}")]
    Backend(String),
}

/// Reasons the location for an entry is missing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocationError {
    #[error("location permission not granted")]
    PermissionDenied,

    #[error("location unavailable: {0}")]
    Unavailable(String),

    #[error("location request timed out")]
    TimedOut,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid location timeout '{value}': {source}")]
    Timeout {
        value: String,
        #[source]
        source: humantime::DurationError,
    },

    #[error("invalid timestamp format '{0}'")]
    TimestampFormat(String),
}
