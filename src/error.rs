//! Error types for timetasker.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A work interval string that does not match `[<N>h][<N>m][<N>s]`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DurationError {
    #[error("unknown unit '{unit}' in duration '{input}' (expected h, m or s)")]
    UnknownUnit { input: String, unit: char },

    #[error("unit '{unit}' has no number in front of it in duration '{input}'")]
    MissingNumber { input: String, unit: char },

    #[error("duration '{input}' ends with a number but no unit")]
    MissingUnit { input: String },

    #[error("unit '{unit}' is repeated or out of order in duration '{input}' (expected h, then m, then s)")]
    OutOfOrder { input: String, unit: char },

    #[error("duration '{input}' is too large")]
    Overflow { input: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid timer.work_interval: {0}")]
    Interval(#[from] DurationError),

    #[error("timer.work_interval must be longer than zero seconds")]
    ZeroInterval,
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to read completion log {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("completion log {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode completion log: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to write completion log {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathsError {
    #[error("could not determine the home directory")]
    NoHome,

    #[error("environment variable {0} is not set")]
    MissingVar(&'static str),
}
