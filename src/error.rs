//! Failure types for the per-file operations
//!
//! None of these are fatal: the pipeline records them and moves on.

use std::path::PathBuf;
use thiserror::Error;

/// File content could not be read for entropy estimation
#[derive(Debug, Error)]
#[error("failed to read {path:?}: {source}")]
pub struct ReadFailure {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// A flagged file could not be moved into quarantine
#[derive(Debug, Error)]
pub enum MoveFailure {
    /// Path has no final component to keep
    #[error("{0:?} has no file name")]
    NoFileName(PathBuf),

    /// Every candidate destination name was already taken
    #[error("quarantine destination {0:?} already exists")]
    Occupied(PathBuf),

    /// Creating the quarantine directory or renaming failed
    #[error("failed to move {from:?} to {to:?}: {source}")]
    Io {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A record could not be appended to the event log
#[derive(Debug, Error)]
pub enum WriteFailure {
    #[error("failed to append to {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode log record: {0}")]
    Encode(#[from] serde_json::Error),
}
