//! Append-only event log
//!
//! One JSON object per line. The file is opened, appended and closed for
//! every record so independent processes can share it; each record goes
//! out in a single write and earlier lines are never touched.

pub mod reader;

use crate::detector::Status;
use crate::error::WriteFailure;
use crate::watcher::{EventKind, Observation};
use serde::Serialize;
use std::borrow::Cow;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Outcome of one observation, as persisted
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationRecord {
    pub observation: Observation,
    /// Absent for deletes and unreadable files
    pub entropy: Option<f64>,
    pub status: Status,
    /// `"-"` when nothing was done
    pub action: String,
    /// `"-"` unless there is something to explain
    pub message: String,
    /// Unix seconds
    pub timestamp: i64,
}

impl ClassificationRecord {
    pub fn new(observation: Observation, entropy: Option<f64>, status: Status) -> Self {
        Self {
            observation,
            entropy,
            status,
            action: "-".to_string(),
            message: "-".to_string(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

/// On-disk shape of a record
#[derive(Serialize)]
struct LogLine<'a> {
    event: EventKind,
    timestamp: i64,
    file: Cow<'a, str>,
    entropy: Option<f64>,
    status: Status,
    action: &'a str,
    message: &'a str,
}

impl<'a> From<&'a ClassificationRecord> for LogLine<'a> {
    fn from(record: &'a ClassificationRecord) -> Self {
        Self {
            event: record.observation.kind,
            timestamp: record.timestamp,
            file: record.observation.path.to_string_lossy(),
            entropy: record.entropy,
            status: record.status,
            action: &record.action,
            message: &record.message,
        }
    }
}

/// Line-delimited JSON log writer
#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Log file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a complete line, creating the log directory
    /// if needed
    pub fn append(&self, record: &ClassificationRecord) -> Result<(), WriteFailure> {
        let mut line = serde_json::to_vec(&LogLine::from(record))?;
        line.push(b'\n');

        let io_err = |source| WriteFailure::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        file.write_all(&line).map_err(io_err)?;

        Ok(())
    }
}
