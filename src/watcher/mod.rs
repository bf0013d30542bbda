//! File system observations and live watching
//!
//! Both the one-shot scanner and the inotify watcher produce
//! [`Observation`]s; the pipeline consumes them one at a time.

mod inotify_watcher;

pub use inotify_watcher::InotifyWatcher;

use crate::config::Config;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// What caused an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    /// Found by a directory scan
    Scan,
    /// File appeared (created or moved in)
    Create,
    /// File content changed
    Modify,
    /// File went away (deleted or moved out)
    Delete,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Scan => "SCAN",
            EventKind::Create => "CREATE",
            EventKind::Modify => "MODIFY",
            EventKind::Delete => "DELETE",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single noticed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// Absolute path of the file
    pub path: PathBuf,
    /// Type of event
    pub kind: EventKind,
    /// Size at the time of the event, if known
    pub size: Option<u64>,
}

impl Observation {
    /// Build an observation, looking up the current size for non-delete events
    pub fn new(path: impl Into<PathBuf>, kind: EventKind) -> Self {
        let path = path.into();
        let size = match kind {
            EventKind::Delete => None,
            _ => std::fs::metadata(&path).ok().map(|m| m.len()),
        };
        Self { path, kind, size }
    }
}

/// Live file system watcher feeding observations into a channel
pub struct Watcher {
    inotify: InotifyWatcher,
    watched_paths: Vec<PathBuf>,
}

impl Watcher {
    /// Create a watcher on the configured directory
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let inotify = InotifyWatcher::new(config.watch.recursive, config.watch.skip_dirs.clone())?;

        let mut watcher = Self {
            inotify,
            watched_paths: Vec::new(),
        };
        watcher.add(&config.watch.dir)?;

        Ok(watcher)
    }

    /// Add a path to watch
    pub fn add(&mut self, path: &Path) -> anyhow::Result<()> {
        let path = path.canonicalize()?;
        self.inotify.add(&path)?;
        tracing::info!("Watching: {:?}", path);
        self.watched_paths.push(path);
        Ok(())
    }

    /// Get next observation
    pub async fn next_event(&mut self) -> anyhow::Result<Observation> {
        self.inotify.next_event().await
    }

    /// Get list of watched root paths
    pub fn watched_paths(&self) -> &[PathBuf] {
        &self.watched_paths
    }

    /// Move the watcher onto a background task that forwards every
    /// observation into `tx`. The task ends when the receiver is dropped
    /// or the notification source fails.
    pub fn spawn(mut self, tx: mpsc::Sender<Observation>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match self.next_event().await {
                    Ok(observation) => {
                        if tx.send(observation).await.is_err() {
                            tracing::debug!("Observation receiver closed, stopping watcher");
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Watcher failed: {}", e);
                        break;
                    }
                }
            }
        })
    }
}
