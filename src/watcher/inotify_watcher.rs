//! inotify-based file system watcher

use super::{EventKind, Observation};
use inotify::{EventMask, Inotify, WatchDescriptor, WatchMask};
use std::collections::{HashMap, VecDeque};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::io::unix::AsyncFd;

/// inotify-based file system watcher
pub struct InotifyWatcher {
    /// inotify instance, opened non-blocking and owned by the reactor
    /// registration so it is deregistered before it closes
    inotify: AsyncFd<Inotify>,
    /// Map of watch descriptors to directories
    watches: HashMap<WatchDescriptor, PathBuf>,
    /// Observations decoded but not yet handed out
    pending: VecDeque<Observation>,
    /// Follow newly created subdirectories
    recursive: bool,
    /// Directory names skipped when descending
    skip_dirs: Vec<String>,
    /// Event buffer
    buffer: [u8; 4096],
}

fn mask() -> WatchMask {
    WatchMask::CREATE
        | WatchMask::MODIFY
        | WatchMask::DELETE
        | WatchMask::MOVED_FROM
        | WatchMask::MOVED_TO
}

impl InotifyWatcher {
    /// Create a new inotify watcher
    pub fn new(recursive: bool, skip_dirs: Vec<String>) -> anyhow::Result<Self> {
        let inotify = AsyncFd::new(Inotify::init()?)?;

        Ok(Self {
            inotify,
            watches: HashMap::new(),
            pending: VecDeque::new(),
            recursive,
            skip_dirs,
            buffer: [0u8; 4096],
        })
    }

    /// Add a directory to watch, descending into subdirectories when recursive
    pub fn add(&mut self, path: &Path) -> anyhow::Result<()> {
        let wd = self.inotify.get_ref().watches().add(path, mask())?;
        self.watches.insert(wd, path.to_path_buf());

        if self.recursive && path.is_dir() {
            self.add_recursive(path)?;
        }

        Ok(())
    }

    fn add_recursive(&mut self, dir: &Path) -> anyhow::Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }

            let path = entry.path();
            if self.is_skipped(&path) {
                continue;
            }

            match self.inotify.get_ref().watches().add(&path, mask()) {
                Ok(wd) => {
                    self.watches.insert(wd, path.clone());
                }
                Err(e) => tracing::warn!("Failed to watch {:?}: {}", path, e),
            }

            if let Err(e) = self.add_recursive(&path) {
                tracing::debug!("Failed to descend into {:?}: {}", path, e);
            }
        }

        Ok(())
    }

    fn is_skipped(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|name| self.skip_dirs.iter().any(|s| s == name))
            .unwrap_or(false)
    }

    /// Number of directories currently watched
    pub fn watch_count(&self) -> usize {
        self.watches.len()
    }

    /// Get next observation (async)
    pub async fn next_event(&mut self) -> anyhow::Result<Observation> {
        loop {
            if let Some(observation) = self.pending.pop_front() {
                return Ok(observation);
            }

            let mut guard = self.inotify.readable_mut().await?;

            let raw: Vec<(WatchDescriptor, EventMask, Option<OsString>)> =
                match guard.get_inner_mut().read_events(&mut self.buffer) {
                    Ok(events) => events
                        .map(|e| (e.wd, e.mask, e.name.map(|n| n.to_os_string())))
                        .collect(),
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        guard.clear_ready();
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                };
            drop(guard);

            for (wd, mask, name) in raw {
                self.decode(wd, mask, name);
            }
        }
    }

    /// Turn one raw inotify event into zero or one pending observations
    fn decode(&mut self, wd: WatchDescriptor, mask: EventMask, name: Option<OsString>) {
        if mask.contains(EventMask::Q_OVERFLOW) {
            tracing::warn!("inotify queue overflowed, events were lost");
            return;
        }
        if mask.contains(EventMask::IGNORED) {
            self.watches.remove(&wd);
            return;
        }

        let dir = match self.watches.get(&wd) {
            Some(p) => p.clone(),
            None => return,
        };
        let path = match name {
            Some(name) => dir.join(name),
            None => return,
        };

        if mask.contains(EventMask::ISDIR) {
            if self.recursive
                && (mask.contains(EventMask::CREATE) || mask.contains(EventMask::MOVED_TO))
                && !self.is_skipped(&path)
            {
                if let Err(e) = self.add(&path) {
                    tracing::warn!("Failed to watch new directory {:?}: {}", path, e);
                }
            }
            return;
        }

        let kind = if mask.contains(EventMask::CREATE) || mask.contains(EventMask::MOVED_TO) {
            EventKind::Create
        } else if mask.contains(EventMask::MODIFY) {
            EventKind::Modify
        } else if mask.contains(EventMask::DELETE) || mask.contains(EventMask::MOVED_FROM) {
            EventKind::Delete
        } else {
            return;
        };

        self.pending.push_back(Observation::new(path, kind));
    }
}
