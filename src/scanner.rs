//! One-shot recursive directory scan

use crate::config::Config;
use crate::detector::Status;
use crate::pipeline::Pipeline;
use crate::watcher::{EventKind, Observation};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Counts and paths collected over one scan
#[derive(Debug, Clone, Default)]
pub struct SessionSummary {
    /// Files that went through the pipeline
    pub scanned: usize,
    /// Files that could not be read
    pub unreadable: usize,
    pub safe: Vec<(PathBuf, f64)>,
    pub suspicious: Vec<(PathBuf, f64)>,
}

impl SessionSummary {
    pub fn safe_count(&self) -> usize {
        self.safe.len()
    }

    pub fn suspicious_count(&self) -> usize {
        self.suspicious.len()
    }
}

/// Walks a tree once, producing one observation per non-empty regular file
pub struct DirectoryScanner {
    deny: Vec<PathBuf>,
}

impl DirectoryScanner {
    pub fn new(config: &Config) -> Self {
        Self {
            deny: config.scan.deny.clone(),
        }
    }

    /// Deny-list entries that apply under `root`. An entry containing the
    /// root itself was asked for explicitly and is not pruned.
    fn deny_under(&self, root: &Path) -> Vec<PathBuf> {
        self.deny
            .iter()
            .filter(|d| !root.starts_with(d))
            .cloned()
            .collect()
    }

    /// Observations for every non-empty regular file under `root`
    pub fn observations(&self, root: &Path) -> anyhow::Result<impl Iterator<Item = Observation>> {
        let root = root.canonicalize()?;
        let deny = self.deny_under(&root);

        let walker = WalkDir::new(&root)
            .follow_links(false)
            .into_iter()
            .filter_entry(move |e| {
                let denied = deny.iter().any(|d| e.path().starts_with(d));
                if denied {
                    debug!("Pruning {:?}", e.path());
                }
                !denied
            });

        Ok(walker.filter_map(|entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    return None;
                }
            };

            if !entry.file_type().is_file() {
                return None;
            }

            let size = match entry.metadata() {
                Ok(m) => m.len(),
                Err(e) => {
                    debug!("Skipping {:?}: {}", entry.path(), e);
                    return None;
                }
            };
            if size == 0 {
                return None;
            }

            Some(Observation {
                path: entry.into_path(),
                kind: EventKind::Scan,
                size: Some(size),
            })
        }))
    }

    /// Scan `root` through `pipeline`, sequentially, in walk order
    pub fn scan(&self, root: &Path, pipeline: &Pipeline) -> anyhow::Result<SessionSummary> {
        let mut summary = SessionSummary::default();

        for observation in self.observations(root)? {
            let record = match pipeline.process(observation) {
                Some(record) => record,
                None => continue,
            };

            summary.scanned += 1;
            let path = record.observation.path;
            match (record.status, record.entropy) {
                (Status::Suspicious, Some(e)) => summary.suspicious.push((path, e)),
                (Status::Safe, Some(e)) => summary.safe.push((path, e)),
                _ => summary.unreadable += 1,
            }
        }

        Ok(summary)
    }
}
