//! Configuration management for entrowatch

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Glob patterns excluded from both scan and watch
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Entropy thresholds and sampling
    #[serde(default)]
    pub detection: DetectionConfig,

    /// One-shot directory scan settings
    #[serde(default)]
    pub scan: ScanConfig,

    /// Live watch settings
    #[serde(default)]
    pub watch: WatchConfig,

    /// Quarantine settings
    #[serde(default)]
    pub quarantine: QuarantineConfig,

    /// Event log settings
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            detection: DetectionConfig::default(),
            scan: ScanConfig::default(),
            watch: WatchConfig::default(),
            quarantine: QuarantineConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Default configuration with the log file, quarantine directory and
    /// watch directory all placed under `root`.
    pub fn with_root(root: &Path) -> Self {
        let mut config = Self::default();
        config.log.file = root.join("logs").join("watcher_logs.json");
        config.quarantine.dir = root.join("quarantine");
        config.watch.dir = root.join("watch");
        config
    }

    /// Check if a path matches one of the `exclude` glob patterns
    pub fn is_excluded(&self, path: &Path) -> bool {
        self.exclude.iter().any(|pattern| match globset::Glob::new(pattern) {
            Ok(glob) => glob.compile_matcher().is_match(path),
            Err(e) => {
                tracing::debug!("Ignoring invalid exclude pattern {:?}: {}", pattern, e);
                false
            }
        })
    }

    /// Check if a path is one of our own outputs (log file or quarantine)
    pub fn is_own_output(&self, path: &Path) -> bool {
        path == self.log.file || path.starts_with(&self.quarantine.dir)
    }
}

/// Canonical form of a path that may not exist yet: the deepest existing
/// ancestor is canonicalized and the missing tail re-appended.
pub fn resolve_path(path: &Path) -> PathBuf {
    let mut tail = Vec::new();
    let mut current = path;

    loop {
        if let Ok(base) = current.canonicalize() {
            return tail.iter().rev().fold(base, |acc, part| acc.join(part));
        }
        match (current.parent(), current.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                current = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}

/// Detection thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Window size in bytes for sampled estimation
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,

    /// Threshold used by the one-shot scan (0.0 - 8.0)
    #[serde(default = "default_scan_threshold")]
    pub scan_threshold: f64,

    /// Threshold used by the live watcher (0.0 - 8.0)
    #[serde(default = "default_watch_threshold")]
    pub watch_threshold: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            sample_size: default_sample_size(),
            scan_threshold: default_scan_threshold(),
            watch_threshold: default_watch_threshold(),
        }
    }
}

/// Directory scan configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Virtual and system trees never descended into
    #[serde(default = "default_deny")]
    pub deny: Vec<PathBuf>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            deny: default_deny(),
        }
    }
}

/// Watch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Directory to monitor
    #[serde(default = "default_watch_dir")]
    pub dir: PathBuf,

    /// Also monitor subdirectories
    #[serde(default = "default_true")]
    pub recursive: bool,

    /// Directory names never watched when descending
    #[serde(default = "default_skip_dirs")]
    pub skip_dirs: Vec<String>,

    /// Capacity of the observation queue between notifier and pipeline
    #[serde(default = "default_queue")]
    pub queue: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            dir: default_watch_dir(),
            recursive: true,
            skip_dirs: default_skip_dirs(),
            queue: default_queue(),
        }
    }
}

/// Quarantine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuarantineConfig {
    /// Move suspicious files away on detection
    #[serde(default)]
    pub enabled: bool,

    /// Flat directory receiving quarantined files
    #[serde(default = "default_quarantine_dir")]
    pub dir: PathBuf,
}

impl Default for QuarantineConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: default_quarantine_dir(),
        }
    }
}

/// Event log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Line-delimited JSON log file
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
        }
    }
}

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_sample_size() -> usize {
    4096
}

fn default_scan_threshold() -> f64 {
    7.0
}

fn default_watch_threshold() -> f64 {
    7.5
}

fn default_deny() -> Vec<PathBuf> {
    ["/proc", "/sys", "/dev", "/run", "/tmp", "/var/lib"]
        .iter()
        .map(PathBuf::from)
        .collect()
}

fn default_skip_dirs() -> Vec<String> {
    [".git", "node_modules", "__pycache__", ".cache", "target"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_queue() -> usize {
    1024
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/root"))
}

fn default_watch_dir() -> PathBuf {
    home().join("testwatch")
}

fn default_quarantine_dir() -> PathBuf {
    home().join("filewatch_dashboard").join("quarantine")
}

fn default_log_file() -> PathBuf {
    home()
        .join("filewatch_dashboard")
        .join("logs")
        .join("watcher_logs.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.detection.sample_size, 4096);
        assert_eq!(config.detection.scan_threshold, 7.0);
        assert_eq!(config.detection.watch_threshold, 7.5);
        assert!(!config.quarantine.enabled);
        assert!(config.scan.deny.contains(&PathBuf::from("/proc")));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("detection:\n  scan_threshold: 6.5\n").unwrap();
        assert_eq!(config.detection.scan_threshold, 6.5);
        assert_eq!(config.detection.watch_threshold, 7.5);
        assert_eq!(config.detection.sample_size, 4096);
        assert_eq!(config.scan.deny.len(), 6);
    }

    #[test]
    fn test_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = Config::with_root(dir.path());
        config.quarantine.enabled = true;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert!(loaded.quarantine.enabled);
        assert_eq!(loaded.log.file, dir.path().join("logs/watcher_logs.json"));
    }

    #[test]
    fn test_is_excluded() {
        let mut config = Config::default();
        config.exclude = vec!["*.log".to_string(), "/srv/cache/**".to_string()];

        assert!(config.is_excluded(Path::new("/var/app/server.log")));
        assert!(config.is_excluded(Path::new("/srv/cache/blob")));
        assert!(!config.is_excluded(Path::new("/home/user/document.pdf")));
    }

    #[test]
    fn test_resolve_path_through_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().canonicalize().unwrap().join("real");
        std::fs::create_dir(&real).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        assert_eq!(resolve_path(&link), real);
        assert_eq!(
            resolve_path(&link.join("logs/watcher_logs.json")),
            real.join("logs/watcher_logs.json")
        );
    }

    #[test]
    fn test_is_own_output() {
        let config = Config::with_root(Path::new("/data/ew"));
        assert!(config.is_own_output(Path::new("/data/ew/logs/watcher_logs.json")));
        assert!(config.is_own_output(Path::new("/data/ew/quarantine/a.bin.quarantine")));
        assert!(!config.is_own_output(Path::new("/data/ew/watch/a.bin")));
    }
}
