//! Response to suspicious files

pub mod quarantine;

pub use quarantine::QuarantineManager;

use crate::detector::Status;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::error;

/// Action taken for an observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseAction {
    /// Nothing done
    None,
    /// File moved to the given path
    Quarantined(PathBuf),
    /// Move attempted and failed; the file is still in place
    QuarantineFailed(String),
}

impl fmt::Display for ResponseAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseAction::None => f.write_str("-"),
            ResponseAction::Quarantined(dest) => write!(f, "Quarantined to {}", dest.display()),
            ResponseAction::QuarantineFailed(reason) => write!(f, "Quarantine failed: {}", reason),
        }
    }
}

/// Decide and carry out the response for a classified file. Only
/// suspicious files are acted on, and only when a quarantine is given.
pub fn handle(status: Status, path: &Path, quarantine: Option<&QuarantineManager>) -> ResponseAction {
    let manager = match (status, quarantine) {
        (Status::Suspicious, Some(manager)) => manager,
        _ => return ResponseAction::None,
    };

    match manager.quarantine(path) {
        Ok(dest) => ResponseAction::Quarantined(dest),
        Err(e) => {
            error!("Failed to quarantine {:?}: {}", path, e);
            ResponseAction::QuarantineFailed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_files_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"plain").unwrap();
        let manager = QuarantineManager::new(dir.path().join("q"));

        assert_eq!(handle(Status::Safe, &path, Some(&manager)), ResponseAction::None);
        assert_eq!(handle(Status::Suspicious, &path, None), ResponseAction::None);
        assert!(path.exists());
    }

    #[test]
    fn test_suspicious_quarantined() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.enc");
        std::fs::write(&path, b"x").unwrap();
        let manager = QuarantineManager::new(dir.path().join("q"));

        let action = handle(Status::Suspicious, &path, Some(&manager));
        let dest = dir.path().join("q").join("blob.enc.quarantine");
        assert_eq!(action, ResponseAction::Quarantined(dest.clone()));
        assert_eq!(action.to_string(), format!("Quarantined to {}", dest.display()));
    }

    #[test]
    fn test_failure_reported() {
        let dir = tempfile::tempdir().unwrap();
        let manager = QuarantineManager::new(dir.path().join("q"));

        let action = handle(Status::Suspicious, &dir.path().join("vanished"), Some(&manager));
        assert!(matches!(action, ResponseAction::QuarantineFailed(_)));
        assert!(action.to_string().starts_with("Quarantine failed"));
        assert_eq!(ResponseAction::None.to_string(), "-");
    }
}
