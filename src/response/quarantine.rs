//! Quarantine: move flagged files into an isolation directory

use crate::error::MoveFailure;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Suffix appended to every quarantined file name
pub const SUFFIX: &str = "quarantine";

/// Moves files into a flat quarantine directory
#[derive(Debug, Clone)]
pub struct QuarantineManager {
    dir: PathBuf,
}

impl QuarantineManager {
    /// Create a manager for `dir`. The directory is created on first use.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Quarantine directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Rename `path` into the quarantine directory, keeping only its base
    /// name, and return the new location. The file is left in place on
    /// failure.
    pub fn quarantine(&self, path: &Path) -> Result<PathBuf, MoveFailure> {
        self.quarantine_at(path, chrono::Utc::now().timestamp())
    }

    /// Quarantine with `now` as the timestamp used for the second-level
    /// collision name
    fn quarantine_at(&self, path: &Path, now: i64) -> Result<PathBuf, MoveFailure> {
        let dest = self.destination(path, now)?;

        std::fs::create_dir_all(&self.dir).map_err(|source| MoveFailure::Io {
            from: path.to_path_buf(),
            to: dest.clone(),
            source,
        })?;

        match std::fs::rename(path, &dest) {
            Ok(()) => {
                info!("Quarantined {:?} -> {:?}", path, dest);
                Ok(dest)
            }
            Err(source) => {
                warn!("Quarantine of {:?} failed: {}", path, source);
                Err(MoveFailure::Io {
                    from: path.to_path_buf(),
                    to: dest,
                    source,
                })
            }
        }
    }

    /// Pick a free destination: `<name>.quarantine`, then
    /// `<name>.<unix-ts>.quarantine`
    fn destination(&self, path: &Path, now: i64) -> Result<PathBuf, MoveFailure> {
        let name = path
            .file_name()
            .ok_or_else(|| MoveFailure::NoFileName(path.to_path_buf()))?;

        // Built as OsString so non-UTF-8 names survive byte for byte
        let mut plain_name = name.to_os_string();
        plain_name.push(format!(".{}", SUFFIX));
        let plain = self.dir.join(plain_name);
        if !plain.exists() {
            return Ok(plain);
        }

        let mut stamped_name = name.to_os_string();
        stamped_name.push(format!(".{}.{}", now, SUFFIX));
        let stamped = self.dir.join(stamped_name);
        if !stamped.exists() {
            return Ok(stamped);
        }

        Err(MoveFailure::Occupied(stamped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarantine_moves_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("locked.docx");
        std::fs::write(&src, b"ciphertext").unwrap();

        let manager = QuarantineManager::new(dir.path().join("q"));
        let dest = manager.quarantine(&src).unwrap();

        assert_eq!(dest, dir.path().join("q").join("locked.docx.quarantine"));
        assert!(!src.exists());
        assert_eq!(std::fs::read(&dest).unwrap(), b"ciphertext");
    }

    #[test]
    fn test_collision_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a")).unwrap();
        std::fs::create_dir_all(dir.path().join("b")).unwrap();
        let first = dir.path().join("a").join("same.bin");
        let second = dir.path().join("b").join("same.bin");
        std::fs::write(&first, b"first").unwrap();
        std::fs::write(&second, b"second").unwrap();

        let manager = QuarantineManager::new(dir.path().join("q"));
        let d1 = manager.quarantine(&first).unwrap();
        let d2 = manager.quarantine(&second).unwrap();

        assert_ne!(d1, d2);
        assert_eq!(std::fs::read(&d1).unwrap(), b"first");
        assert_eq!(std::fs::read(&d2).unwrap(), b"second");
        assert!(d2.to_string_lossy().ends_with(".quarantine"));
    }

    #[test]
    fn test_all_destinations_occupied() {
        let dir = tempfile::tempdir().unwrap();
        let q = dir.path().join("q");
        std::fs::create_dir_all(&q).unwrap();
        std::fs::write(q.join("same.bin.quarantine"), b"one").unwrap();
        std::fs::write(q.join("same.bin.1700000000.quarantine"), b"two").unwrap();

        let src = dir.path().join("same.bin");
        std::fs::write(&src, b"three").unwrap();

        let manager = QuarantineManager::new(&q);
        let err = manager.quarantine_at(&src, 1_700_000_000).unwrap_err();

        assert!(matches!(err, MoveFailure::Occupied(ref p) if p == &q.join("same.bin.1700000000.quarantine")));
        assert_eq!(std::fs::read(&src).unwrap(), b"three");
        assert_eq!(std::fs::read(q.join("same.bin.quarantine")).unwrap(), b"one");
        assert_eq!(std::fs::read(q.join("same.bin.1700000000.quarantine")).unwrap(), b"two");
    }

    #[test]
    fn test_non_utf8_name_preserved() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join(OsStr::from_bytes(b"inv\xffalid.bin"));
        std::fs::write(&src, b"x").unwrap();

        let manager = QuarantineManager::new(dir.path().join("q"));
        let dest = manager.quarantine(&src).unwrap();

        assert_eq!(dest.file_name().unwrap().as_bytes(), &b"inv\xffalid.bin.quarantine"[..]);
        assert!(dest.exists());
        assert!(!src.exists());
    }

    #[test]
    fn test_missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let manager = QuarantineManager::new(dir.path().join("q"));

        let err = manager.quarantine(&dir.path().join("gone")).unwrap_err();
        assert!(matches!(err, MoveFailure::Io { .. }));
    }

    #[test]
    fn test_no_file_name() {
        let manager = QuarantineManager::new("/nonexistent/q");
        let err = manager.quarantine(Path::new("/")).unwrap_err();
        assert!(matches!(err, MoveFailure::NoFileName(_)));
    }
}
