/// Scoped ownership of the compiled artifact
/// The guard is armed before compilation and releases the file on every exit
/// path: explicitly through `release`, otherwise on drop. Until the compiler
/// succeeds, only a file written after arming is ever deleted.
use crate::config::types::{Result, SequencerError};
use crate::core::types::{ArtifactPath, CleanupStatus};
use std::fs;
use std::io::ErrorKind;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

/// Identity and last-modification of a file, enough to tell whether it was
/// replaced or rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    dev: u64,
    ino: u64,
    len: u64,
    mtime: i64,
    mtime_nsec: i64,
    ctime: i64,
    ctime_nsec: i64,
}

impl FileStamp {
    fn of(path: &Path) -> Option<Self> {
        let meta = fs::symlink_metadata(path).ok()?;
        Some(Self {
            dev: meta.dev(),
            ino: meta.ino(),
            len: meta.len(),
            mtime: meta.mtime(),
            mtime_nsec: meta.mtime_nsec(),
            ctime: meta.ctime(),
            ctime_nsec: meta.ctime_nsec(),
        })
    }
}

/// Exclusive owner of one artifact file for the duration of a run
#[derive(Debug)]
pub struct ArtifactGuard {
    artifact: ArtifactPath,
    /// What sat at the path when the guard was armed
    prior: Option<FileStamp>,
    /// Set once the compiler succeeded: the file is ours whatever it looks like
    claimed: bool,
    released: bool,
}

impl ArtifactGuard {
    /// Take ownership of the artifact path. Nothing is created here; the
    /// compiler writes the file. A file already at the path is recorded so a
    /// failed compile leaves it alone.
    pub fn arm(artifact: ArtifactPath) -> Self {
        let prior = FileStamp::of(artifact.as_path());
        if prior.is_some() {
            log::debug!(
                "Artifact path {} already exists; kept unless rebuilt",
                artifact.as_path().display()
            );
        }
        Self {
            artifact,
            prior,
            claimed: false,
            released: false,
        }
    }

    /// Mark the file at the path as produced by this run
    pub fn claim(&mut self) {
        self.claimed = true;
    }

    /// Whether the file at the path is one this run produced
    fn owns_current_file(&self) -> bool {
        self.claimed || FileStamp::of(self.path()) != self.prior
    }

    pub fn path(&self) -> &Path {
        self.artifact.as_path()
    }

    pub fn artifact(&self) -> &ArtifactPath {
        &self.artifact
    }

    /// Delete the artifact, requiring that it exists.
    ///
    /// Used after a successful run, where a missing file means something else
    /// removed it behind our back.
    pub fn release(mut self) -> Result<CleanupStatus> {
        self.released = true;
        remove(self.path())
            .map(|()| CleanupStatus::Removed)
            .map_err(|source| SequencerError::Cleanup {
                artifact: self.path().to_path_buf(),
                source,
            })
    }

    /// Delete the artifact if this run wrote one (idempotent). A file that
    /// predates the run and was not rewritten is preserved.
    pub fn discard(mut self) -> CleanupStatus {
        self.released = true;
        self.discard_owned()
    }

    fn discard_owned(&self) -> CleanupStatus {
        if !self.owns_current_file() {
            if self.prior.is_some() {
                log::debug!("Preserving pre-existing {}", self.path().display());
                return CleanupStatus::Preserved;
            }
            return CleanupStatus::Absent;
        }
        discard_path(self.path())
    }

    /// Stop owning the file without touching it
    pub fn disarm(mut self) -> ArtifactPath {
        self.released = true;
        self.artifact.clone()
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let CleanupStatus::Failed { error } = self.discard_owned() {
            log::warn!(
                "Failed to remove artifact {} on unwind: {}",
                self.path().display(),
                error
            );
        }
    }
}

fn remove(path: &Path) -> std::io::Result<()> {
    fs::remove_file(path)?;
    log::debug!("Removed artifact {}", path.display());
    Ok(())
}

fn discard_path(path: &Path) -> CleanupStatus {
    match remove(path) {
        Ok(()) => CleanupStatus::Removed,
        Err(e) if e.kind() == ErrorKind::NotFound => CleanupStatus::Absent,
        Err(e) => CleanupStatus::Failed {
            error: e.to_string(),
        },
    }
}

/// Unconditional delete, as `rm` would do it: a missing file is a failure.
pub fn remove_unconditionally(path: &Path) -> CleanupStatus {
    match remove(path) {
        Ok(()) => CleanupStatus::Removed,
        Err(e) => CleanupStatus::Failed {
            error: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::SourcePath;

    fn guard_in(dir: &Path, name: &str) -> ArtifactGuard {
        ArtifactGuard::arm(SourcePath::new(dir.join(format!("{name}.s"))).artifact_path())
    }

    #[test]
    fn test_release_removes_existing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let guard = guard_in(dir.path(), "prog");
        fs::write(guard.path(), b"\x7fELF").unwrap();
        let path = guard.path().to_path_buf();

        assert_eq!(guard.release().unwrap(), CleanupStatus::Removed);
        assert!(!path.exists());
    }

    #[test]
    fn test_release_of_missing_artifact_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let guard = guard_in(dir.path(), "gone");

        let err = guard.release().unwrap_err();
        assert!(matches!(err, SequencerError::Cleanup { .. }));
    }

    #[test]
    fn test_discard_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let guard = guard_in(dir.path(), "partial");
        fs::write(guard.path(), b"").unwrap();
        assert_eq!(guard.discard(), CleanupStatus::Removed);

        let guard = guard_in(dir.path(), "partial");
        assert_eq!(guard.discard(), CleanupStatus::Absent);
    }

    #[test]
    fn test_drop_removes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let guard = guard_in(dir.path(), "dropped");
            fs::write(guard.path(), b"").unwrap();
            guard.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_disarm_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let guard = guard_in(dir.path(), "kept");
        fs::write(guard.path(), b"").unwrap();

        let artifact = guard.disarm();
        assert!(artifact.as_path().exists());
    }

    #[test]
    fn test_discard_preserves_file_that_predates_the_guard() {
        let dir = tempfile::tempdir().unwrap();
        let previous = dir.path().join("prog");
        fs::write(&previous, b"previous build").unwrap();

        let guard = guard_in(dir.path(), "prog");
        assert_eq!(guard.discard(), CleanupStatus::Preserved);
        assert_eq!(fs::read(&previous).unwrap(), b"previous build");

        {
            let _guard = guard_in(dir.path(), "prog");
        }
        assert!(previous.exists());
    }

    #[test]
    fn test_discard_removes_rewritten_file() {
        let dir = tempfile::tempdir().unwrap();
        let previous = dir.path().join("prog");
        fs::write(&previous, b"previous build").unwrap();

        let guard = guard_in(dir.path(), "prog");
        fs::remove_file(&previous).unwrap();
        fs::write(&previous, b"half-written").unwrap();

        assert_eq!(guard.discard(), CleanupStatus::Removed);
        assert!(!previous.exists());
    }

    #[test]
    fn test_claimed_file_is_removed_even_if_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let previous = dir.path().join("prog");
        fs::write(&previous, b"").unwrap();

        let mut guard = guard_in(dir.path(), "prog");
        guard.claim();
        assert_eq!(guard.discard(), CleanupStatus::Removed);
    }

    #[test]
    fn test_unconditional_remove_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let status = remove_unconditionally(&dir.path().join("never-built"));
        assert!(status.is_failure());
    }
}
