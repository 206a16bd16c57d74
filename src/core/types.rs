use crate::config::types::SequencerMode;
use crate::verdict::classify::RunOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Path of the single source file handed to the compiler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourcePath(PathBuf);

impl SourcePath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Extension of the file name, if it is valid UTF-8
    pub fn extension(&self) -> Option<&str> {
        self.0.extension().and_then(|ext| ext.to_str())
    }

    /// Derive the artifact path by dropping the last extension of the file name.
    ///
    /// Only the final component is considered, a leading dot of a dot-file is
    /// not an extension, and a path without extension maps to itself.
    ///
    /// ```
    /// use asmrun::core::types::SourcePath;
    /// use std::path::Path;
    ///
    /// assert_eq!(SourcePath::new("foo.s").artifact_path().as_path(), Path::new("foo"));
    /// assert_eq!(SourcePath::new("foo.bar.s").artifact_path().as_path(), Path::new("foo.bar"));
    /// assert_eq!(SourcePath::new("foo").artifact_path().as_path(), Path::new("foo"));
    /// ```
    pub fn artifact_path(&self) -> ArtifactPath {
        let derived = match self.0.extension() {
            Some(_) => self.0.with_extension(""),
            None => self.0.clone(),
        };
        ArtifactPath(derived)
    }
}

/// Path of the compiled binary. Owned by the sequencer for one run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactPath(PathBuf);

impl ArtifactPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Path to hand to `Command::new`. A bare file name is anchored to the
    /// current directory so `PATH` is never searched.
    pub fn executable(&self) -> PathBuf {
        match self.0.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => self.0.clone(),
            _ => Path::new(".").join(&self.0),
        }
    }
}

/// What happened to the artifact at the end of the run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CleanupStatus {
    /// The artifact existed and was deleted
    Removed,
    /// There was nothing to delete
    Absent,
    /// A file that predates the run was left in place
    Preserved,
    /// Deletion was attempted and failed
    Failed { error: String },
}

impl CleanupStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Summary of one invocation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunReport {
    pub source: SourcePath,
    pub artifact: ArtifactPath,
    pub mode: SequencerMode,
    /// Whether the compiler exited successfully
    pub compiled: bool,
    /// `None` when the program never started
    pub outcome: Option<RunOutcome>,
    pub compile_ms: u64,
    pub run_ms: u64,
    pub cleanup: CleanupStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    /// The integer printed on stdout
    pub fn status(&self) -> Option<i32> {
        self.outcome.as_ref().map(RunOutcome::status)
    }
}
