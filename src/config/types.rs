/// Core types shared by the sequencer, the CLI and the verdict layer
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// How strictly the sequencer gates its steps
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequencerMode {
    /// Each step runs only if the previous one succeeded
    #[default]
    Strict,
    /// Every step runs unconditionally, like the `cc; ./a; echo $?; rm a` one-liner
    Compat,
}

impl SequencerMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Compat => "compat",
        }
    }
}

/// Runtime configuration assembled by the CLI
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SequencerConfig {
    pub mode: SequencerMode,
    /// Emit the run report as JSON instead of the bare status line
    pub json: bool,
    /// Number of `-v` flags given on the command line
    pub verbosity: u8,
}

impl SequencerConfig {
    /// Default log filter for the configured verbosity. `RUST_LOG` wins over this.
    pub fn log_filter(&self) -> &'static str {
        match self.verbosity {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

/// Process exit codes of the runner itself.
///
/// The compiled program's status is printed, never returned; these codes only
/// describe how far the pipeline got.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    Internal,
    Usage,
    CompileFailed,
    RunFailed,
    CleanupFailed,
    /// Compat mode: the trailing delete step failed, as `rm` would report
    LegacyCleanupFailed,
    Interrupted(i32),
}

impl ExitCode {
    pub fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Internal => 1,
            Self::Usage => 2,
            Self::CompileFailed => 3,
            Self::RunFailed => 4,
            Self::CleanupFailed => 5,
            Self::LegacyCleanupFailed => 1,
            Self::Interrupted(signal) => 128 + signal,
        }
    }
}

/// Errors raised while sequencing compile/run/cleanup
#[derive(Error, Debug)]
pub enum SequencerError {
    #[error("Invalid source: {0}")]
    InvalidSource(String),

    #[error("Compilation failed: {compiler} {status}")]
    Compile { compiler: String, status: ExitStatus },

    #[error("Failed to start compiler '{compiler}': {source}")]
    CompilerUnavailable {
        compiler: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to execute {}: {source}", artifact.display())]
    Run {
        artifact: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove {}: {source}", artifact.display())]
    Cleanup {
        artifact: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Interrupted by signal {0}")]
    Interrupted(i32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SequencerError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::InvalidSource(_) => ExitCode::Usage,
            Self::Compile { .. } | Self::CompilerUnavailable { .. } => ExitCode::CompileFailed,
            Self::Run { .. } => ExitCode::RunFailed,
            Self::Cleanup { .. } => ExitCode::CleanupFailed,
            Self::Interrupted(signal) => ExitCode::Interrupted(*signal),
            Self::Io(_) => ExitCode::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, SequencerError>;
