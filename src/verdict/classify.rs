/// Outcome classification
/// Derives the printed status and the runner's own exit code as pure
/// functions over the child's wait status and the pipeline result.
use crate::config::types::{ExitCode, Result, SequencerMode};
use crate::core::types::{CleanupStatus, RunReport};
use nix::sys::signal::Signal;
use serde::{Deserialize, Serialize};
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

/// Offset the shell adds to a terminating signal number
const SIGNAL_STATUS_BASE: i32 = 128;

/// How the compiled program terminated
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Normal exit with an exit code
    Exited { code: i32 },
    /// Killed by a signal
    Signaled { signal: i32, name: Option<String> },
}

impl RunOutcome {
    /// Classify a wait status. This is a pure, deterministic function.
    pub fn from_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Self::Exited { code };
        }

        match status.signal() {
            Some(signal) => Self::Signaled {
                signal,
                name: signal_name(signal),
            },
            // Neither exited nor signaled: only stop/continue states, which a
            // plain wait never reports. Treat as a raw status.
            None => Self::Exited {
                code: status.into_raw(),
            },
        }
    }

    /// Status as a shell would print `$?`
    pub fn status(&self) -> i32 {
        match self {
            Self::Exited { code } => *code,
            Self::Signaled { signal, .. } => SIGNAL_STATUS_BASE + signal,
        }
    }
}

/// Symbolic name for a signal number (`SIGSEGV`), if the platform knows it
pub fn signal_name(signal: i32) -> Option<String> {
    Signal::try_from(signal)
        .ok()
        .map(|sig| sig.as_str().to_string())
}

/// Map the pipeline result onto the runner's own exit code.
///
/// Strict mode reports how far the pipeline got. Compat mode reports the
/// status of the trailing delete step only, as `rm` would.
pub fn exit_code_for(result: &Result<RunReport>) -> ExitCode {
    match result {
        Ok(report) => match report.mode {
            SequencerMode::Strict => ExitCode::Success,
            SequencerMode::Compat => match report.cleanup {
                CleanupStatus::Removed => ExitCode::Success,
                CleanupStatus::Absent
                | CleanupStatus::Preserved
                | CleanupStatus::Failed { .. } => ExitCode::LegacyCleanupFailed,
            },
        },
        Err(err) => err.exit_code(),
    }
}
