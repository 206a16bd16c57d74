use crate::config::types::{Result, SequencerError, SequencerMode};
use crate::core::types::{ArtifactPath, CleanupStatus, RunReport, SourcePath};
use crate::exec::toolchain::{self, Toolchain};
use crate::observability::audit::events;
use crate::safety::artifact::ArtifactGuard;
use crate::verdict::classify::RunOutcome;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::Instant;

// ============================================================================
// Type-State Pipeline
// ============================================================================
// Derived -> Compiled -> Executed
//
// Each step consumes the prior state and returns exactly one next state on
// success. Only Pipeline<Compiled> can execute, and only Pipeline<Executed>
// can finish, so a program is never run without a successful compile.

/// Type-state marker: artifact path derived, nothing on disk yet
pub struct Derived;

/// Type-state marker: compiler exited successfully
pub struct Compiled;

/// Type-state: program ran to completion
pub struct Executed {
    outcome: RunOutcome,
}

/// Strict compile/run/cleanup pipeline.
///
/// Running before compiling does not type-check:
///
/// ```compile_fail
/// use asmrun::exec::pipeline::Pipeline;
///
/// let pipeline = Pipeline::new("ret42.s").unwrap();
/// pipeline.execute();
/// ```
///
/// Neither does reusing a consumed state:
///
/// ```compile_fail
/// use asmrun::exec::pipeline::Pipeline;
/// use asmrun::exec::toolchain::SystemCompiler;
///
/// let pipeline = Pipeline::new("ret42.s").unwrap();
/// let compiled = pipeline.compile(&SystemCompiler);
/// pipeline.compile(&SystemCompiler);
/// ```
///
/// The full chain:
///
/// ```no_run
/// use asmrun::exec::pipeline::Pipeline;
/// use asmrun::exec::toolchain::SystemCompiler;
///
/// # fn main() -> asmrun::Result<()> {
/// let executed = Pipeline::new("ret42.s")?.compile(&SystemCompiler)?.execute()?;
/// println!("{}", executed.outcome().status());
/// let report = executed.finish()?;
/// assert!(!report.artifact.as_path().exists());
/// # Ok(())
/// # }
/// ```
pub struct Pipeline<S> {
    source: SourcePath,
    guard: ArtifactGuard,
    started_at: DateTime<Utc>,
    compile_ms: u64,
    run_ms: u64,
    state: S,
}

impl<S> Pipeline<S> {
    pub fn source(&self) -> &SourcePath {
        &self.source
    }

    pub fn artifact(&self) -> &ArtifactPath {
        self.guard.artifact()
    }

    fn advance<T>(self, state: T) -> Pipeline<T> {
        Pipeline {
            source: self.source,
            guard: self.guard,
            started_at: self.started_at,
            compile_ms: self.compile_ms,
            run_ms: self.run_ms,
            state,
        }
    }

    /// Stop here and drop whatever the compiler may have written
    pub fn abort(self) -> CleanupStatus {
        let artifact = self.guard.path().to_path_buf();
        let status = self.guard.discard();
        record_cleanup(&artifact, &status);
        status
    }
}

impl Pipeline<Derived> {
    /// Step 1: derive the artifact path and take ownership of it.
    ///
    /// A source without extension is rejected: its artifact path is the
    /// source itself, which compiling would overwrite and cleanup would delete.
    pub fn new(source: impl Into<PathBuf>) -> Result<Self> {
        let source = SourcePath::new(source);
        let artifact = source.artifact_path();
        if artifact.as_path() == source.as_path() {
            return Err(SequencerError::InvalidSource(format!(
                "{} has no extension, so the compiled binary would replace it",
                source.as_path().display()
            )));
        }
        log::debug!(
            "Derived artifact {} from {}",
            artifact.as_path().display(),
            source.as_path().display()
        );

        Ok(Self {
            source,
            guard: ArtifactGuard::arm(artifact),
            started_at: Utc::now(),
            compile_ms: 0,
            run_ms: 0,
            state: Derived,
        })
    }

    /// Step 2: build the artifact. A failed compile removes any partial
    /// artifact it wrote, leaves an older file at the path untouched and ends
    /// the pipeline.
    pub fn compile(mut self, toolchain: &dyn Toolchain) -> Result<Pipeline<Compiled>> {
        let compiled = run_compiler(toolchain, self.source.as_path(), self.guard.path());

        match compiled {
            Ok((status, elapsed_ms)) if status.success() => {
                self.guard.claim();
                self.compile_ms = elapsed_ms;
                Ok(self.advance(Compiled))
            }
            Ok((status, _)) => {
                log::error!(
                    "{} failed on {}: {}",
                    toolchain.name(),
                    self.source.as_path().display(),
                    status
                );
                self.abort();
                Err(SequencerError::Compile {
                    compiler: toolchain.name().to_string(),
                    status,
                })
            }
            Err(e) => {
                self.abort();
                Err(e)
            }
        }
    }
}

impl Pipeline<Compiled> {
    /// Step 3: run the artifact with inherited stdio and capture its status
    pub fn execute(mut self) -> Result<Pipeline<Executed>> {
        let executable = self.artifact().executable();

        match run_artifact(&executable) {
            Ok((status, elapsed_ms)) => {
                let outcome = RunOutcome::from_status(status);
                if let RunOutcome::Signaled { signal, name } = &outcome {
                    log::warn!(
                        "{} terminated by signal {} ({})",
                        executable.display(),
                        signal,
                        name.as_deref().unwrap_or("unknown")
                    );
                }
                self.run_ms = elapsed_ms;
                Ok(self.advance(Executed { outcome }))
            }
            Err(source) => {
                log::error!("Failed to execute {}: {}", executable.display(), source);
                self.abort();
                Err(SequencerError::Run {
                    artifact: executable,
                    source,
                })
            }
        }
    }
}

impl Pipeline<Executed> {
    /// Step 4 input: how the program terminated
    pub fn outcome(&self) -> &RunOutcome {
        &self.state.outcome
    }

    /// Step 5: delete the artifact and summarize the run
    pub fn finish(self) -> Result<RunReport> {
        let Pipeline {
            source,
            guard,
            started_at,
            compile_ms,
            run_ms,
            state: Executed { outcome },
        } = self;

        let artifact = guard.artifact().clone();
        let cleanup = match guard.release() {
            Ok(status) => status,
            Err(err) => {
                events::cleanup_failure(artifact.as_path(), &err.to_string());
                return Err(err);
            }
        };
        record_cleanup(artifact.as_path(), &cleanup);

        Ok(RunReport {
            source,
            artifact,
            mode: SequencerMode::Strict,
            compiled: true,
            outcome: Some(outcome),
            compile_ms,
            run_ms,
            cleanup,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

/// Invoke the compiler with inherited stdio, returning its status and duration
pub(crate) fn run_compiler(
    toolchain: &dyn Toolchain,
    source: &Path,
    artifact: &Path,
) -> Result<(ExitStatus, u64)> {
    let mut command = toolchain.compile_command(source, artifact);
    let command_line = toolchain::describe(&command);
    log::info!("Compiling: {}", command_line);
    events::compile_start(source, &command_line);

    let start = Instant::now();
    let status = command.status().map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            log::error!("Compiler '{}' not found in PATH", toolchain.name());
        }
        SequencerError::CompilerUnavailable {
            compiler: toolchain.name().to_string(),
            source: e,
        }
    })?;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    events::compile_end(source, status.code(), elapsed_ms);
    Ok((status, elapsed_ms))
}

/// Run the program with inherited stdio and wait for it
pub(crate) fn run_artifact(executable: &Path) -> std::io::Result<(ExitStatus, u64)> {
    log::info!("Running: {}", executable.display());
    events::run_start(executable);

    let start = Instant::now();
    let status = Command::new(executable).status()?;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    let outcome = RunOutcome::from_status(status);
    events::run_end(executable, Some(outcome.status()), elapsed_ms);
    Ok((status, elapsed_ms))
}

pub(crate) fn record_cleanup(artifact: &Path, status: &CleanupStatus) {
    match status {
        CleanupStatus::Removed => events::cleanup_success(artifact),
        CleanupStatus::Absent | CleanupStatus::Preserved => events::cleanup_skipped(artifact),
        CleanupStatus::Failed { error } => events::cleanup_failure(artifact, error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::toolchain::testing::{ScriptCompiler, COPY_AS_SCRIPT};
    use std::fs;

    fn write_source(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_full_chain_reports_exit_code_and_removes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), "ret42.sh", "#!/bin/sh\nexit 42\n");

        let executed = Pipeline::new(&source)
            .unwrap()
            .compile(&ScriptCompiler(COPY_AS_SCRIPT))
            .unwrap()
            .execute()
            .unwrap();
        assert_eq!(executed.outcome().status(), 42);

        let report = executed.finish().unwrap();
        assert_eq!(report.status(), Some(42));
        assert_eq!(report.cleanup, CleanupStatus::Removed);
        assert!(!dir.path().join("ret42").exists());
    }

    #[test]
    fn test_compile_failure_stops_before_execution() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), "broken.sh", "#!/bin/sh\nexit 0\n");

        let err = Pipeline::new(&source)
            .unwrap()
            .compile(&ScriptCompiler("echo 'broken.sh:1: error' >&2; exit 1"))
            .err()
            .unwrap();
        assert!(matches!(err, SequencerError::Compile { .. }));
        assert!(!dir.path().join("broken").exists());
    }

    #[test]
    fn test_partial_artifact_removed_on_compile_failure() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), "half.sh", "");

        let result = Pipeline::new(&source)
            .unwrap()
            .compile(&ScriptCompiler(": > \"$1\"; exit 1"));
        assert!(result.is_err());
        assert!(!dir.path().join("half").exists());
    }

    #[test]
    fn test_missing_artifact_is_a_run_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), "ghost.sh", "");

        let err = Pipeline::new(&source)
            .unwrap()
            .compile(&ScriptCompiler("exit 0"))
            .unwrap()
            .execute()
            .err()
            .unwrap();
        assert!(matches!(err, SequencerError::Run { .. }));
    }

    #[test]
    fn test_missing_compiler_is_reported_as_unavailable() {
        struct Nowhere;
        impl Toolchain for Nowhere {
            fn name(&self) -> &str {
                "no-such-cc"
            }
            fn compile_command(&self, _source: &Path, _artifact: &Path) -> Command {
                Command::new("/nonexistent/no-such-cc")
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), "prog.s", "");
        let err = Pipeline::new(&source).unwrap().compile(&Nowhere).err().unwrap();
        assert!(matches!(err, SequencerError::CompilerUnavailable { .. }));
    }

    #[test]
    fn test_signaled_program_reports_shell_status() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), "term.sh", "#!/bin/sh\nkill -TERM $$\n");

        let report = Pipeline::new(&source)
            .unwrap()
            .compile(&ScriptCompiler(COPY_AS_SCRIPT))
            .unwrap()
            .execute()
            .unwrap()
            .finish()
            .unwrap();
        assert_eq!(report.status(), Some(143));
    }

    #[test]
    fn test_failed_compile_keeps_previous_build() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), "prog.c", "int main(void) { return }\n");
        let previous = dir.path().join("prog");
        fs::write(&previous, b"previous build").unwrap();

        let result = Pipeline::new(&source)
            .unwrap()
            .compile(&ScriptCompiler("exit 1"));

        assert!(matches!(result, Err(SequencerError::Compile { .. })));
        assert_eq!(fs::read(&previous).unwrap(), b"previous build");
    }

    #[test]
    fn test_successful_compile_replaces_and_removes_previous_build() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), "ret3.sh", "#!/bin/sh\nexit 3\n");
        fs::write(dir.path().join("ret3"), b"previous build").unwrap();

        let report = Pipeline::new(&source)
            .unwrap()
            .compile(&ScriptCompiler(COPY_AS_SCRIPT))
            .unwrap()
            .execute()
            .unwrap()
            .finish()
            .unwrap();

        assert_eq!(report.status(), Some(3));
        assert!(!dir.path().join("ret3").exists());
    }

    #[test]
    fn test_source_without_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), "prog", "int main(void) { return 0; }\n");

        let err = Pipeline::new(&source).err().unwrap();

        assert!(matches!(err, SequencerError::InvalidSource(_)));
        assert!(source.exists());
    }
}
