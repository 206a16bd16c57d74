use crate::config::types::{Result, SequencerConfig, SequencerError, SequencerMode};
use crate::config::validator::validate_source;
use crate::core::types::{CleanupStatus, RunReport, SourcePath};
use crate::exec::pipeline::{self, Pipeline};
use crate::exec::toolchain::{SystemCompiler, Toolchain};
use crate::safety::artifact::{remove_unconditionally, ArtifactGuard};
use crate::signal;
use crate::verdict::classify::RunOutcome;
use chrono::Utc;
use std::io::Write;
use std::path::Path;

/// Drives one compile/run/report/cleanup sequence for a single source file.
pub struct Sequencer {
    toolchain: Box<dyn Toolchain>,
    mode: SequencerMode,
    interruptible: bool,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new(Box::new(SystemCompiler))
    }
}

impl Sequencer {
    pub fn new(toolchain: Box<dyn Toolchain>) -> Self {
        Self {
            toolchain,
            mode: SequencerMode::Strict,
            interruptible: false,
        }
    }

    pub fn from_config(config: &SequencerConfig) -> Self {
        Self::default().mode(config.mode)
    }

    pub fn mode(mut self, mode: SequencerMode) -> Self {
        self.mode = mode;
        self
    }

    /// Consult the process-wide signal latch between steps
    pub fn with_interrupt_latch(mut self) -> Self {
        self.interruptible = true;
        self
    }

    /// Run the sequence, writing the program's status to `out`
    pub fn run(&self, source: &Path, out: &mut dyn Write) -> Result<RunReport> {
        log::info!("Running {} in {} mode", source.display(), self.mode.as_str());
        match self.mode {
            SequencerMode::Strict => self.run_strict(source, out),
            SequencerMode::Compat => self.run_compat(source, out),
        }
    }

    fn check_interrupt(&self) -> Result<()> {
        if self.interruptible {
            signal::check()?;
        }
        Ok(())
    }

    /// Each step gates the next; the artifact guard cleans up on every path.
    fn run_strict(&self, source: &Path, out: &mut dyn Write) -> Result<RunReport> {
        let source_path = SourcePath::new(source);
        validate_source(&source_path, &source_path.artifact_path(), self.mode)?;
        self.check_interrupt()?;

        let compiled = Pipeline::new(source)?.compile(self.toolchain.as_ref())?;
        if let Err(e) = self.check_interrupt() {
            compiled.abort();
            return Err(e);
        }

        let executed = compiled.execute()?;
        if let Err(e) = self.check_interrupt() {
            executed.abort();
            return Err(e);
        }

        writeln!(out, "{}", executed.outcome().status())?;
        out.flush()?;

        executed.finish()
    }

    /// Every step runs regardless of the previous one; the exit status is the delete's.
    fn run_compat(&self, source: &Path, out: &mut dyn Write) -> Result<RunReport> {
        let started_at = Utc::now();
        let source = SourcePath::new(source);
        let artifact = source.artifact_path();
        validate_source(&source, &artifact, self.mode)?;
        if artifact.as_path() == source.as_path() {
            eprintln!(
                "asmrun: warning: {} has no extension; the compiler will overwrite it and the final delete will remove it",
                source.as_path().display()
            );
        }

        // The guard only covers an interrupt between steps; the trailing
        // delete below is unconditional.
        let guard = ArtifactGuard::arm(artifact.clone());

        let compile = pipeline::run_compiler(
            self.toolchain.as_ref(),
            source.as_path(),
            artifact.as_path(),
        );
        let (compiled, compile_ms) = match compile {
            Ok((status, elapsed_ms)) => (status.success(), elapsed_ms),
            Err(SequencerError::CompilerUnavailable { compiler, source }) => {
                eprintln!("asmrun: {}: {}", compiler, source);
                (false, 0)
            }
            Err(e) => return Err(e),
        };
        self.check_interrupt()?;

        let executable = artifact.executable();
        let (outcome, run_ms) = match pipeline::run_artifact(&executable) {
            Ok((status, elapsed_ms)) => (Some(RunOutcome::from_status(status)), elapsed_ms),
            Err(e) => {
                eprintln!("asmrun: {}: {}", executable.display(), e);
                (None, 0)
            }
        };
        self.check_interrupt()?;

        if let Some(outcome) = &outcome {
            writeln!(out, "{}", outcome.status())?;
            out.flush()?;
        }

        let artifact = guard.disarm();
        let cleanup = remove_unconditionally(artifact.as_path());
        if let CleanupStatus::Failed { error } = &cleanup {
            eprintln!(
                "asmrun: cannot remove '{}': {}",
                artifact.as_path().display(),
                error
            );
        }
        pipeline::record_cleanup(artifact.as_path(), &cleanup);

        Ok(RunReport {
            source,
            artifact,
            mode: SequencerMode::Compat,
            compiled,
            outcome,
            compile_ms,
            run_ms,
            cleanup,
            started_at,
            finished_at: Utc::now(),
        })
    }
}
