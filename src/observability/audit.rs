/// Structured lifecycle events
///
/// Each pipeline step emits one JSON line on the `asmrun::audit` log target,
/// so `RUST_LOG=asmrun::audit=info` gives a machine-readable trace of a run
/// without touching stdout.
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

pub const TARGET: &str = "asmrun::audit";

/// Types of lifecycle events we track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    CompileStart,
    CompileEnd,
    RunStart,
    RunEnd,
    CleanupSuccess,
    CleanupSkipped,
    CleanupFailure,
}

impl EventType {
    fn level(self) -> log::Level {
        match self {
            Self::CleanupFailure => log::Level::Warn,
            _ => log::Level::Info,
        }
    }
}

/// One audit record
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub event: EventType,
    pub timestamp: DateTime<Utc>,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl AuditEvent {
    pub fn new(event: EventType, path: &Path) -> Self {
        Self {
            event,
            timestamp: Utc::now(),
            path: path.display().to_string(),
            status: None,
            elapsed_ms: None,
            detail: None,
        }
    }

    pub fn with_status(mut self, status: Option<i32>) -> Self {
        self.status = status;
        self
    }

    pub fn with_elapsed(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = Some(elapsed_ms);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn emit(&self) {
        let level = self.event.level();
        if !log::log_enabled!(target: TARGET, level) {
            return;
        }
        match serde_json::to_string(self) {
            Ok(line) => log::log!(target: TARGET, level, "{}", line),
            Err(e) => log::error!("Failed to serialize audit event {:?}: {}", self.event, e),
        }
    }
}

/// Convenience functions for the pipeline steps
pub mod events {
    use super::{AuditEvent, EventType};
    use std::path::Path;

    pub fn compile_start(source: &Path, command_line: &str) {
        AuditEvent::new(EventType::CompileStart, source)
            .with_detail(command_line)
            .emit();
    }

    pub fn compile_end(source: &Path, status: Option<i32>, elapsed_ms: u64) {
        AuditEvent::new(EventType::CompileEnd, source)
            .with_status(status)
            .with_elapsed(elapsed_ms)
            .emit();
    }

    pub fn run_start(artifact: &Path) {
        AuditEvent::new(EventType::RunStart, artifact).emit();
    }

    pub fn run_end(artifact: &Path, status: Option<i32>, elapsed_ms: u64) {
        AuditEvent::new(EventType::RunEnd, artifact)
            .with_status(status)
            .with_elapsed(elapsed_ms)
            .emit();
    }

    pub fn cleanup_success(artifact: &Path) {
        AuditEvent::new(EventType::CleanupSuccess, artifact).emit();
    }

    pub fn cleanup_skipped(artifact: &Path) {
        AuditEvent::new(EventType::CleanupSkipped, artifact)
            .with_detail("nothing to remove")
            .emit();
    }

    pub fn cleanup_failure(artifact: &Path, error: &str) {
        AuditEvent::new(EventType::CleanupFailure, artifact)
            .with_detail(error)
            .emit();
    }
}
