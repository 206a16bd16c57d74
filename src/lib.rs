//! asmrun: compile a single assembly or C source file, run it, print its exit
//! status and delete the binary
//!
//! `asmrun ret42.s` builds `ret42` with the system compiler and debug symbols,
//! runs it with the terminal attached, prints `42` and removes `ret42`.
//!
//! # Architecture
//!
//! ## Sequencer Core ([`core`])
//! - [`core::types`]: Source/artifact path model and the run report
//! - [`core::sequencer`]: Strict (gated) and compat (unchecked) sequences
//!
//! ## Execution Control ([`exec`])
//! - [`exec::toolchain`]: Compiler invocation seam
//! - [`exec::pipeline`]: Type-state enforced compile/execute/finish ordering
//!
//! ## Verdict ([`verdict`])
//! - [`verdict::classify`]: Wait status to printed status, pipeline result to exit code
//!
//! ## Safety & Cleanup ([`safety`])
//! - [`safety::artifact`]: Scoped artifact ownership with idempotent deletion
//!
//! ## Observability ([`observability`])
//! - [`observability::audit`]: Structured lifecycle events
//!
//! ## Configuration ([`config`])
//! - [`config::types`]: Modes, exit codes and the error taxonomy
//! - [`config::validator`]: Pre-flight source validation
//!
//! ## Signals ([`signal`])
//! - Async-safe interrupt latch so the artifact is deleted after Ctrl-C
//!
//! # Design Principles
//!
//! 1. **Stdout is the status** - Logs and diagnostics go to stderr
//! 2. **Gate every step** - A failed compile never runs a stale binary
//! 3. **Types prevent errors** - Running before compiling does not type-check
//! 4. **Cleanup on every path** - The artifact guard deletes on drop

// Sequencer Core
pub mod core;

// Execution Control
pub mod exec;

// Verdict
pub mod verdict;

// Safety & Cleanup
pub mod safety;

// Observability
pub mod observability;

// Configuration
pub mod config;

// Signal latch
pub mod signal;

// CLI entrypoint wiring for the asmrun binary.
pub mod cli;

// Re-export commonly used types for convenience
pub use config::types::*;
pub use core::sequencer::Sequencer;
