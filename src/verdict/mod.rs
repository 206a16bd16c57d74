//! Outcome classification
//!
//! Derives the printed status and the runner's exit code from wait status
//! and pipeline results.

pub mod classify;
