//! Safety and cleanup
//!
//! Guarantees the artifact file does not outlive the run.

pub mod artifact;
