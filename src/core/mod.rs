//! Sequencer core.
//!
//! Owns the path model and the strict and compat run sequences. Process
//! spawning lives in [`crate::exec`]; artifact deletion in [`crate::safety`].

pub mod sequencer;
pub mod types;
