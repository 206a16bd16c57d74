//! Execution control
//!
//! Compiles the source and runs the artifact, with type-state enforcement of
//! the step order.

pub mod pipeline;
pub mod toolchain;
