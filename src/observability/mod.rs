//! Observability
//!
//! Structured lifecycle events on the `log` facade.

pub mod audit;
