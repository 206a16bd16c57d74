//! Configuration and error taxonomy
//!
//! Typed runtime configuration, exit-code table and source validation.

pub mod types;
pub mod validator;
