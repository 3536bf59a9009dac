//! Command-line command handlers.
//!
//! One-shot commands that inspect or change the saved alarm without starting the
//! runtime loop. Each command lives in its own submodule.

pub mod clear;
pub mod help;
pub mod status;
