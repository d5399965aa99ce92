//! Tooling & Integration Layer
//!
//! Command-line interface for agent synchronization operations.

pub mod cli;

pub use cli::{Cli, CliContext, Commands};
