//! Agent Sync: Dependency-Aware Agent Definition Synchronization
//!
//! Synchronizes agent definitions stored as flat files (JSON, YAML, Markdown)
//! with a remote agent-hosting service. Definitions referencing each other via
//! connected-agent tools are created in dependency order.

pub mod client;
pub mod config;
pub mod error;
pub mod formats;
pub mod graph;
pub mod logging;
pub mod naming;
pub mod sync;
pub mod tooling;
pub mod types;
