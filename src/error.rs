//! Error types shared across the crate.

use thiserror::Error;

/// Crate-wide error type.
///
/// The upsert engine retries only errors classified as transient by
/// [`SyncError::is_transient`]; everything else surfaces immediately.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Configuration loading or resolution failed
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An agent definition failed structural validation
    #[error("Invalid agent definition '{agent}': {reason}")]
    ValidationError { agent: String, reason: String },

    /// The dependency graph contains a cycle; members are listed
    #[error("Circular dependencies detected for: {}", .0.join(", "))]
    CyclicDependency(Vec<String>),

    /// Network or service-level failure that may succeed on retry
    #[error("Transport error: {0}")]
    TransportError(String),

    /// The remote service rejected the request (not retried)
    #[error("Remote service rejected request: {0}")]
    RemoteRejected(String),

    /// A named agent does not exist remotely
    #[error("Agent not found: {0}")]
    NotFound(String),

    /// Reading or writing definition files failed
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Encoding or decoding an agent definition failed
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Retry budget for one agent was exhausted; the final error is preserved
    #[error("Giving up on agent '{agent}' after {attempts} attempts: {source}")]
    RetriesExhausted {
        agent: String,
        attempts: u32,
        #[source]
        source: Box<SyncError>,
    },
}

impl SyncError {
    /// Whether the upsert engine should retry the failed remote call.
    pub fn is_transient(&self) -> bool {
        matches!(self, SyncError::TransportError(_))
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for SyncError {
    fn from(err: serde_yaml::Error) -> Self {
        SyncError::SerializationError(err.to_string())
    }
}
