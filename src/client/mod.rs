//! Remote agent service access.
//!
//! The core consumes the narrow [`AgentServiceClient`] capability trait; any
//! backend or test double implements just these five operations.

pub mod http;
pub mod retry;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::SyncError;
use crate::types::{RemoteAgent, ToolSpec};

pub use http::HttpAgentClient;
pub use retry::RetryPolicy;

/// Outgoing create/update payload.
///
/// Built by the upsert engine after name prefixing, model resolution, and
/// connected-agent reference resolution. Carrier-only fields from the file
/// format never appear here.
#[derive(Debug, Clone, Serialize)]
pub struct AgentPayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub instructions: String,
    pub model: String,
    pub tools: Vec<ToolSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_resources: Option<Value>,
    pub temperature: f64,
    pub top_p: f64,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

/// Capability interface over the remote agent catalog.
pub trait AgentServiceClient {
    fn list_agents(&self) -> Result<Vec<RemoteAgent>, SyncError>;
    fn create_agent(&self, payload: &AgentPayload) -> Result<RemoteAgent, SyncError>;
    fn update_agent(&self, agent_id: &str, payload: &AgentPayload)
        -> Result<RemoteAgent, SyncError>;
    fn get_agent(&self, agent_id: &str) -> Result<Option<RemoteAgent>, SyncError>;
    fn delete_agent(&self, agent_id: &str) -> Result<(), SyncError>;
}
