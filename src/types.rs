//! Core data model: agent definitions, tool specs, and remote agent objects.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SyncError;

/// Tool type tag for connected-agent references.
pub const CONNECTED_AGENT_TYPE: &str = "connected_agent";

/// Placeholder written on download when a connected agent's id cannot be
/// resolved back to a name. Never treated as a real dependency on upload.
pub const UNKNOWN_AGENT: &str = "Unknown Agent";

/// Agent definition as stored in files.
///
/// `model` is optional here; the upsert engine resolves an effective model
/// through the configured default and environment before falling back to a
/// placeholder. Unknown fields are preserved for roundtrips.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_resources: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AgentDefinition {
    /// Structural validation applied before any remote call.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.name.trim().is_empty() {
            return Err(SyncError::ValidationError {
                agent: self.name.clone(),
                reason: "agent name cannot be empty".to_string(),
            });
        }
        match &self.instructions {
            Some(instructions) if !instructions.trim().is_empty() => Ok(()),
            _ => Err(SyncError::ValidationError {
                agent: self.name.clone(),
                reason: "missing required 'instructions' field".to_string(),
            }),
        }
    }
}

/// One entry of an agent's `tools` sequence.
///
/// Connected-agent entries are parsed structurally; every other tool shape
/// passes through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolSpec {
    ConnectedAgent(ConnectedAgentTool),
    Other(Value),
}

impl ToolSpec {
    pub fn as_connected_agent(&self) -> Option<&ConnectedAgentTool> {
        match self {
            ToolSpec::ConnectedAgent(tool) => Some(tool),
            ToolSpec::Other(_) => None,
        }
    }
}

/// Tool spec of shape `{type: "connected_agent", connected_agent: {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedAgentTool {
    #[serde(rename = "type")]
    pub kind: ConnectedAgentTag,
    pub connected_agent: ConnectedAgentRef,
}

/// Marker tag restricting [`ConnectedAgentTool`] to `connected_agent` entries
/// during untagged deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectedAgentTag {
    #[serde(rename = "connected_agent")]
    ConnectedAgent,
}

/// The reference payload inside a connected-agent tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectedAgentRef {
    /// Remote id of the target agent; resolved by the upsert engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Identifier-constrained alias used by the hosting service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Portable reference to the target agent's base name. Written on
    /// download, consumed on upload, stripped from outgoing payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_from_id: Option<String>,
}

/// Agent object returned by the remote service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteAgent {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}
