//! Download path: fetch remote agents, generalize them into portable
//! definitions, and write them through the format layer.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::client::AgentServiceClient;
use crate::error::SyncError;
use crate::formats::{self, FileFormat};
use crate::naming::{effective_agent_name, trim_agent_name, validate_agent_name};
use crate::types::{AgentDefinition, RemoteAgent, CONNECTED_AGENT_TYPE, UNKNOWN_AGENT};

/// Resource-specific keys stripped from generalized definitions.
const STRIP_KEYS: [&str; 3] = ["id", "created_at", "object"];

#[derive(Debug, Clone, Default)]
pub struct DownloadOptions {
    pub prefix: String,
    pub suffix: String,
    pub format: FileFormat,
}

/// Resolve a remote id back to the agent's name.
///
/// Best-effort: remote failures are absorbed with a warning so a single
/// broken reference does not abort a whole download.
pub fn get_agent_name(agent_id: &str, client: &dyn AgentServiceClient) -> Option<String> {
    match client.get_agent(agent_id) {
        Ok(Some(agent)) => Some(agent.name),
        Ok(None) => {
            warn!("No agent found for ID {}", agent_id);
            None
        }
        Err(err) => {
            warn!("Error getting agent name for ID {}: {}", agent_id, err);
            None
        }
    }
}

/// Find a remote agent by exact name.
pub fn get_agent_by_name(
    name: &str,
    client: &dyn AgentServiceClient,
) -> Result<Option<RemoteAgent>, SyncError> {
    let agents = client.list_agents()?;
    Ok(agents.into_iter().find(|agent| agent.name == name))
}

/// Strip resource-specific fields and convert connected-agent ids back to
/// portable `name_from_id` references, trimming prefix/suffix from names.
pub fn generalize_agent_value(
    data: &Value,
    client: &dyn AgentServiceClient,
    prefix: &str,
    suffix: &str,
) -> Value {
    match data {
        Value::Object(map) => {
            let is_connected =
                map.get("type").and_then(Value::as_str) == Some(CONNECTED_AGENT_TYPE);
            let resolved_name = if is_connected {
                map.get("connected_agent")
                    .and_then(|c| c.get("id"))
                    .and_then(Value::as_str)
                    .and_then(|id| get_agent_name(id, client))
            } else {
                None
            };

            let mut out = Map::new();
            for (key, value) in map {
                if STRIP_KEYS.contains(&key.as_str()) {
                    continue;
                }
                if is_connected && key == "connected_agent" {
                    let mut nested = generalize_agent_value(value, client, prefix, suffix);
                    if let Value::Object(nested_map) = &mut nested {
                        let label = resolved_name
                            .as_deref()
                            .map(|name| trim_agent_name(name, prefix, suffix))
                            .unwrap_or_else(|| UNKNOWN_AGENT.to_string());
                        nested_map.insert("name_from_id".to_string(), Value::String(label));
                    }
                    out.insert(key.clone(), nested);
                } else if !is_connected && key == "name" && value.is_string() {
                    let trimmed = value
                        .as_str()
                        .map(|name| trim_agent_name(name, prefix, suffix))
                        .unwrap_or_default();
                    out.insert(key.clone(), Value::String(trimmed));
                } else {
                    out.insert(
                        key.clone(),
                        generalize_agent_value(value, client, prefix, suffix),
                    );
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| generalize_agent_value(item, client, prefix, suffix))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Download every remote agent matching the prefix/suffix filter into `dir`.
/// Returns the number of files written.
pub fn download_agents(
    client: &dyn AgentServiceClient,
    dir: &Path,
    options: &DownloadOptions,
) -> Result<usize, SyncError> {
    let agents = client.list_agents()?;
    ensure_dir(dir)?;

    let mut saved = 0;
    for agent in &agents {
        if !(agent.name.starts_with(&options.prefix) && agent.name.ends_with(&options.suffix)) {
            debug!(
                "Skipping agent '{}'; doesn't match prefix/suffix filter",
                agent.name
            );
            continue;
        }
        let path = write_generalized(agent, client, dir, options)?;
        info!("Saved agent '{}' to {}", agent.name, path.display());
        saved += 1;
    }
    Ok(saved)
}

/// Download one agent by base name (prefix/suffix applied for the remote
/// lookup, stripped again on disk).
pub fn download_agent(
    name: &str,
    client: &dyn AgentServiceClient,
    dir: &Path,
    options: &DownloadOptions,
) -> Result<PathBuf, SyncError> {
    let full_name = effective_agent_name(name, &options.prefix, &options.suffix);
    validate_agent_name(&full_name)?;
    let agent = get_agent_by_name(&full_name, client)?
        .ok_or_else(|| SyncError::NotFound(full_name.clone()))?;

    ensure_dir(dir)?;
    let path = write_generalized(&agent, client, dir, options)?;
    info!("Saved agent '{}' to {}", agent.name, path.display());
    Ok(path)
}

fn ensure_dir(dir: &Path) -> Result<(), SyncError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        SyncError::StorageError(format!("Could not create directory '{}': {}", dir.display(), e))
    })
}

fn write_generalized(
    agent: &RemoteAgent,
    client: &dyn AgentServiceClient,
    dir: &Path,
    options: &DownloadOptions,
) -> Result<PathBuf, SyncError> {
    let raw = serde_json::to_value(agent)?;
    let clean = generalize_agent_value(&raw, client, &options.prefix, &options.suffix);
    let definition: AgentDefinition = serde_json::from_value(clean)?;

    let base_name = trim_agent_name(&agent.name, &options.prefix, &options.suffix);
    let path = dir.join(format!("{}{}", base_name, options.format.extension()));
    formats::save_agent_file(&definition, &path, options.format)?;
    Ok(path)
}
