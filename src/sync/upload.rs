//! Ordered upsert engine.
//!
//! Walks a dependency-sorted batch of definitions, resolves connected-agent
//! references through the existing-agent cache, and issues idempotent
//! create-or-update calls with retry on transient failures.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::client::{AgentPayload, AgentServiceClient, RetryPolicy};
use crate::error::SyncError;
use crate::formats::{self, FileFormat};
use crate::graph::{dependency_sort, transitive_closure};
use crate::naming::{effective_agent_name, normalize_alias, validate_agent_name};
use crate::sync::cache::ExistingAgentCache;
use crate::types::{
    AgentDefinition, ConnectedAgentRef, ConnectedAgentTag, ConnectedAgentTool, RemoteAgent,
    ToolSpec, UNKNOWN_AGENT,
};

/// Model sent when neither the definition, the configuration, nor the
/// environment names one. The remote service rejects it with its own error.
pub const PLACEHOLDER_MODEL: &str = "default";

/// Environment fallback consulted after the configured default model.
pub const MODEL_ENV_VAR: &str = "AGENT_SYNC_MODEL";

/// Caller-supplied knobs for a batch upload.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    pub prefix: String,
    pub suffix: String,
    pub default_model: Option<String>,
    pub retry: RetryPolicy,
}

/// Create or update every definition in dependency order.
///
/// The cache is created here and discarded when the batch ends; no state
/// survives the call. Completed upserts stay in place if a later one fails.
pub fn create_or_update_agents(
    definitions: &[AgentDefinition],
    client: &dyn AgentServiceClient,
    options: &UploadOptions,
) -> Result<Vec<RemoteAgent>, SyncError> {
    info!("Sorting {} agents into dependency order", definitions.len());
    let ordered = dependency_sort(definitions)?;
    debug!(
        "Processing order: {:?}",
        ordered.iter().map(|d| d.name.as_str()).collect::<Vec<_>>()
    );

    let mut cache = ExistingAgentCache::new();
    options
        .retry
        .run("agent catalog listing", || cache.populate(client))?;

    let mut processed = Vec::with_capacity(ordered.len());
    for definition in ordered {
        info!("Processing: {}", definition.name);
        let agent = create_or_update_agent(definition, client, &mut cache, options)?;
        processed.push(agent);
    }
    info!("Completed; processed {} agents", processed.len());
    Ok(processed)
}

/// Create or update a single definition against the remote catalog.
///
/// An agent whose effective name already exists is updated in place;
/// otherwise it is created. Either way the cache records the result so later
/// definitions in the same batch resolve against it.
pub fn create_or_update_agent(
    definition: &AgentDefinition,
    client: &dyn AgentServiceClient,
    cache: &mut ExistingAgentCache,
    options: &UploadOptions,
) -> Result<RemoteAgent, SyncError> {
    cache.ensure_populated(client)?;
    let payload = build_payload(definition, client, cache, options)?;

    let existing_id = cache.get(&payload.name).map(|agent| agent.id.clone());
    let result = match &existing_id {
        Some(id) => {
            info!("Updating existing agent: {}", payload.name);
            options
                .retry
                .run(&payload.name, || client.update_agent(id, &payload))
        }
        None => {
            info!("Creating new agent: {}", payload.name);
            options
                .retry
                .run(&payload.name, || client.create_agent(&payload))
        }
    };

    let agent = result.map_err(|err| attach_retry_context(&definition.name, options, err))?;
    cache.insert(agent.clone());
    Ok(agent)
}

/// Load every definition file of one format from `dir` and upload the batch.
pub fn upload_agents_from_dir(
    dir: &Path,
    format: FileFormat,
    client: &dyn AgentServiceClient,
    options: &UploadOptions,
) -> Result<Vec<RemoteAgent>, SyncError> {
    let definitions = formats::read_agent_files(dir, format)?;
    if definitions.is_empty() {
        info!("No agent definition files found in {}", dir.display());
        return Ok(Vec::new());
    }
    info!("Found {} agents", definitions.len());
    create_or_update_agents(&definitions, client, options)
}

/// Upload one named definition plus its transitive dependencies from `dir`.
pub fn upload_agent_from_dir(
    name: &str,
    dir: &Path,
    format: FileFormat,
    client: &dyn AgentServiceClient,
    options: &UploadOptions,
) -> Result<Vec<RemoteAgent>, SyncError> {
    let definitions = formats::read_agent_files(dir, format)?;
    let selected = transitive_closure(name, &definitions)?;
    debug!(
        "Uploading '{}' with {} definitions in its closure",
        name,
        selected.len()
    );
    create_or_update_agents(&selected, client, options)
}

fn attach_retry_context(agent: &str, options: &UploadOptions, err: SyncError) -> SyncError {
    if err.is_transient() {
        SyncError::RetriesExhausted {
            agent: agent.to_string(),
            attempts: options.retry.attempts(),
            source: Box::new(err),
        }
    } else {
        err
    }
}

fn build_payload(
    definition: &AgentDefinition,
    client: &dyn AgentServiceClient,
    cache: &mut ExistingAgentCache,
    options: &UploadOptions,
) -> Result<AgentPayload, SyncError> {
    definition.validate()?;
    let effective = effective_agent_name(&definition.name, &options.prefix, &options.suffix);
    validate_agent_name(&effective)?;

    Ok(AgentPayload {
        name: effective,
        description: definition.description.clone(),
        instructions: definition.instructions.clone().unwrap_or_default(),
        model: resolve_model(definition, options),
        tools: resolve_tools(definition, client, cache, options)?,
        tool_resources: definition.tool_resources.clone(),
        temperature: definition.temperature.unwrap_or(1.0),
        top_p: definition.top_p.unwrap_or(1.0),
        metadata: definition.metadata.clone(),
    })
}

/// Model precedence: definition field, configured default, environment,
/// placeholder-with-warning. Never a hard failure; the remote service gives
/// a clearer error for a bad model than this tool could.
fn resolve_model(definition: &AgentDefinition, options: &UploadOptions) -> String {
    if let Some(model) = definition.model.as_deref().filter(|m| !m.is_empty()) {
        return model.to_string();
    }
    if let Some(model) = options.default_model.as_deref().filter(|m| !m.is_empty()) {
        return model.to_string();
    }
    if let Ok(model) = std::env::var(MODEL_ENV_VAR) {
        if !model.is_empty() {
            return model;
        }
    }
    warn!(
        "No model configured for agent '{}'; using placeholder '{}'. \
         Set a 'model' field or a default model.",
        definition.name, PLACEHOLDER_MODEL
    );
    PLACEHOLDER_MODEL.to_string()
}

/// Resolve connected-agent entries to remote ids; pass every other tool
/// through untouched. Unresolved references are dropped with a warning so a
/// partial graph still deploys.
fn resolve_tools(
    definition: &AgentDefinition,
    client: &dyn AgentServiceClient,
    cache: &mut ExistingAgentCache,
    options: &UploadOptions,
) -> Result<Vec<ToolSpec>, SyncError> {
    let mut resolved = Vec::with_capacity(definition.tools.len());
    for tool in &definition.tools {
        match tool {
            ToolSpec::ConnectedAgent(connected) => {
                if let Some(entry) =
                    resolve_connected_ref(&definition.name, connected, client, cache, options)?
                {
                    resolved.push(ToolSpec::ConnectedAgent(entry));
                }
            }
            other => resolved.push(other.clone()),
        }
    }
    Ok(resolved)
}

fn resolve_connected_ref(
    agent_name: &str,
    tool: &ConnectedAgentTool,
    client: &dyn AgentServiceClient,
    cache: &mut ExistingAgentCache,
    options: &UploadOptions,
) -> Result<Option<ConnectedAgentTool>, SyncError> {
    let reference = &tool.connected_agent;

    let base = match &reference.name_from_id {
        Some(name) if name != UNKNOWN_AGENT => name.clone(),
        Some(_) => {
            warn!(
                "Connected agent reference on '{}' carries the unknown-agent \
                 placeholder; dropping tool entry",
                agent_name
            );
            return Ok(None);
        }
        None => match (&reference.name, &reference.id) {
            (Some(alias), _) => alias.clone(),
            (None, Some(_)) => {
                // Already carries a resolved id and nothing to re-resolve
                debug!(
                    "Connected agent reference on '{}' kept with its existing id",
                    agent_name
                );
                return Ok(Some(tool.clone()));
            }
            (None, None) => {
                warn!(
                    "Connected agent reference on '{}' names no target; dropping tool entry",
                    agent_name
                );
                return Ok(None);
            }
        },
    };

    let target = effective_agent_name(&base, &options.prefix, &options.suffix);
    match cache.get_or_refresh(&target, client)? {
        Some(found) => {
            debug!("Resolved '{}' to ID: {}", target, found.id);
            Ok(Some(ConnectedAgentTool {
                kind: ConnectedAgentTag::ConnectedAgent,
                connected_agent: ConnectedAgentRef {
                    id: Some(found.id.clone()),
                    name: Some(normalize_alias(&base)),
                    description: reference.description.clone(),
                    name_from_id: None,
                },
            }))
        }
        None => {
            warn!(
                "Unable to resolve connected agent '{}' for '{}'; dropping tool entry",
                target, agent_name
            );
            Ok(None)
        }
    }
}
