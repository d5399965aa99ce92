//! Process-scoped snapshot of the remote agent catalog.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::client::AgentServiceClient;
use crate::error::SyncError;
use crate::types::RemoteAgent;

/// Remote-name → agent snapshot, owned by a single batch invocation.
///
/// One bulk list call populates the cache; later lookups are served from
/// memory. A miss may trigger exactly one refresh to pick up agents created
/// earlier in the same batch. Never written back to the remote service.
#[derive(Default)]
pub struct ExistingAgentCache {
    agents: HashMap<String, RemoteAgent>,
    populated: bool,
}

impl ExistingAgentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot with a fresh bulk list.
    pub fn populate(&mut self, client: &dyn AgentServiceClient) -> Result<(), SyncError> {
        let listed = client.list_agents()?;
        info!("Found {} existing agents in the system", listed.len());
        self.agents = listed
            .into_iter()
            .map(|agent| (agent.name.clone(), agent))
            .collect();
        self.populated = true;
        Ok(())
    }

    pub fn ensure_populated(&mut self, client: &dyn AgentServiceClient) -> Result<(), SyncError> {
        if !self.populated {
            self.populate(client)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RemoteAgent> {
        self.agents.get(name)
    }

    /// Look up `name`, refreshing the snapshot at most once on a miss.
    pub fn get_or_refresh(
        &mut self,
        name: &str,
        client: &dyn AgentServiceClient,
    ) -> Result<Option<&RemoteAgent>, SyncError> {
        if !self.agents.contains_key(name) {
            debug!("Cache miss for '{}'; refreshing agent catalog", name);
            self.populate(client)?;
        }
        Ok(self.agents.get(name))
    }

    /// Record an agent created or updated during this batch so later
    /// definitions resolve against it without a remote refresh.
    pub fn insert(&mut self, agent: RemoteAgent) {
        self.agents.insert(agent.name.clone(), agent);
    }

    /// Name → id view of the current snapshot.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.agents
            .iter()
            .map(|(name, agent)| (name.clone(), agent.id.clone()))
            .collect()
    }

    pub fn invalidate(&mut self) {
        self.agents.clear();
        self.populated = false;
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
