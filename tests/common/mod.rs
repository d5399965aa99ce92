//! Shared in-memory test double for the remote agent service.

use std::cell::RefCell;

use agent_sync::client::{AgentPayload, AgentServiceClient};
use agent_sync::error::SyncError;
use agent_sync::types::RemoteAgent;
use serde_json::Map;

/// In-memory agent catalog implementing the capability trait.
///
/// Records every call so tests can assert ordering, and can be armed to fail
/// a number of create/update calls transiently.
#[derive(Default)]
pub struct MockAgentClient {
    agents: RefCell<Vec<RemoteAgent>>,
    next_id: RefCell<u32>,
    calls: RefCell<Vec<String>>,
    transient_failures: RefCell<u32>,
}

impl MockAgentClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the catalog with already-existing agents.
    pub fn with_existing(names: &[&str]) -> Self {
        let client = Self::new();
        for name in names {
            let id = client.mint_id();
            client.agents.borrow_mut().push(RemoteAgent {
                id,
                name: name.to_string(),
                rest: Map::new(),
            });
        }
        client
    }

    /// Fail the next `count` create/update calls with a transport error.
    pub fn fail_transient_times(&self, count: u32) {
        *self.transient_failures.borrow_mut() = count;
    }

    pub fn agent_named(&self, name: &str) -> Option<RemoteAgent> {
        self.agents.borrow().iter().find(|a| a.name == name).cloned()
    }

    pub fn call_log(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Calls matching a prefix, e.g. `create:` for creation order.
    pub fn calls_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .cloned()
            .collect()
    }

    fn mint_id(&self) -> String {
        let mut next = self.next_id.borrow_mut();
        *next += 1;
        format!("id-{}", *next)
    }

    fn take_transient_failure(&self) -> bool {
        let mut remaining = self.transient_failures.borrow_mut();
        if *remaining > 0 {
            *remaining -= 1;
            true
        } else {
            false
        }
    }

    fn materialize(&self, id: String, payload: &AgentPayload) -> RemoteAgent {
        let mut rest = Map::new();
        rest.insert("model".to_string(), payload.model.clone().into());
        rest.insert(
            "instructions".to_string(),
            payload.instructions.clone().into(),
        );
        if let Some(description) = &payload.description {
            rest.insert("description".to_string(), description.clone().into());
        }
        rest.insert(
            "tools".to_string(),
            serde_json::to_value(&payload.tools).expect("tools serialize"),
        );
        RemoteAgent {
            id,
            name: payload.name.clone(),
            rest,
        }
    }
}

impl AgentServiceClient for MockAgentClient {
    fn list_agents(&self) -> Result<Vec<RemoteAgent>, SyncError> {
        self.calls.borrow_mut().push("list".to_string());
        Ok(self.agents.borrow().clone())
    }

    fn create_agent(&self, payload: &AgentPayload) -> Result<RemoteAgent, SyncError> {
        self.calls
            .borrow_mut()
            .push(format!("create:{}", payload.name));
        if self.take_transient_failure() {
            return Err(SyncError::TransportError("connection reset".to_string()));
        }
        let agent = self.materialize(self.mint_id(), payload);
        self.agents.borrow_mut().push(agent.clone());
        Ok(agent)
    }

    fn update_agent(&self, agent_id: &str, payload: &AgentPayload) -> Result<RemoteAgent, SyncError> {
        self.calls
            .borrow_mut()
            .push(format!("update:{}", payload.name));
        if self.take_transient_failure() {
            return Err(SyncError::TransportError("connection reset".to_string()));
        }
        let mut agents = self.agents.borrow_mut();
        let slot = agents
            .iter_mut()
            .find(|a| a.id == agent_id)
            .ok_or_else(|| SyncError::NotFound(agent_id.to_string()))?;
        *slot = self.materialize(agent_id.to_string(), payload);
        Ok(slot.clone())
    }

    fn get_agent(&self, agent_id: &str) -> Result<Option<RemoteAgent>, SyncError> {
        self.calls
            .borrow_mut()
            .push(format!("get:{}", agent_id));
        Ok(self.agents.borrow().iter().find(|a| a.id == agent_id).cloned())
    }

    fn delete_agent(&self, agent_id: &str) -> Result<(), SyncError> {
        self.calls
            .borrow_mut()
            .push(format!("delete:{}", agent_id));
        let mut agents = self.agents.borrow_mut();
        let before = agents.len();
        agents.retain(|a| a.id != agent_id);
        if agents.len() == before {
            return Err(SyncError::NotFound(agent_id.to_string()));
        }
        Ok(())
    }
}
