//! HTTP implementation of the agent service capability interface.
//!
//! The sync engine is strictly sequential, so this client owns a
//! current-thread tokio runtime and bridges each async reqwest call to a
//! blocking one at the boundary. Failures are classified into transient
//! transport errors (retried upstream) and remote rejections (surfaced).

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use tokio::runtime::Runtime;

use crate::client::{AgentPayload, AgentServiceClient};
use crate::error::SyncError;
use crate::types::RemoteAgent;

pub struct HttpAgentClient {
    base_url: String,
    api_key: Option<String>,
    http: Client,
    runtime: Runtime,
}

impl HttpAgentClient {
    pub fn new(endpoint: &str, api_key: Option<String>) -> Result<Self, SyncError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                SyncError::ConfigError(format!("Failed to create client runtime: {}", e))
            })?;
        let http = Client::builder()
            .build()
            .map_err(|e| SyncError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            base_url: endpoint.trim_end_matches('/').to_string(),
            api_key,
            http,
            runtime,
        })
    }

    fn agents_url(&self) -> String {
        format!("{}/agents", self.base_url)
    }

    fn agent_url(&self, agent_id: &str) -> String {
        format!("{}/agents/{}", self.base_url, agent_id)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Send a request and interpret the response status.
    fn execute(&self, request: RequestBuilder) -> Result<Value, SyncError> {
        self.runtime.block_on(async {
            let response = request
                .send()
                .await
                .map_err(|e| SyncError::TransportError(e.to_string()))?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| SyncError::TransportError(e.to_string()))?;

            if status.is_success() {
                if body.is_empty() {
                    return Ok(Value::Null);
                }
                serde_json::from_str(&body).map_err(|e| {
                    SyncError::SerializationError(format!("Invalid response body: {}", e))
                })
            } else if status == StatusCode::NOT_FOUND {
                Err(SyncError::NotFound(body))
            } else if is_transient_status(status) {
                Err(SyncError::TransportError(format!("{}: {}", status, body)))
            } else {
                Err(SyncError::RemoteRejected(format!("{}: {}", status, body)))
            }
        })
    }
}

/// Timeouts, throttling, and server-side failures may succeed on retry.
fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

/// Accept both a bare array and a `{"data": [...]}` envelope.
fn parse_agent_list(value: Value) -> Result<Vec<RemoteAgent>, SyncError> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(SyncError::SerializationError(
                    "Agent list response missing 'data' array".to_string(),
                ))
            }
        },
        other => {
            return Err(SyncError::SerializationError(format!(
                "Unexpected agent list response: {}",
                other
            )))
        }
    };
    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(SyncError::from))
        .collect()
}

impl AgentServiceClient for HttpAgentClient {
    fn list_agents(&self) -> Result<Vec<RemoteAgent>, SyncError> {
        let value = self.execute(self.authorize(self.http.get(self.agents_url())))?;
        parse_agent_list(value)
    }

    fn create_agent(&self, payload: &AgentPayload) -> Result<RemoteAgent, SyncError> {
        let value = self.execute(self.authorize(self.http.post(self.agents_url()).json(payload)))?;
        serde_json::from_value(value).map_err(SyncError::from)
    }

    fn update_agent(
        &self,
        agent_id: &str,
        payload: &AgentPayload,
    ) -> Result<RemoteAgent, SyncError> {
        let value =
            self.execute(self.authorize(self.http.post(self.agent_url(agent_id)).json(payload)))?;
        serde_json::from_value(value).map_err(SyncError::from)
    }

    fn get_agent(&self, agent_id: &str) -> Result<Option<RemoteAgent>, SyncError> {
        match self.execute(self.authorize(self.http.get(self.agent_url(agent_id)))) {
            Ok(value) => Ok(Some(serde_json::from_value(value)?)),
            Err(SyncError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn delete_agent(&self, agent_id: &str) -> Result<(), SyncError> {
        self.execute(self.authorize(self.http.delete(self.agent_url(agent_id))))?;
        Ok(())
    }
}
