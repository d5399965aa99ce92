//! Download and generalization behavior, plus a full upload/download
//! roundtrip against the in-memory service double.

mod common;

use std::time::Duration;

use agent_sync::client::{AgentServiceClient, RetryPolicy};
use agent_sync::error::SyncError;
use agent_sync::formats::{load_agent_file, FileFormat};
use agent_sync::sync::{
    create_or_update_agents, download_agent, download_agents, DownloadOptions, UploadOptions,
};
use agent_sync::types::AgentDefinition;
use common::MockAgentClient;
use serde_json::json;

fn definition(value: serde_json::Value) -> AgentDefinition {
    serde_json::from_value(value).unwrap()
}

fn fast_options(prefix: &str, suffix: &str) -> UploadOptions {
    UploadOptions {
        prefix: prefix.to_string(),
        suffix: suffix.to_string(),
        retry: RetryPolicy::new(3, Duration::ZERO).without_jitter(),
        ..Default::default()
    }
}

fn seed_linked_agents(client: &MockAgentClient, prefix: &str, suffix: &str) {
    let defs = vec![
        definition(json!({
            "name": "top", "model": "m", "instructions": "delegate",
            "tools": [{"type": "connected_agent", "connected_agent": {"name_from_id": "sub"}}],
        })),
        definition(json!({"name": "sub", "model": "m", "instructions": "work"})),
    ];
    create_or_update_agents(&defs, client, &fast_options(prefix, suffix)).unwrap();
}

#[test]
fn download_all_writes_generalized_definitions() {
    let client = MockAgentClient::new();
    seed_linked_agents(&client, "", "");
    let dir = tempfile::tempdir().unwrap();

    let saved = download_agents(
        &client,
        dir.path(),
        &DownloadOptions::default(),
    )
    .unwrap();
    assert_eq!(saved, 2);

    let top: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("top.json")).unwrap())
            .unwrap();
    // Resource-specific fields are stripped
    assert!(top.get("id").is_none());
    // The connected-agent id is converted back to a portable name reference
    let connected = &top["tools"][0]["connected_agent"];
    assert_eq!(connected["name_from_id"], json!("sub"));
    assert!(connected.get("id").is_none());
}

#[test]
fn download_trims_prefix_and_suffix() {
    let client = MockAgentClient::new();
    seed_linked_agents(&client, "dev-", "-v1");
    let dir = tempfile::tempdir().unwrap();

    let options = DownloadOptions {
        prefix: "dev-".to_string(),
        suffix: "-v1".to_string(),
        format: FileFormat::Json,
    };
    let saved = download_agents(&client, dir.path(), &options).unwrap();
    assert_eq!(saved, 2);

    // File names and the embedded definition use the base name
    let top = load_agent_file(&dir.path().join("top.json"), FileFormat::Json).unwrap();
    assert_eq!(top.name, "top");
    let tool = top.tools[0].as_connected_agent().unwrap();
    assert_eq!(tool.connected_agent.name_from_id.as_deref(), Some("sub"));
}

#[test]
fn download_filters_by_prefix_and_suffix() {
    let client = MockAgentClient::with_existing(&["dev-keep-v1", "other-skip"]);
    let dir = tempfile::tempdir().unwrap();

    let options = DownloadOptions {
        prefix: "dev-".to_string(),
        suffix: "-v1".to_string(),
        format: FileFormat::Json,
    };
    let saved = download_agents(&client, dir.path(), &options).unwrap();
    assert_eq!(saved, 1);
    assert!(dir.path().join("keep.json").exists());
    assert!(!dir.path().join("skip.json").exists());
}

#[test]
fn download_single_agent_by_base_name() {
    let client = MockAgentClient::new();
    seed_linked_agents(&client, "dev-", "");
    let dir = tempfile::tempdir().unwrap();

    let options = DownloadOptions {
        prefix: "dev-".to_string(),
        suffix: String::new(),
        format: FileFormat::Json,
    };
    let path = download_agent("sub", &client, dir.path(), &options).unwrap();
    assert_eq!(path, dir.path().join("sub.json"));

    let loaded = load_agent_file(&path, FileFormat::Json).unwrap();
    assert_eq!(loaded.name, "sub");
    assert_eq!(loaded.instructions.as_deref(), Some("work"));
}

#[test]
fn download_missing_agent_is_not_found() {
    let client = MockAgentClient::new();
    let dir = tempfile::tempdir().unwrap();

    let err = download_agent("ghost", &client, dir.path(), &DownloadOptions::default())
        .unwrap_err();
    assert!(matches!(err, SyncError::NotFound(_)));
}

#[test]
fn download_to_markdown_keeps_instructions_as_body() {
    let client = MockAgentClient::new();
    seed_linked_agents(&client, "", "");
    let dir = tempfile::tempdir().unwrap();

    let options = DownloadOptions {
        format: FileFormat::Markdown,
        ..Default::default()
    };
    download_agent("sub", &client, dir.path(), &options).unwrap();

    let content = std::fs::read_to_string(dir.path().join("sub.md")).unwrap();
    assert!(content.starts_with("---\n"));
    assert!(content.ends_with("work\n"));
}

#[test]
fn roundtrip_download_then_upload_is_stable() {
    // Upload, download to files, wipe the remote, upload the downloaded files
    let client = MockAgentClient::new();
    seed_linked_agents(&client, "", "");
    let dir = tempfile::tempdir().unwrap();
    download_agents(&client, dir.path(), &DownloadOptions::default()).unwrap();

    let fresh = MockAgentClient::new();
    let processed = agent_sync::sync::upload_agents_from_dir(
        dir.path(),
        FileFormat::Json,
        &fresh,
        &fast_options("", ""),
    )
    .unwrap();
    assert_eq!(processed.len(), 2);
    assert_eq!(
        fresh.calls_with_prefix("create:"),
        vec!["create:sub", "create:top"]
    );

    let top = fresh.agent_named("top").unwrap();
    let sub = fresh.agent_named("sub").unwrap();
    assert_eq!(top.rest["tools"][0]["connected_agent"]["id"], json!(sub.id));
}

#[test]
fn reverse_lookup_absorbs_remote_errors() {
    struct FailingClient;
    impl AgentServiceClient for FailingClient {
        fn list_agents(&self) -> Result<Vec<agent_sync::types::RemoteAgent>, SyncError> {
            Ok(Vec::new())
        }
        fn create_agent(
            &self,
            _payload: &agent_sync::client::AgentPayload,
        ) -> Result<agent_sync::types::RemoteAgent, SyncError> {
            unreachable!()
        }
        fn update_agent(
            &self,
            _agent_id: &str,
            _payload: &agent_sync::client::AgentPayload,
        ) -> Result<agent_sync::types::RemoteAgent, SyncError> {
            unreachable!()
        }
        fn get_agent(
            &self,
            _agent_id: &str,
        ) -> Result<Option<agent_sync::types::RemoteAgent>, SyncError> {
            Err(SyncError::TransportError("down".to_string()))
        }
        fn delete_agent(&self, _agent_id: &str) -> Result<(), SyncError> {
            Ok(())
        }
    }

    assert_eq!(agent_sync::sync::get_agent_name("some-id", &FailingClient), None);
}
