//! End-to-end upsert engine behavior against the in-memory service double.

mod common;

use std::time::Duration;

use agent_sync::client::RetryPolicy;
use agent_sync::error::SyncError;
use agent_sync::sync::{
    create_or_update_agent, create_or_update_agents, upload_agents_from_dir, ExistingAgentCache,
    UploadOptions,
};
use agent_sync::types::AgentDefinition;
use common::MockAgentClient;
use serde_json::json;

fn definition(value: serde_json::Value) -> AgentDefinition {
    serde_json::from_value(value).unwrap()
}

fn connected(target: &str) -> serde_json::Value {
    json!({"type": "connected_agent", "connected_agent": {"name_from_id": target}})
}

fn fast_options() -> UploadOptions {
    UploadOptions {
        retry: RetryPolicy::new(3, Duration::ZERO).without_jitter(),
        ..Default::default()
    }
}

#[test]
fn dependencies_are_created_before_dependents() {
    // `top` first in input order, but `sub` must be created first
    let defs = vec![
        definition(json!({
            "name": "top", "model": "m", "instructions": "delegate",
            "tools": [connected("sub")],
        })),
        definition(json!({"name": "sub", "model": "m", "instructions": "work"})),
    ];
    let client = MockAgentClient::new();

    let processed = create_or_update_agents(&defs, &client, &fast_options()).unwrap();
    assert_eq!(processed.len(), 2);
    assert_eq!(
        client.calls_with_prefix("create:"),
        vec!["create:sub", "create:top"]
    );

    // top's connected-agent tool carries sub's created id
    let top = client.agent_named("top").unwrap();
    let sub = client.agent_named("sub").unwrap();
    let tools = &top.rest["tools"];
    assert_eq!(tools[0]["connected_agent"]["id"], json!(sub.id));
    assert_eq!(tools[0]["connected_agent"]["name"], json!("sub"));
    assert!(tools[0]["connected_agent"].get("name_from_id").is_none());
}

#[test]
fn diamond_batch_resolves_with_single_list_call() {
    let defs = vec![
        definition(json!({
            "name": "top", "model": "m", "instructions": "delegate",
            "tools": [connected("sub1"), connected("sub2")],
        })),
        definition(json!({"name": "sub1", "model": "m", "instructions": "a"})),
        definition(json!({"name": "sub2", "model": "m", "instructions": "b"})),
    ];
    let client = MockAgentClient::new();

    create_or_update_agents(&defs, &client, &fast_options()).unwrap();

    let creates = client.calls_with_prefix("create:");
    assert_eq!(creates.len(), 3);
    assert_eq!(creates.last().unwrap(), "create:top");
    // Agents created earlier in the batch resolve from the cache insert,
    // so only the initial bulk listing hits the service
    assert_eq!(client.calls_with_prefix("list").len(), 1);
}

#[test]
fn second_upload_updates_instead_of_creating() {
    let defs = vec![definition(
        json!({"name": "solo", "model": "m", "instructions": "v1"}),
    )];
    let client = MockAgentClient::new();
    let options = fast_options();

    create_or_update_agents(&defs, &client, &options).unwrap();
    let updated = vec![definition(
        json!({"name": "solo", "model": "m", "instructions": "v2"}),
    )];
    create_or_update_agents(&updated, &client, &options).unwrap();

    assert_eq!(client.calls_with_prefix("create:").len(), 1);
    assert_eq!(client.calls_with_prefix("update:").len(), 1);
    let agent = client.agent_named("solo").unwrap();
    assert_eq!(agent.rest["instructions"], json!("v2"));
}

#[test]
fn upsert_single_agent_is_idempotent() {
    let def = definition(json!({"name": "solo", "model": "m", "instructions": "x"}));
    let client = MockAgentClient::new();
    let options = fast_options();

    let mut cache = ExistingAgentCache::new();
    let first = create_or_update_agent(&def, &client, &mut cache, &options).unwrap();

    let mut fresh_cache = ExistingAgentCache::new();
    let second = create_or_update_agent(&def, &client, &mut fresh_cache, &options).unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(client.calls_with_prefix("create:").len(), 1);
    assert_eq!(client.calls_with_prefix("update:").len(), 1);
}

#[test]
fn transient_failures_retry_until_success() {
    let defs = vec![definition(
        json!({"name": "flaky", "model": "m", "instructions": "x"}),
    )];
    let client = MockAgentClient::new();
    client.fail_transient_times(2);

    let processed = create_or_update_agents(&defs, &client, &fast_options()).unwrap();
    assert_eq!(processed.len(), 1);
    // Two transient failures then success: exactly three create calls
    assert_eq!(client.calls_with_prefix("create:").len(), 3);
}

#[test]
fn exhausted_retries_surface_agent_and_attempts() {
    let defs = vec![definition(
        json!({"name": "down", "model": "m", "instructions": "x"}),
    )];
    let client = MockAgentClient::new();
    client.fail_transient_times(10);

    let err = create_or_update_agents(&defs, &client, &fast_options()).unwrap_err();
    match err {
        SyncError::RetriesExhausted { agent, attempts, .. } => {
            assert_eq!(agent, "down");
            assert_eq!(attempts, 3);
        }
        other => panic!("expected RetriesExhausted, got {other:?}"),
    }
    assert_eq!(client.calls_with_prefix("create:").len(), 3);
}

#[test]
fn unresolved_reference_is_dropped_not_fatal() {
    let defs = vec![definition(json!({
        "name": "hopeful", "model": "m", "instructions": "x",
        "tools": [connected("ghost_agent"), {"type": "file_search"}],
    }))];
    let client = MockAgentClient::new();

    let processed = create_or_update_agents(&defs, &client, &fast_options()).unwrap();
    assert_eq!(processed.len(), 1);

    let agent = client.agent_named("hopeful").unwrap();
    let tools = agent.rest["tools"].as_array().unwrap();
    // The ghost reference is gone; the unrelated tool survives
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["type"], json!("file_search"));
}

#[test]
fn cycle_aborts_before_any_remote_write() {
    let defs = vec![
        definition(json!({
            "name": "a", "model": "m", "instructions": "x",
            "tools": [connected("b")],
        })),
        definition(json!({
            "name": "b", "model": "m", "instructions": "x",
            "tools": [connected("a")],
        })),
    ];
    let client = MockAgentClient::new();

    let err = create_or_update_agents(&defs, &client, &fast_options()).unwrap_err();
    assert!(matches!(err, SyncError::CyclicDependency(_)));
    assert!(client.calls_with_prefix("create:").is_empty());
    assert!(client.calls_with_prefix("update:").is_empty());
}

#[test]
fn missing_instructions_fails_validation_before_remote_write() {
    let defs = vec![definition(json!({"name": "incomplete", "model": "m"}))];
    let client = MockAgentClient::new();

    let err = create_or_update_agents(&defs, &client, &fast_options()).unwrap_err();
    match err {
        SyncError::ValidationError { agent, reason } => {
            assert_eq!(agent, "incomplete");
            assert!(reason.contains("instructions"));
        }
        other => panic!("expected ValidationError, got {other:?}"),
    }
    assert!(client.calls_with_prefix("create:").is_empty());
}

#[test]
fn prefix_and_suffix_shape_remote_names_and_references() {
    let defs = vec![
        definition(json!({
            "name": "top", "model": "m", "instructions": "delegate",
            "tools": [connected("sub")],
        })),
        definition(json!({"name": "sub", "model": "m", "instructions": "work"})),
    ];
    let client = MockAgentClient::new();
    let options = UploadOptions {
        prefix: "dev-".to_string(),
        suffix: "-v2".to_string(),
        retry: RetryPolicy::new(3, Duration::ZERO).without_jitter(),
        ..Default::default()
    };

    create_or_update_agents(&defs, &client, &options).unwrap();
    let top = client.agent_named("dev-top-v2").unwrap();
    let sub = client.agent_named("dev-sub-v2").unwrap();
    assert_eq!(top.rest["tools"][0]["connected_agent"]["id"], json!(sub.id));
}

#[test]
fn invalid_effective_name_fails_validation() {
    let defs = vec![definition(
        json!({"name": "ok", "model": "m", "instructions": "x"}),
    )];
    let client = MockAgentClient::new();
    let options = UploadOptions {
        prefix: "bad prefix ".to_string(),
        retry: RetryPolicy::new(1, Duration::ZERO).without_jitter(),
        ..Default::default()
    };

    let err = create_or_update_agents(&defs, &client, &options).unwrap_err();
    assert!(matches!(err, SyncError::ValidationError { .. }));
}

#[test]
fn existing_agents_resolve_references_without_local_definition() {
    // `helper` exists remotely only; the reference resolves via the cache
    let client = MockAgentClient::with_existing(&["helper"]);
    let defs = vec![definition(json!({
        "name": "user", "model": "m", "instructions": "x",
        "tools": [connected("helper")],
    }))];

    create_or_update_agents(&defs, &client, &fast_options()).unwrap();
    let user = client.agent_named("user").unwrap();
    let helper = client.agent_named("helper").unwrap();
    assert_eq!(user.rest["tools"][0]["connected_agent"]["id"], json!(helper.id));
}

#[test]
fn model_falls_back_to_configured_default() {
    let defs = vec![definition(json!({"name": "bare", "instructions": "x"}))];
    let client = MockAgentClient::new();
    let options = UploadOptions {
        default_model: Some("fallback-model".to_string()),
        retry: RetryPolicy::new(1, Duration::ZERO).without_jitter(),
        ..Default::default()
    };

    create_or_update_agents(&defs, &client, &options).unwrap();
    let agent = client.agent_named("bare").unwrap();
    assert_eq!(agent.rest["model"], json!("fallback-model"));
}

#[test]
fn upload_from_directory_reads_sorts_and_uploads() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("a-top.json"),
        serde_json::to_string(&json!({
            "name": "top", "model": "m", "instructions": "delegate",
            "tools": [connected("sub")],
        }))
        .unwrap(),
    )
    .unwrap();
    std::fs::write(
        dir.path().join("z-sub.json"),
        serde_json::to_string(&json!({"name": "sub", "model": "m", "instructions": "work"}))
            .unwrap(),
    )
    .unwrap();

    let client = MockAgentClient::new();
    let processed = upload_agents_from_dir(
        dir.path(),
        agent_sync::formats::FileFormat::Json,
        &client,
        &fast_options(),
    )
    .unwrap();

    assert_eq!(processed.len(), 2);
    assert_eq!(
        client.calls_with_prefix("create:"),
        vec!["create:sub", "create:top"]
    );
}
