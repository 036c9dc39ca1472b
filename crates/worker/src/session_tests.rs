// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

use super::*;
use flowgentic_store::error::ErrorKind;
use serde_json::json;

#[test]
fn translate_maps_each_agent_event_to_its_taxonomy_slot() {
    let cases = [
        (AgentEvent::AgentMessageChunk("hi".into()), EventType::AgentMessageChunk),
        (AgentEvent::AgentThoughtChunk("hmm".into()), EventType::AgentThoughtChunk),
        (
            AgentEvent::ToolCallStart { tool_call_id: "tc1".into(), title: "Edit".into() },
            EventType::ToolCall,
        ),
        (
            AgentEvent::ToolCallUpdate { tool_call_id: "tc1".into(), status: "completed".into() },
            EventType::ToolCallUpdate,
        ),
        (AgentEvent::PlanUpdate(json!({"steps": []})), EventType::Plan),
        (AgentEvent::CurrentModeUpdate("code".into()), EventType::CurrentModeUpdate),
        (AgentEvent::AvailableCommandsUpdate(json!([])), EventType::AvailableCommandsUpdate),
    ];
    for (event, expected) in cases {
        let (event_type, _) = translate(event).expect("should translate");
        assert_eq!(event_type, expected);
    }
}

#[test]
fn translate_maps_permission_request_to_tool_call_with_marker() {
    let event = AgentEvent::PermissionRequest {
        request_id: "r1".into(),
        tool: "bash".into(),
        input: json!({"command": "ls"}),
    };
    let (event_type, payload) = translate(event).expect("should translate");
    assert_eq!(event_type, EventType::ToolCall);
    assert_eq!(payload["_permissionRequest"], json!(true));
}

#[test]
fn translate_drops_exited_and_raw() {
    assert!(translate(AgentEvent::Exited { code: Some(0) }).is_none());
    assert!(translate(AgentEvent::Raw { method: "vendor/custom".into(), payload: serde_json::Value::Null }).is_none());
}

#[tokio::test]
async fn unknown_session_lookups_fail_not_found() {
    let manager = SessionManager::new();
    let err = manager.get("missing").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = manager.mark_stopping("missing").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn removing_an_unknown_session_is_a_no_op() {
    let manager = SessionManager::new();
    manager.remove("missing").await;
}
