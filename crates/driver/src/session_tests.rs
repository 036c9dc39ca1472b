// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

use super::*;
use serde_json::json;

#[test]
fn translates_agent_message_chunk() {
    let notification = AcpNotification {
        method: "session/update".to_owned(),
        params: json!({"update": {"sessionUpdate": "agent_message_chunk", "content": {"text": "hi"}}}),
    };
    match translate(notification) {
        AgentEvent::AgentMessageChunk(text) => assert_eq!(text, "hi"),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn translates_tool_call_start() {
    let notification = AcpNotification {
        method: "session/update".to_owned(),
        params: json!({"update": {"sessionUpdate": "tool_call", "toolCallId": "tc1", "title": "Edit file"}}),
    };
    match translate(notification) {
        AgentEvent::ToolCallStart { tool_call_id, title } => {
            assert_eq!(tool_call_id, "tc1");
            assert_eq!(title, "Edit file");
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn translates_permission_request() {
    let notification = AcpNotification {
        method: "_permissionRequest".to_owned(),
        params: json!({"requestId": "r1", "tool": "bash", "input": {"command": "ls"}}),
    };
    match translate(notification) {
        AgentEvent::PermissionRequest { request_id, tool, input } => {
            assert_eq!(request_id, "r1");
            assert_eq!(tool, "bash");
            assert_eq!(input, json!({"command": "ls"}));
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn translates_agent_thought_chunk() {
    let notification = AcpNotification {
        method: "session/update".to_owned(),
        params: json!({"update": {"sessionUpdate": "agent_thought_chunk", "content": {"text": "thinking"}}}),
    };
    match translate(notification) {
        AgentEvent::AgentThoughtChunk(text) => assert_eq!(text, "thinking"),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn translates_current_mode_update() {
    let notification = AcpNotification {
        method: "session/update".to_owned(),
        params: json!({"update": {"sessionUpdate": "current_mode_update", "currentModeId": "code"}}),
    };
    match translate(notification) {
        AgentEvent::CurrentModeUpdate(mode_id) => assert_eq!(mode_id, "code"),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn translates_available_commands_update() {
    let notification = AcpNotification {
        method: "session/update".to_owned(),
        params: json!({"update": {
            "sessionUpdate": "available_commands_update",
            "availableCommands": [{"name": "plan"}],
        }}),
    };
    match translate(notification) {
        AgentEvent::AvailableCommandsUpdate(commands) => assert_eq!(commands, json!([{"name": "plan"}])),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn unrecognized_session_update_kind_falls_back_to_raw() {
    let notification = AcpNotification {
        method: "session/update".to_owned(),
        params: json!({"update": {"sessionUpdate": "something_new"}}),
    };
    assert!(matches!(translate(notification), AgentEvent::Raw { .. }));
}

#[test]
fn unrecognized_method_falls_back_to_raw() {
    let notification = AcpNotification { method: "vendor/custom".to_owned(), params: json!({"a": 1}) };
    match translate(notification) {
        AgentEvent::Raw { method, payload } => {
            assert_eq!(method, "vendor/custom");
            assert_eq!(payload, json!({"a": 1}));
        }
        other => panic!("unexpected event: {other:?}"),
    }
}
