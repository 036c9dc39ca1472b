// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

//! The vendor-agnostic half of the driver contract: once a subprocess is
//! spawned and speaking ACP, every vendor is driven identically. Only
//! *how the subprocess is built* (binary name, CLI flags, env vars) is
//! vendor-specific, captured in [`crate::vendor`]'s `Driver` impls.
//! Grounded on the teacher's `DriverContext`/`Detector` split in
//! `driver/mod.rs`: there, vendor modules built detectors and the coop
//! transport layer drove them uniformly; here, vendor modules build
//! subprocess commands and this module drives the ACP connection
//! uniformly.

use std::process::Stdio;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::process::Command;
use tokio::sync::mpsc;

use crate::acp::{AcpConnection, AcpError, AcpNotification};
use crate::process::configure_orphan_kill;

/// Parameters for launching a new agent session (mirrors
/// `worker.v1.NewSessionRequest`).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cwd: String,
    pub model: Option<String>,
    pub mode: String,
    pub system_prompt: Option<String>,
    pub resume_session_id: Option<String>,
    pub mcp_servers: Vec<String>,
    pub yolo: bool,
}

/// The caller's decision on a `_permissionRequest` notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionOutcome {
    Allow,
    Deny,
}

/// Events surfaced to the worker's session loop. `Raw` is a deliberate
/// escape hatch: ACP's `session/update` notification carries a large,
/// evolving union of update kinds, and forwarding unrecognized ones
/// verbatim (rather than dropping them) keeps the control plane's event
/// log complete even as vendors add new update types (spec.md §4.1's
/// "never silently drop an event" guarantee).
#[derive(Debug, Clone)]
pub enum AgentEvent {
    AgentMessageChunk(String),
    AgentThoughtChunk(String),
    ToolCallStart { tool_call_id: String, title: String },
    ToolCallUpdate { tool_call_id: String, status: String },
    PlanUpdate(Value),
    CurrentModeUpdate(String),
    AvailableCommandsUpdate(Value),
    PermissionRequest { request_id: String, tool: String, input: Value },
    Exited { code: Option<i32> },
    Raw { method: String, payload: Value },
}

/// Builds the subprocess `Command` for one vendor. Implemented per
/// vendor in [`crate::vendor`]; everything past spawn is shared.
#[async_trait]
pub trait Driver: Send + Sync {
    fn name(&self) -> &'static str;
    fn build_command(&self, config: &SessionConfig) -> Command;

    /// Spawn the subprocess and perform the ACP `initialize` handshake,
    /// returning a driven [`Session`] plus its event stream.
    async fn new_session(&self, config: SessionConfig) -> Result<(Session, mpsc::Receiver<AgentEvent>), AcpError> {
        let mut command = self.build_command(&config);
        command.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::null());
        configure_orphan_kill(&mut command);
        let child = command.spawn()?;

        #[cfg(windows)]
        if let Err(e) = crate::process::assign_to_kill_on_close_job(&child) {
            tracing::warn!(error = %e, "failed to assign agent subprocess to kill-on-close job");
        }

        let (notif_tx, mut notif_rx) = mpsc::channel(256);
        let conn = AcpConnection::new(child, notif_tx)?;

        conn.call(
            "initialize",
            json!({"protocolVersion": 1, "clientCapabilities": {"fs": {"readTextFile": true, "writeTextFile": true}}}),
        )
        .await?;

        let new_session_params = json!({
            "cwd": config.cwd,
            "mcpServers": config.mcp_servers,
        });
        let result = conn.call("session/new", new_session_params).await?;
        let agent_session_id = result
            .get("sessionId")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();

        let (event_tx, event_rx) = mpsc::channel(256);
        tokio::spawn(async move {
            while let Some(notification) = notif_rx.recv().await {
                if event_tx.send(translate(notification)).await.is_err() {
                    break;
                }
            }
        });

        Ok((Session { conn, agent_session_id }, event_rx))
    }
}

/// A live, driven ACP session for one agent subprocess.
pub struct Session {
    conn: AcpConnection,
    agent_session_id: String,
}

impl Session {
    pub fn agent_session_id(&self) -> &str {
        &self.agent_session_id
    }

    pub async fn prompt(&self, text: &str) -> Result<String, AcpError> {
        let params = json!({
            "sessionId": self.agent_session_id,
            "prompt": [{"type": "text", "text": text}],
        });
        let result = self.conn.call("session/prompt", params).await?;
        Ok(result.get("stopReason").and_then(Value::as_str).unwrap_or("end_turn").to_owned())
    }

    pub async fn cancel(&self) -> Result<(), AcpError> {
        self.conn.call("session/cancel", json!({"sessionId": self.agent_session_id})).await?;
        Ok(())
    }

    pub async fn respond_to_permission(
        &self,
        request_id: &str,
        outcome: PermissionOutcome,
    ) -> Result<(), AcpError> {
        let allow = outcome == PermissionOutcome::Allow;
        self.conn
            .call(
                "session/respond_permission",
                json!({"sessionId": self.agent_session_id, "requestId": request_id, "allow": allow}),
            )
            .await?;
        Ok(())
    }

    pub async fn set_mode(&self, mode_id: &str) -> Result<(), AcpError> {
        self.conn
            .call("session/set_mode", json!({"sessionId": self.agent_session_id, "modeId": mode_id}))
            .await?;
        Ok(())
    }

    pub async fn stop(&self) -> Result<(), AcpError> {
        self.conn.kill().await
    }

    pub async fn pid(&self) -> Option<u32> {
        self.conn.pid().await
    }
}

/// Map an ACP notification to the driver's vendor-agnostic event type.
/// Unrecognized methods are forwarded via `AgentEvent::Raw` rather than
/// dropped (spec.md §4.1).
fn translate(notification: AcpNotification) -> AgentEvent {
    match notification.method.as_str() {
        "session/update" => translate_session_update(notification.params),
        "_permissionRequest" => {
            let request_id =
                notification.params.get("requestId").and_then(Value::as_str).unwrap_or_default().to_owned();
            let tool = notification.params.get("tool").and_then(Value::as_str).unwrap_or_default().to_owned();
            let input = notification.params.get("input").cloned().unwrap_or(Value::Null);
            AgentEvent::PermissionRequest { request_id, tool, input }
        }
        other => AgentEvent::Raw { method: other.to_owned(), payload: notification.params },
    }
}

fn translate_session_update(params: Value) -> AgentEvent {
    let update = params.get("update").cloned().unwrap_or(Value::Null);
    let kind = update.get("sessionUpdate").and_then(Value::as_str).unwrap_or_default();
    match kind {
        "agent_message_chunk" => {
            let text = update
                .get("content")
                .and_then(|c| c.get("text"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();
            AgentEvent::AgentMessageChunk(text)
        }
        "tool_call" => {
            let tool_call_id =
                update.get("toolCallId").and_then(Value::as_str).unwrap_or_default().to_owned();
            let title = update.get("title").and_then(Value::as_str).unwrap_or_default().to_owned();
            AgentEvent::ToolCallStart { tool_call_id, title }
        }
        "tool_call_update" => {
            let tool_call_id =
                update.get("toolCallId").and_then(Value::as_str).unwrap_or_default().to_owned();
            let status = update.get("status").and_then(Value::as_str).unwrap_or_default().to_owned();
            AgentEvent::ToolCallUpdate { tool_call_id, status }
        }
        "agent_thought_chunk" => {
            let text = update
                .get("content")
                .and_then(|c| c.get("text"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();
            AgentEvent::AgentThoughtChunk(text)
        }
        "plan" => AgentEvent::PlanUpdate(update),
        "current_mode_update" => {
            let mode_id = update.get("currentModeId").and_then(Value::as_str).unwrap_or_default().to_owned();
            AgentEvent::CurrentModeUpdate(mode_id)
        }
        "available_commands_update" => {
            let commands = update.get("availableCommands").cloned().unwrap_or(Value::Null);
            AgentEvent::AvailableCommandsUpdate(commands)
        }
        _ => AgentEvent::Raw { method: "session/update".to_owned(), payload: params },
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
