// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

//! The interactive loop: one agent subprocess, driven directly (no
//! control plane in between). Grounded on `flowgentic-worker::session`'s
//! event-draining task shape, trimmed down to a single session with no
//! event log — this binary's job is to let a developer watch a driver
//! work interactively, not to persist anything.

use std::io::Write as _;
use std::sync::Arc;

use flowgentic_driver::{build_driver, AgentEvent, AgentVendor, PermissionOutcome, Session, SessionConfig};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::Config;

pub async fn run(config: Config) -> anyhow::Result<()> {
    let vendor: AgentVendor = config.agent.parse()?;
    let driver = build_driver(vendor);

    let session_config = SessionConfig {
        cwd: config.cwd.clone(),
        model: config.model.clone(),
        mode: config.mode.clone(),
        system_prompt: config.system.clone(),
        resume_session_id: None,
        mcp_servers: vec![],
        yolo: true,
    };

    let (session, event_rx) = driver.new_session(session_config).await?;
    let session = Arc::new(session);
    eprintln!("connected to {} (agent session {})", vendor, session.agent_session_id());

    let drain_session = Arc::clone(&session);
    let drain = tokio::spawn(async move { drain_events(drain_session, event_rx).await });

    let initial_prompt = config.initial_prompt();
    let first_line = if initial_prompt.trim().is_empty() { read_line().await? } else { Some(initial_prompt) };

    let mut next_prompt = first_line;
    while let Some(prompt) = next_prompt {
        if prompt.trim().is_empty() {
            next_prompt = read_line().await?;
            continue;
        }
        let stop_reason = session.prompt(&prompt).await?;
        eprintln!("[stop_reason: {stop_reason}]");
        next_prompt = read_line().await?;
    }

    session.stop().await?;
    drain.await?;
    Ok(())
}

/// Reads one line from stdin, `Ok(None)` on EOF.
async fn read_line() -> anyhow::Result<Option<String>> {
    let mut stdin = BufReader::new(tokio::io::stdin());
    let mut line = String::new();
    let bytes_read = stdin.read_line(&mut line).await?;
    if bytes_read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_owned()))
}

/// Drains the driver's event stream for the lifetime of the session:
/// agent text goes to stdout, every event's raw debug form goes to
/// stderr, and permission requests are auto-approved.
async fn drain_events(session: Arc<Session>, mut event_rx: tokio::sync::mpsc::Receiver<AgentEvent>) {
    while let Some(event) = event_rx.recv().await {
        eprintln!("{event:?}");
        match event {
            AgentEvent::AgentMessageChunk(text) => {
                print!("{text}");
                let _ = std::io::stdout().flush();
            }
            AgentEvent::PermissionRequest { request_id, tool, .. } => {
                eprintln!("auto-approving permission request {request_id} for tool {tool}");
                if let Err(e) = session.respond_to_permission(&request_id, PermissionOutcome::Allow).await {
                    eprintln!("failed to respond to permission request {request_id}: {e}");
                }
            }
            AgentEvent::Exited { code } => {
                eprintln!("agent process exited (code {code:?})");
                break;
            }
            _ => {}
        }
    }
    println!();
}
