// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

//! Newline-delimited JSON-RPC 2.0 framing for the Agent Client Protocol,
//! spoken over a child process's stdin/stdout. Grounded on the teacher's
//! `driver/jsonl_stdout.rs` (line-buffered JSONL parsing) generalized
//! from a one-way stdout observer into a full bidirectional request/
//! response/notification connection, since ACP requires the control
//! side to both call methods on the agent and receive its notifications.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::sync::{mpsc, oneshot, Mutex};

#[derive(Debug, Error)]
pub enum AcpError {
    #[error("agent process exited before replying")]
    ProcessExited,
    #[error("writing request: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed ACP message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("agent returned an error response: {message} (code {code})")]
    Remote { code: i64, message: String },
    #[error("request timed out")]
    Timeout,
}

#[derive(Debug, Serialize)]
struct Request<'a> {
    jsonrpc: &'static str,
    id: i64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct InboundMessage {
    id: Option<i64>,
    method: Option<String>,
    #[serde(default)]
    params: Value,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<InboundError>,
}

#[derive(Debug, Deserialize)]
struct InboundError {
    code: i64,
    message: String,
}

/// A notification or server-initiated request pushed by the agent
/// (assistant message chunks, permission requests, plan updates, ...).
#[derive(Debug, Clone)]
pub struct AcpNotification {
    pub method: String,
    pub params: Value,
}

type Pending = HashMap<i64, oneshot::Sender<Result<Value, AcpError>>>;

/// One live ACP session: a spawned agent subprocess plus the JSON-RPC
/// plumbing to call methods on it and receive its notifications.
pub struct AcpConnection {
    child: Mutex<Child>,
    stdin: Mutex<ChildStdin>,
    next_id: AtomicI64,
    pending: Arc<Mutex<Pending>>,
}

impl AcpConnection {
    /// Take ownership of a spawned child's stdio and start the reader
    /// task. `notifications` receives every inbound message that is not
    /// a reply to an outstanding request (ACP notifications and
    /// server-to-client requests alike; this driver never needs to reply
    /// to the latter beyond the default `_permissionRequest` flow handled
    /// by the caller).
    pub fn new(mut child: Child, notifications: mpsc::Sender<AcpNotification>) -> Result<Self, AcpError> {
        let stdin = child.stdin.take().ok_or(AcpError::ProcessExited)?;
        let stdout = child.stdout.take().ok_or(AcpError::ProcessExited)?;

        let pending: Arc<Mutex<Pending>> = Arc::new(Mutex::new(HashMap::new()));
        spawn_reader(stdout, Arc::clone(&pending), notifications);

        Ok(Self { child: Mutex::new(child), stdin: Mutex::new(stdin), next_id: AtomicI64::new(1), pending })
    }

    /// Call an ACP method and await its response.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, AcpError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        let request = Request { jsonrpc: "2.0", id, method, params };
        let mut line = serde_json::to_vec(&request)?;
        line.push(b'\n');

        {
            let mut stdin = self.stdin.lock().await;
            stdin.write_all(&line).await?;
            stdin.flush().await?;
        }

        match rx.await {
            Ok(result) => result,
            Err(_) => {
                self.pending.lock().await.remove(&id);
                Err(AcpError::ProcessExited)
            }
        }
    }

    /// Forcibly terminate the agent subprocess.
    pub async fn kill(&self) -> Result<(), AcpError> {
        self.child.lock().await.start_kill()?;
        Ok(())
    }

    /// The child's OS process id, for liveness checks ([`crate::process`]).
    pub async fn pid(&self) -> Option<u32> {
        self.child.lock().await.id()
    }
}

fn spawn_reader(stdout: ChildStdout, pending: Arc<Mutex<Pending>>, notifications: mpsc::Sender<AcpNotification>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "ACP stdout read failed");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            let msg: InboundMessage = match serde_json::from_str(&line) {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!(error = %e, line, "dropping malformed ACP line");
                    continue;
                }
            };

            match (msg.id, msg.method) {
                (Some(id), None) => {
                    if let Some(tx) = pending.lock().await.remove(&id) {
                        let result = match msg.error {
                            Some(err) => Err(AcpError::Remote { code: err.code, message: err.message }),
                            None => Ok(msg.result.unwrap_or(Value::Null)),
                        };
                        let _ = tx.send(result);
                    }
                }
                (_, Some(method)) => {
                    let _ = notifications.send(AcpNotification { method, params: msg.params }).await;
                }
                _ => tracing::warn!("ACP message with neither id nor method"),
            }
        }

        // Reader loop ended (stdout closed): fail any still-pending calls
        // rather than leaving their callers waiting forever.
        let mut pending = pending.lock().await;
        for (_, tx) in pending.drain() {
            let _ = tx.send(Err(AcpError::ProcessExited));
        }
    });
}

#[cfg(test)]
#[path = "acp_tests.rs"]
mod tests;
