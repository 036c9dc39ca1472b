// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

//! Live session bookkeeping (C7's worker-side half): tracks every agent
//! subprocess this worker is currently driving, mirrors its ACP events
//! into a per-session history plus a worker-wide broadcast hub, and
//! serves `WorkerSessionService::StateSync` out of that hub. Grounded on
//! `flowgentic_store::eventlog::EventPublisher` (subscribe-before-history,
//! replay-then-flush-then-live watermark algorithm), generalized here to
//! multiplex many sessions through one broadcast channel since a single
//! `StateSync` call covers everything this worker hosts, not one session
//! at a time.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use flowgentic_driver::{build_driver, AgentEvent, AgentVendor, Session as DriverSession, SessionConfig};
use flowgentic_store::error::FlowgenticError;
use flowgentic_store::model::{EventType, SessionStatus};
use serde_json::json;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};

/// Bounded so a slow/absent state-sync subscriber can't hold unbounded
/// history in memory; an overflowed subscriber is dropped and must
/// reconnect with `last_seen_sequence`, same tradeoff as the control
/// plane's event log (spec.md §4.1/§5).
const HUB_BUFFER: usize = 4096;

#[derive(Debug, Clone)]
pub struct RecordedEvent {
    pub sequence: u64,
    pub event_type: EventType,
    pub payload: Vec<u8>,
}

/// One item flowing through the worker-wide hub, tagged with the
/// flowgentic session id it belongs to.
#[derive(Debug, Clone)]
pub enum HubItem {
    Event { session_id: String, event: RecordedEvent },
    Status { session_id: String, status: SessionStatus, reason: Option<String> },
    Topic { session_id: String, topic: String },
}

struct SessionRecord {
    driver_session: Arc<DriverSession>,
    status: Mutex<SessionStatus>,
    history: Mutex<Vec<RecordedEvent>>,
    next_sequence: AtomicU64,
    stopping: AtomicBool,
}

/// Owns every live session on this worker and the broadcast hub that
/// feeds `StateSync`.
pub struct SessionManager {
    sessions: Mutex<HashMap<String, Arc<SessionRecord>>>,
    hub_tx: broadcast::Sender<HubItem>,
}

impl SessionManager {
    pub fn new() -> Arc<Self> {
        let (hub_tx, _) = broadcast::channel(HUB_BUFFER);
        Arc::new(Self { sessions: Mutex::new(HashMap::new()), hub_tx })
    }

    /// Launch a new agent subprocess and start pumping its ACP events
    /// into the session's history and the shared hub.
    pub async fn create(
        self: Arc<Self>,
        session_id: String,
        vendor: AgentVendor,
        config: SessionConfig,
        prompt: &str,
    ) -> Result<String, FlowgenticError> {
        let driver = build_driver(vendor);
        let (session, event_rx) = driver
            .new_session(config)
            .await
            .map_err(|e| FlowgenticError::unavailable(format!("spawning {vendor} agent: {e}")))?;
        let agent_session_id = session.agent_session_id().to_owned();

        let record = Arc::new(SessionRecord {
            driver_session: Arc::new(session),
            status: Mutex::new(SessionStatus::Running),
            history: Mutex::new(Vec::new()),
            next_sequence: AtomicU64::new(1),
            stopping: AtomicBool::new(false),
        });

        self.sessions.lock().await.insert(session_id.clone(), Arc::clone(&record));

        self.append(&session_id, &record, EventType::UserMessage, json!({"text": prompt})).await;

        let manager = Arc::clone(&self);
        let pump_session_id = session_id.clone();
        tokio::spawn(async move { manager.pump(pump_session_id, record, event_rx).await });

        Ok(agent_session_id)
    }

    async fn get(&self, session_id: &str) -> Result<Arc<SessionRecord>, FlowgenticError> {
        self.sessions
            .lock()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| FlowgenticError::not_found(format!("unknown session {session_id}")))
    }

    pub async fn driver_session(&self, session_id: &str) -> Result<Arc<DriverSession>, FlowgenticError> {
        Ok(Arc::clone(&self.get(session_id).await?.driver_session))
    }

    /// Marks a session as intentionally stopping, so its exit is recorded
    /// as `stopped` rather than `errored` (spec.md §4.5).
    pub async fn mark_stopping(&self, session_id: &str) -> Result<(), FlowgenticError> {
        self.get(session_id).await?.stopping.store(true, Ordering::Relaxed);
        Ok(())
    }

    pub async fn remove(&self, session_id: &str) {
        self.sessions.lock().await.remove(session_id);
    }

    /// Record an event reported out-of-band by the agent subprocess
    /// itself (C8's `ReportStatus`/`SubmitPlan`), rather than one
    /// translated from the driver's ACP event stream.
    pub async fn record_event(
        &self,
        session_id: &str,
        event_type: EventType,
        payload: serde_json::Value,
    ) -> Result<(), FlowgenticError> {
        let record = self.get(session_id).await?;
        self.append(session_id, &record, event_type, payload).await;
        Ok(())
    }

    async fn append(&self, session_id: &str, record: &SessionRecord, event_type: EventType, payload: serde_json::Value) {
        let sequence = record.next_sequence.fetch_add(1, Ordering::SeqCst);
        let payload = serde_json::to_vec(&payload).unwrap_or_default();
        let event = RecordedEvent { sequence, event_type, payload };
        record.history.lock().await.push(event.clone());
        let _ = self.hub_tx.send(HubItem::Event { session_id: session_id.to_owned(), event });
    }

    async fn set_status(&self, session_id: &str, record: &SessionRecord, status: SessionStatus, reason: Option<String>) {
        *record.status.lock().await = status;
        let _ = self.hub_tx.send(HubItem::Status { session_id: session_id.to_owned(), status, reason });
    }

    /// Forward `SetTopic` (C8) through the hub; the control plane's
    /// state-sync watcher resolves the owning thread and persists it.
    pub fn publish_topic(&self, session_id: &str, topic: String) {
        let _ = self.hub_tx.send(HubItem::Topic { session_id: session_id.to_owned(), topic });
    }

    /// Drain `event_rx` for the lifetime of one agent subprocess,
    /// translating every `AgentEvent` into a `RecordedEvent` (spec.md
    /// §3's nine-type taxonomy) and publishing it to the hub. Ends the
    /// session as `stopped` if `mark_stopping` was called first, or
    /// `errored` otherwise (spec.md §4.5's "never leave a session stuck
    /// mid-flight" guarantee).
    async fn pump(
        self: Arc<Self>,
        session_id: String,
        record: Arc<SessionRecord>,
        mut event_rx: tokio::sync::mpsc::Receiver<AgentEvent>,
    ) {
        while let Some(event) = event_rx.recv().await {
            let (event_type, payload) = match translate(event) {
                Some(pair) => pair,
                None => continue,
            };
            self.append(&session_id, &record, event_type, payload).await;
        }

        let stopping = record.stopping.load(Ordering::Relaxed);
        let (status, reason) = if stopping {
            (SessionStatus::Stopped, None)
        } else {
            (SessionStatus::Errored, Some("agent process exited unexpectedly".to_owned()))
        };
        debug!(session_id, ?status, "agent session ended");
        self.set_status(&session_id, &record, status, reason).await;
    }

    /// Serve one `StateSync` call: subscribe to the hub first, replay
    /// each known session's history newer than `last_seen`, then flush
    /// anything the subscription buffered meanwhile, then forward the
    /// hub live. Mirrors `EventPublisher::watch`'s ordering guarantee,
    /// generalized across every session this worker hosts.
    pub fn state_sync(
        self: Arc<Self>,
        last_seen: HashMap<String, u64>,
    ) -> tokio_stream::wrappers::ReceiverStream<Result<flowgentic_proto::worker::v1::StateSyncEvent, tonic::Status>> {
        let (tx, rx) = tokio::sync::mpsc::channel(128);
        tokio::spawn(async move { self.run_state_sync(last_seen, tx).await });
        tokio_stream::wrappers::ReceiverStream::new(rx)
    }

    async fn run_state_sync(
        self: Arc<Self>,
        mut last_seen: HashMap<String, u64>,
        tx: tokio::sync::mpsc::Sender<Result<flowgentic_proto::worker::v1::StateSyncEvent, tonic::Status>>,
    ) {
        let mut live_rx = self.hub_tx.subscribe();

        let snapshot: Vec<(String, Arc<SessionRecord>)> =
            self.sessions.lock().await.iter().map(|(id, r)| (id.clone(), Arc::clone(r))).collect();
        for (session_id, record) in snapshot {
            let after = last_seen.get(&session_id).copied().unwrap_or(0);
            let history = record.history.lock().await;
            for event in history.iter().filter(|e| e.sequence > after) {
                if tx.send(Ok(to_wire_event(&session_id, event))).await.is_err() {
                    return;
                }
                last_seen.insert(session_id.clone(), event.sequence);
            }
        }

        loop {
            match live_rx.recv().await {
                Ok(HubItem::Event { session_id, event }) => {
                    let already_seen = last_seen.get(&session_id).copied().unwrap_or(0) >= event.sequence;
                    if already_seen {
                        continue;
                    }
                    last_seen.insert(session_id.clone(), event.sequence);
                    if tx.send(Ok(to_wire_event(&session_id, &event))).await.is_err() {
                        return;
                    }
                }
                Ok(HubItem::Status { session_id, status, reason }) => {
                    let wire = flowgentic_proto::worker::v1::StateSyncEvent {
                        payload: Some(flowgentic_proto::worker::v1::state_sync_event::Payload::SessionStatus(
                            flowgentic_proto::worker::v1::WorkerSessionStatus {
                                worker_session_id: session_id,
                                status: status.to_string(),
                                reason,
                            },
                        )),
                    };
                    if tx.send(Ok(wire)).await.is_err() {
                        return;
                    }
                }
                Ok(HubItem::Topic { session_id, topic }) => {
                    let wire = flowgentic_proto::worker::v1::StateSyncEvent {
                        payload: Some(flowgentic_proto::worker::v1::state_sync_event::Payload::TopicUpdate(
                            flowgentic_proto::worker::v1::WorkerTopicUpdate { worker_session_id: session_id, topic },
                        )),
                    };
                    if tx.send(Ok(wire)).await.is_err() {
                        return;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    warn!("state-sync subscriber fell behind and was dropped");
                    let _ = tx.send(Err(tonic::Status::aborted("state-sync subscriber overflowed"))).await;
                    return;
                }
                Err(broadcast::error::RecvError::Closed) => return,
            }
        }
    }
}

fn to_wire_event(session_id: &str, event: &RecordedEvent) -> flowgentic_proto::worker::v1::StateSyncEvent {
    flowgentic_proto::worker::v1::StateSyncEvent {
        payload: Some(flowgentic_proto::worker::v1::state_sync_event::Payload::SessionEvent(
            flowgentic_proto::worker::v1::WorkerSessionEvent {
                worker_session_id: session_id.to_owned(),
                event_type: event.event_type.to_string(),
                payload: event.payload.clone(),
            },
        )),
    }
}

/// Maps a driver-level `AgentEvent` onto the nine-type session event
/// taxonomy. `Exited` is handled separately by `pump` once the event
/// stream itself closes, and `Raw` has no counterpart in the fixed
/// taxonomy, so both are dropped here rather than forced into a type
/// that doesn't fit.
fn translate(event: AgentEvent) -> Option<(EventType, serde_json::Value)> {
    match event {
        AgentEvent::AgentMessageChunk(text) => Some((EventType::AgentMessageChunk, json!({"text": text}))),
        AgentEvent::AgentThoughtChunk(text) => Some((EventType::AgentThoughtChunk, json!({"text": text}))),
        AgentEvent::ToolCallStart { tool_call_id, title } => {
            Some((EventType::ToolCall, json!({"tool_call_id": tool_call_id, "title": title})))
        }
        AgentEvent::ToolCallUpdate { tool_call_id, status } => {
            Some((EventType::ToolCallUpdate, json!({"tool_call_id": tool_call_id, "status": status})))
        }
        AgentEvent::PlanUpdate(plan) => Some((EventType::Plan, plan)),
        AgentEvent::CurrentModeUpdate(mode_id) => {
            Some((EventType::CurrentModeUpdate, json!({"current_mode_id": mode_id})))
        }
        AgentEvent::AvailableCommandsUpdate(commands) => Some((EventType::AvailableCommandsUpdate, commands)),
        AgentEvent::PermissionRequest { request_id, tool, input } => Some((
            EventType::ToolCall,
            json!({"request_id": request_id, "tool": tool, "input": input, "_permissionRequest": true}),
        )),
        AgentEvent::Exited { .. } | AgentEvent::Raw { .. } => None,
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
