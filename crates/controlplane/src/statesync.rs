// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

//! C6: state-sync watcher. One task per registered worker, consuming its
//! `WorkerSessionService::StateSync` server stream and feeding applied
//! events into the event log so the control plane's durable view of a
//! session stays current even when no client is actively watching.
//! Grounded on the teacher's `mux/src/upstream` reconnect shape (a
//! supervising task per remote peer with exponential backoff), adapted
//! from polling HTTP snapshots to consuming a long-lived gRPC stream.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use flowgentic_proto::worker::v1 as wpb;
use flowgentic_store::model::{EventType, SessionStatus, Worker};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tonic::Request;
use tracing::{debug, error, info, warn};
use wpb::worker_session_service_client::WorkerSessionServiceClient;

use crate::state::AppState;

const MIN_BACKOFF: Duration = Duration::from_secs(1);
/// Capped per DESIGN.md's open-question decision: a worker that's down
/// for a while shouldn't be hammered, but 30s keeps reconnect snappy
/// once it's back.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Poll the registry for membership changes and keep exactly one watcher
/// task alive per currently-registered worker, until `shutdown` fires.
pub async fn run(state: AppState, shutdown: CancellationToken) {
    let mut spawned: HashMap<String, CancellationToken> = HashMap::new();
    let mut poll = tokio::time::interval(Duration::from_secs(10));
    info!("state-sync supervisor started");
    loop {
        tokio::select! {
            _ = poll.tick() => reconcile_watchers(&state, &shutdown, &mut spawned),
            _ = shutdown.cancelled() => {
                info!("state-sync supervisor shutting down");
                for token in spawned.values() {
                    token.cancel();
                }
                return;
            }
        }
    }
}

fn reconcile_watchers(
    state: &AppState,
    shutdown: &CancellationToken,
    spawned: &mut HashMap<String, CancellationToken>,
) {
    let workers = state.registry.list();
    let live_ids: HashSet<String> = workers.iter().map(|w| w.id.clone()).collect();

    spawned.retain(|id, token| {
        let still_live = live_ids.contains(id);
        if !still_live {
            token.cancel();
        }
        still_live
    });

    for worker in workers {
        if spawned.contains_key(&worker.id) {
            continue;
        }
        let token = shutdown.child_token();
        spawned.insert(worker.id.clone(), token.clone());
        tokio::spawn(watch_worker(state.clone(), worker, token));
    }
}

async fn watch_worker(state: AppState, worker: Worker, shutdown: CancellationToken) {
    let mut backoff = MIN_BACKOFF;
    let mut last_seen: HashMap<String, u64> = HashMap::new();

    while !shutdown.is_cancelled() {
        match run_once(&state, &worker, &mut last_seen, &shutdown).await {
            Ok(()) => backoff = MIN_BACKOFF,
            Err(e) => {
                warn!(
                    worker_id = %worker.id,
                    error = %e,
                    backoff_secs = backoff.as_secs(),
                    "state-sync stream failed, retrying"
                );
                tokio::select! {
                    _ = tokio::time::sleep(backoff) => {}
                    _ = shutdown.cancelled() => return,
                }
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        }
    }
}

async fn run_once(
    state: &AppState,
    worker: &Worker,
    last_seen: &mut HashMap<String, u64>,
    shutdown: &CancellationToken,
) -> Result<(), tonic::Status> {
    let channel = crate::reconciler::connect(worker).map_err(tonic::Status::from)?;
    let mut client = WorkerSessionServiceClient::new(channel);

    let request = crate::reconciler::authed(
        wpb::StateSyncRequest { last_seen_sequence: last_seen.clone() },
        &worker.secret,
    )
    .map_err(tonic::Status::from)?;

    let mut stream = client.state_sync(request).await?.into_inner();
    info!(worker_id = %worker.id, "state-sync stream connected");

    loop {
        tokio::select! {
            next = stream.message() => {
                match next? {
                    Some(event) => apply(state, worker, last_seen, event).await,
                    None => return Ok(()),
                }
            }
            _ = shutdown.cancelled() => return Ok(()),
        }
    }
}

async fn apply(state: &AppState, worker: &Worker, last_seen: &mut HashMap<String, u64>, event: wpb::StateSyncEvent) {
    match event.payload {
        Some(wpb::state_sync_event::Payload::SessionEvent(e)) => {
            let event_type: EventType = match e.event_type.parse() {
                Ok(t) => t,
                Err(err) => {
                    warn!(worker_id = %worker.id, "unrecognized event type from state-sync: {err}");
                    return;
                }
            };
            match state.events.append(&e.worker_session_id, event_type, e.payload).await {
                Ok(sequence) => {
                    last_seen.insert(e.worker_session_id, sequence);
                }
                Err(err) => error!(worker_id = %worker.id, "applying state-sync event: {err}"),
            }
        }
        Some(wpb::state_sync_event::Payload::SessionStatus(s)) => {
            let status: SessionStatus = match s.status.parse() {
                Ok(status) => status,
                Err(err) => {
                    warn!(worker_id = %worker.id, "unrecognized session status from state-sync: {err}");
                    return;
                }
            };
            if let Err(err) = state.db.update_session_status(&s.worker_session_id, status, None).await {
                error!(worker_id = %worker.id, "applying state-sync status: {err}");
            }
            let payload = json!({"status": status.to_string(), "reason": s.reason});
            let bytes = serde_json::to_vec(&payload).unwrap_or_default();
            if let Err(err) = state.events.append(&s.worker_session_id, EventType::StatusChange, bytes).await {
                error!(worker_id = %worker.id, "recording status_change event: {err}");
            }
        }
        Some(wpb::state_sync_event::Payload::TopicUpdate(t)) => {
            let session = match state.db.get_session(&t.worker_session_id).await {
                Ok(session) => session,
                Err(err) => {
                    error!(worker_id = %worker.id, "resolving session for topic update: {err}");
                    return;
                }
            };
            if let Err(err) = state.db.set_thread_topic(&session.thread_id, &t.topic).await {
                error!(worker_id = %worker.id, "applying state-sync topic update: {err}");
            }
        }
        None => debug!(worker_id = %worker.id, "empty state-sync event"),
    }
}

#[cfg(test)]
#[path = "statesync_tests.rs"]
mod tests;
