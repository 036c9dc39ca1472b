// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

//! C4: the reconciler. Grounded on the teacher's `broker/client.rs` (a
//! ticker loop with retry/backoff talking to a remote peer) and
//! `broker/registry.rs` (claim-then-act dispatch), generalized from HTTP
//! pod registration to a gRPC call dispatching a pending session onto its
//! assigned worker. The teacher's client wrapper shape (base URL + auth
//! token + an `apply_auth` helper) is kept, retargeted from
//! `reqwest::Client`/bearer-header to `tonic::transport::Channel`/gRPC
//! metadata, since the wire protocol here is gRPC, not REST.

use std::time::Duration;

use flowgentic_proto::worker::v1 as wpb;
use flowgentic_store::error::FlowgenticError;
use flowgentic_store::model::{EventType, Session, SessionStatus, Worker};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tonic::metadata::MetadataValue;
use tonic::transport::Channel;
use tonic::Request;
use tracing::{error, info, warn};
use wpb::worker_session_service_client::WorkerSessionServiceClient;

use crate::state::AppState;

/// How often the reconciler scans for pending sessions (spec.md §4.4).
const TICK_INTERVAL: Duration = Duration::from_secs(5);

/// Sessions claimed per tick; keeps a single tick from monopolizing the
/// database connection behind a burst of session creates.
const CLAIM_BATCH: u32 = 16;

pub async fn run(state: AppState, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    info!("reconciler started");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = reconcile_once(&state).await {
                    warn!(error = %e, "reconciler tick failed");
                }
            }
            _ = state.wake.notified() => {
                if let Err(e) = reconcile_once(&state).await {
                    warn!(error = %e, "reconciler tick failed");
                }
            }
            _ = shutdown.cancelled() => {
                info!("reconciler shutting down");
                return;
            }
        }
    }
}

pub async fn reconcile_once(state: &AppState) -> Result<(), FlowgenticError> {
    let pending = state.db.list_pending_sessions(CLAIM_BATCH).await?;
    for session in pending {
        let claimed =
            state.db.claim_session(&session.id, SessionStatus::Pending, SessionStatus::Scheduling).await?;
        if !claimed {
            // another reconciler tick (or, once run with multiple
            // control-plane replicas, another instance) won the race.
            continue;
        }
        record_status_change(state, &session.id, SessionStatus::Scheduling, None).await;
        dispatch(state, session).await;
    }
    Ok(())
}

async fn dispatch(state: &AppState, session: Session) {
    let worker = match state.registry.get(&session.worker_id) {
        Ok(worker) => worker,
        Err(e) => {
            error!(session_id = %session.id, worker_id = %session.worker_id, "{e}");
            fail(state, &session.id, format!("unknown worker: {e}")).await;
            return;
        }
    };

    let project_id = match state.db.get_thread(&session.thread_id).await {
        Ok(thread) => thread.project_id,
        Err(e) => {
            error!(session_id = %session.id, "resolving thread for session: {e}");
            fail(state, &session.id, format!("resolving thread: {e}")).await;
            return;
        }
    };
    let cwd = state
        .db
        .get_cwd_for_project_worker(&project_id, &worker.id)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();

    let request = wpb::NewSessionRequest {
        session_id: session.id.clone(),
        prompt: session.prompt.clone(),
        agent: session.agent.clone(),
        model: session.model.clone(),
        mode: session.mode.clone(),
        session_mode: session.session_mode.clone(),
        cwd,
        yolo: false,
        system_prompt: None,
        resume_session_id: None,
        mcp_servers: Vec::new(),
    };

    match new_session(&worker, request).await {
        Ok(response) if response.accepted => {
            let status = state
                .db
                .update_session_status(&session.id, SessionStatus::Running, response.agent_session_id.as_deref())
                .await;
            if let Err(e) = status {
                error!(session_id = %session.id, "marking session running: {e}");
            }
            record_status_change(state, &session.id, SessionStatus::Running, None).await;
        }
        Ok(response) => {
            warn!(session_id = %session.id, reason = ?response.reason, "worker declined session");
            let reason = response.reason.unwrap_or_else(|| "worker declined session".to_owned());
            fail(state, &session.id, reason).await;
        }
        Err(e) => {
            error!(session_id = %session.id, worker_id = %worker.id, "dispatch failed: {e}");
            fail(state, &session.id, format!("dispatch failed: {e}")).await;
        }
    }
}

async fn fail(state: &AppState, session_id: &str, reason: String) {
    if let Err(e) = state.db.update_session_status(session_id, SessionStatus::Failed, None).await {
        error!(session_id, "marking session failed: {e}");
    }
    record_status_change(state, session_id, SessionStatus::Failed, Some(reason)).await;
}

/// Projects a reconciler-driven lifecycle transition into the event log
/// (spec.md §3: "the session row's status is a materialised projection
/// of the latest status-change event"). The DB column write above is the
/// fast-read projection; this is the source of truth watchers observe.
async fn record_status_change(state: &AppState, session_id: &str, status: SessionStatus, reason: Option<String>) {
    let payload = json!({"status": status.to_string(), "reason": reason});
    let bytes = serde_json::to_vec(&payload).unwrap_or_default();
    if let Err(e) = state.events.append(session_id, EventType::StatusChange, bytes).await {
        error!(session_id, "recording status_change event: {e}");
    }
}

/// Lazy channels don't dial until the first call, so a worker that's
/// briefly unreachable doesn't block every other session's dispatch.
pub(crate) fn connect(worker: &Worker) -> Result<Channel, FlowgenticError> {
    let channel = Channel::from_shared(worker.url.clone())
        .map_err(|e| FlowgenticError::internal(format!("invalid worker url {}: {e}", worker.url)))?
        .connect_lazy();
    Ok(channel)
}

pub(crate) fn authed<T>(payload: T, secret: &str) -> Result<Request<T>, FlowgenticError> {
    let mut request = Request::new(payload);
    let value: MetadataValue<_> = format!("Bearer {secret}")
        .parse()
        .map_err(|_| FlowgenticError::internal("worker secret is not valid header metadata"))?;
    request.metadata_mut().insert("authorization", value);
    Ok(request)
}

async fn client(worker: &Worker) -> Result<WorkerSessionServiceClient<Channel>, FlowgenticError> {
    let channel = connect(worker)?;
    Ok(WorkerSessionServiceClient::new(channel))
}

async fn new_session(worker: &Worker, request: wpb::NewSessionRequest) -> Result<wpb::NewSessionResponse, FlowgenticError> {
    let mut client = client(worker).await?;
    let request = authed(request, &worker.secret)?;
    client
        .new_session(request)
        .await
        .map(|r| r.into_inner())
        .map_err(|status| FlowgenticError::unavailable(format!("worker {}: {status}", worker.id)))
}

/// Forward a prompt to the worker hosting `session_id`, returning the
/// agent's stop reason (spec.md §4.2 `PromptSession`).
pub async fn relay_prompt(worker: &Worker, session_id: &str, text: &str) -> Result<String, FlowgenticError> {
    let mut client = client(worker).await?;
    let request = authed(
        wpb::PromptRequest {
            session_id: session_id.to_owned(),
            content_blocks: vec![wpb::WorkerContentBlock { text: text.to_owned() }],
        },
        &worker.secret,
    )?;
    client
        .prompt(request)
        .await
        .map(|r| r.into_inner().stop_reason)
        .map_err(|status| FlowgenticError::unavailable(format!("worker {}: {status}", worker.id)))
}

pub async fn relay_cancel(worker: &Worker, session_id: &str) -> Result<(), FlowgenticError> {
    let mut client = client(worker).await?;
    let request = authed(wpb::CancelRequest { session_id: session_id.to_owned() }, &worker.secret)?;
    client
        .cancel(request)
        .await
        .map(|_| ())
        .map_err(|status| FlowgenticError::unavailable(format!("worker {}: {status}", worker.id)))
}

pub async fn relay_set_mode(worker: &Worker, session_id: &str, mode_id: &str) -> Result<(), FlowgenticError> {
    let mut client = client(worker).await?;
    let request = authed(
        wpb::SetSessionModeRequest { session_id: session_id.to_owned(), mode_id: mode_id.to_owned() },
        &worker.secret,
    )?;
    client
        .set_session_mode(request)
        .await
        .map(|_| ())
        .map_err(|status| FlowgenticError::unavailable(format!("worker {}: {status}", worker.id)))
}

pub async fn relay_stop(worker: &Worker, session_id: &str) -> Result<(), FlowgenticError> {
    let mut client = client(worker).await?;
    let request = authed(wpb::StopSessionRequest { session_id: session_id.to_owned() }, &worker.secret)?;
    client
        .stop_session(request)
        .await
        .map(|_| ())
        .map_err(|status| FlowgenticError::unavailable(format!("worker {}: {status}", worker.id)))
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
