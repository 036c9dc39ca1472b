// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

//! gRPC service implementations: `WorkerSessionService` (C7, called by
//! the control plane's reconciler/session service/state-sync watcher)
//! and `AgentService`/`HookService` (C8, called back by the agent
//! subprocess itself). Grounded on `flowgentic_controlplane::service`'s
//! one-method-per-RPC, `.map_err(Status::from)` conversion pattern.

use std::pin::Pin;
use std::str::FromStr;

use flowgentic_driver::{AgentVendor, PermissionOutcome, SessionConfig};
use flowgentic_proto::worker::v1 as pb;
use flowgentic_store::error::FlowgenticError;
use flowgentic_store::model::{EventType, MAX_TOPIC_LEN};
use serde_json::json;
use tokio_stream::Stream;
use tonic::{Request, Response, Status};

use crate::state::WorkerState;

type EventStream = Pin<Box<dyn Stream<Item = Result<pb::StateSyncEvent, Status>> + Send>>;

pub struct WorkerSessionServiceImpl {
    pub state: WorkerState,
}

#[tonic::async_trait]
impl pb::worker_session_service_server::WorkerSessionService for WorkerSessionServiceImpl {
    async fn new_session(
        &self,
        request: Request<pb::NewSessionRequest>,
    ) -> Result<Response<pb::NewSessionResponse>, Status> {
        let req = request.into_inner();

        let vendor = match AgentVendor::from_str(&req.agent) {
            Ok(vendor) => vendor,
            Err(e) => {
                return Ok(Response::new(pb::NewSessionResponse {
                    accepted: false,
                    agent_session_id: None,
                    reason: Some(e.to_string()),
                }));
            }
        };

        let config = SessionConfig {
            cwd: req.cwd,
            model: req.model,
            mode: req.mode,
            system_prompt: req.system_prompt,
            resume_session_id: req.resume_session_id,
            mcp_servers: req.mcp_servers,
            yolo: req.yolo,
        };

        match self.state.sessions.clone().create(req.session_id, vendor, config, &req.prompt).await {
            Ok(agent_session_id) => Ok(Response::new(pb::NewSessionResponse {
                accepted: true,
                agent_session_id: Some(agent_session_id),
                reason: None,
            })),
            Err(e) => {
                e.log();
                Ok(Response::new(pb::NewSessionResponse { accepted: false, agent_session_id: None, reason: Some(e.message) }))
            }
        }
    }

    async fn prompt(&self, request: Request<pb::PromptRequest>) -> Result<Response<pb::PromptResponse>, Status> {
        let req = request.into_inner();
        let session = self.state.sessions.driver_session(&req.session_id).await.map_err(Status::from)?;
        let text: String =
            req.content_blocks.into_iter().map(|b| b.text).collect::<Vec<_>>().join("\n");
        self.state
            .sessions
            .record_event(&req.session_id, EventType::UserMessage, json!({"text": text}))
            .await
            .map_err(Status::from)?;
        let stop_reason = session.prompt(&text).await.map_err(|e| Status::unavailable(e.to_string()))?;
        Ok(Response::new(pb::PromptResponse { stop_reason }))
    }

    async fn cancel(&self, request: Request<pb::CancelRequest>) -> Result<Response<pb::CancelResponse>, Status> {
        let req = request.into_inner();
        let session = self.state.sessions.driver_session(&req.session_id).await.map_err(Status::from)?;
        session.cancel().await.map_err(|e| Status::unavailable(e.to_string()))?;
        Ok(Response::new(pb::CancelResponse {}))
    }

    async fn respond_to_permission(
        &self,
        request: Request<pb::RespondToPermissionRequest>,
    ) -> Result<Response<pb::RespondToPermissionResponse>, Status> {
        let req = request.into_inner();
        let session = self.state.sessions.driver_session(&req.session_id).await.map_err(Status::from)?;
        let outcome = if req.allow { PermissionOutcome::Allow } else { PermissionOutcome::Deny };
        session
            .respond_to_permission(&req.request_id, outcome)
            .await
            .map_err(|e| Status::unavailable(e.to_string()))?;
        Ok(Response::new(pb::RespondToPermissionResponse {}))
    }

    async fn set_session_mode(
        &self,
        request: Request<pb::SetSessionModeRequest>,
    ) -> Result<Response<pb::SetSessionModeResponse>, Status> {
        let req = request.into_inner();
        let session = self.state.sessions.driver_session(&req.session_id).await.map_err(Status::from)?;
        session.set_mode(&req.mode_id).await.map_err(|e| Status::unavailable(e.to_string()))?;
        Ok(Response::new(pb::SetSessionModeResponse {}))
    }

    async fn stop_session(
        &self,
        request: Request<pb::StopSessionRequest>,
    ) -> Result<Response<pb::StopSessionResponse>, Status> {
        let req = request.into_inner();
        self.state.sessions.mark_stopping(&req.session_id).await.map_err(Status::from)?;
        let session = self.state.sessions.driver_session(&req.session_id).await.map_err(Status::from)?;
        session.stop().await.map_err(|e| Status::unavailable(e.to_string()))?;
        Ok(Response::new(pb::StopSessionResponse {}))
    }

    type StateSyncStream = EventStream;

    async fn state_sync(
        &self,
        request: Request<pb::StateSyncRequest>,
    ) -> Result<Response<Self::StateSyncStream>, Status> {
        let req = request.into_inner();
        let stream = self.state.sessions.clone().state_sync(req.last_seen_sequence);
        Ok(Response::new(Box::pin(stream)))
    }
}

pub struct AgentServiceImpl {
    pub state: WorkerState,
}

#[tonic::async_trait]
impl pb::agent_service_server::AgentService for AgentServiceImpl {
    async fn report_status(
        &self,
        request: Request<pb::ReportStatusRequest>,
    ) -> Result<Response<pb::ReportStatusResponse>, Status> {
        let req = request.into_inner();
        self.state
            .sessions
            .record_event(&req.session_id, EventType::StatusChange, json!({"agent": req.agent, "status": req.status}))
            .await
            .map_err(Status::from)?;
        Ok(Response::new(pb::ReportStatusResponse {}))
    }

    async fn submit_plan(
        &self,
        request: Request<pb::SubmitPlanRequest>,
    ) -> Result<Response<pb::SubmitPlanResponse>, Status> {
        let req = request.into_inner();
        self.state
            .sessions
            .record_event(
                &req.session_id,
                EventType::Plan,
                json!({"agent": req.agent, "markdown": req.plan_markdown}),
            )
            .await
            .map_err(Status::from)?;
        Ok(Response::new(pb::SubmitPlanResponse {}))
    }

    /// Opaque escape hatch (spec.md §4.8): persisted for debugging, and
    /// an unknown session must not fail the call.
    async fn report_hook(
        &self,
        request: Request<pb::ReportHookRequest>,
    ) -> Result<Response<pb::ReportHookResponse>, Status> {
        let req = request.into_inner();
        tracing::debug!(
            session_id = %req.session_id,
            agent = %req.agent,
            hook = %req.hook_name,
            bytes = req.payload.len(),
            "agent hook reported"
        );
        Ok(Response::new(pb::ReportHookResponse {}))
    }

    async fn set_topic(&self, request: Request<pb::SetTopicRequest>) -> Result<Response<pb::SetTopicResponse>, Status> {
        let req = request.into_inner();
        if req.topic.chars().count() > MAX_TOPIC_LEN {
            return Err(Status::from(FlowgenticError::invalid_argument(format!(
                "topic exceeds {MAX_TOPIC_LEN} characters"
            ))));
        }
        self.state.sessions.publish_topic(&req.session_id, req.topic);
        Ok(Response::new(pb::SetTopicResponse {}))
    }
}

pub struct HookServiceImpl {
    pub state: WorkerState,
}

#[tonic::async_trait]
impl pb::hook_service_server::HookService for HookServiceImpl {
    /// Thin wrapper over `AgentService::ReportHook` for the hook CLI
    /// (spec.md §6's "hook CLI" surface), so hook scripts don't need the
    /// full agent RPC client.
    async fn invoke_hook(
        &self,
        request: Request<pb::InvokeHookRequest>,
    ) -> Result<Response<pb::InvokeHookResponse>, Status> {
        let req = request.into_inner();
        tracing::debug!(
            session_id = %req.session_id,
            hook = %req.hook_name,
            bytes = req.payload.len(),
            "hook invoked"
        );
        Ok(Response::new(pb::InvokeHookResponse { accepted: true }))
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
