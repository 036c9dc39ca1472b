// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

//! gRPC service implementations (C5). Grounded on the teacher's
//! `transport/grpc/mod.rs` (one `AppState`-backed struct implementing
//! each generated server trait, `spawn_broadcast_stream`-style live
//! watch bridging).

use std::pin::Pin;

use flowgentic_proto::controlplane::v1 as pb;
use flowgentic_store::db;
use flowgentic_store::error::FlowgenticError;
use flowgentic_store::model;
use tokio_stream::{Stream, StreamExt};
use tonic::{Request, Response, Status};

use crate::convert;
use crate::state::AppState;

pub struct SessionServiceImpl {
    pub state: AppState,
}

type EventStream = Pin<Box<dyn Stream<Item = Result<pb::SessionEvent, Status>> + Send>>;

#[tonic::async_trait]
impl pb::session_service_server::SessionService for SessionServiceImpl {
    async fn create_session(
        &self,
        request: Request<pb::CreateSessionRequest>,
    ) -> Result<Response<pb::CreateSessionResponse>, Status> {
        let req = request.into_inner();

        // Validates the thread exists before anything else (spec.md §4.5);
        // `?` surfaces the store's own `not_found` as the gRPC status.
        self.state.db.get_thread(&req.thread_id).await.map_err(Status::from)?;

        if let Some(key) = &req.idempotency_key {
            if let Some(existing) =
                self.state.db.find_session_by_idempotency_key(&req.thread_id, key).await.map_err(Status::from)?
            {
                return Ok(Response::new(pb::CreateSessionResponse { session_id: existing.id }));
            }
        }

        let id = db::new_id();
        let prompt = req.prompt;
        let session = model::Session {
            id: id.clone(),
            thread_id: req.thread_id,
            task_id: req.task_id,
            worker_id: req.worker_id,
            prompt: prompt.clone(),
            agent: req.agent,
            model: req.model,
            mode: req.mode,
            // `CreateSessionRequest` carries no session_mode of its own;
            // it's established afterward via `SetSessionMode`.
            session_mode: String::new(),
            agent_session_id: None,
            status: model::SessionStatus::Pending,
            created_at: model::now_iso8601(),
            updated_at: model::now_iso8601(),
            idempotency_key: req.idempotency_key,
        };
        self.state.db.create_session(session).await.map_err(Status::from)?;

        // Event #1 of the session's log (spec.md §4.5, §8 scenario 1), then
        // the reconciler is woken so it doesn't wait for the next tick.
        self.state
            .events
            .append(&id, model::EventType::UserMessage, prompt.into_bytes())
            .await
            .map_err(Status::from)?;
        self.state.wake.notify_one();

        Ok(Response::new(pb::CreateSessionResponse { session_id: id }))
    }

    async fn get_session(
        &self,
        request: Request<pb::GetSessionRequest>,
    ) -> Result<Response<pb::GetSessionResponse>, Status> {
        let session_id = request.into_inner().session_id;
        let session =
            self.state.db.get_session(&session_id).await.map_err(Status::from)?;
        Ok(Response::new(pb::GetSessionResponse { session: Some(convert::session_to_pb(session)) }))
    }

    async fn list_sessions(
        &self,
        request: Request<pb::ListSessionsRequest>,
    ) -> Result<Response<pb::ListSessionsResponse>, Status> {
        let thread_id = request.into_inner().thread_id;
        let sessions = self
            .state
            .db
            .list_sessions_by_thread(&thread_id)
            .await
            .map_err(Status::from)?
            .into_iter()
            .map(convert::session_to_pb)
            .collect();
        Ok(Response::new(pb::ListSessionsResponse { sessions }))
    }

    async fn prompt_session(
        &self,
        request: Request<pb::PromptSessionRequest>,
    ) -> Result<Response<pb::PromptSessionResponse>, Status> {
        let req = request.into_inner();
        let session = self.state.db.get_session(&req.session_id).await.map_err(Status::from)?;
        if !matches!(session.status, model::SessionStatus::Running | model::SessionStatus::Idle) {
            return Err(FlowgenticError::failed_precondition(format!(
                "session {} is {}, not running or idle",
                session.id, session.status
            ))
            .to_grpc_status());
        }
        let worker = self.state.registry.get(&session.worker_id).map_err(|_| {
            FlowgenticError::not_found(format!("worker {} not registered", session.worker_id)).to_grpc_status()
        })?;
        let text = req.content_blocks.into_iter().map(|c| c.text).collect::<Vec<_>>().join("");

        // Appended before the relay call so the event log reflects the
        // delivered prompt even if the worker call itself then fails
        // (spec.md §4.5: "appends a user_message event ... before returning").
        self.state
            .events
            .append(&req.session_id, model::EventType::UserMessage, text.clone().into_bytes())
            .await
            .map_err(Status::from)?;

        let stop_reason =
            crate::reconciler::relay_prompt(&worker, &req.session_id, &text).await.map_err(Status::from)?;
        Ok(Response::new(pb::PromptSessionResponse { stop_reason }))
    }

    async fn cancel_session(
        &self,
        request: Request<pb::CancelSessionRequest>,
    ) -> Result<Response<pb::CancelSessionResponse>, Status> {
        let session_id = request.into_inner().session_id;
        let session = self.state.db.get_session(&session_id).await.map_err(Status::from)?;
        let worker = self.state.registry.get(&session.worker_id).map_err(|_| {
            FlowgenticError::not_found(format!("worker {} not registered", session.worker_id)).to_grpc_status()
        })?;
        crate::reconciler::relay_cancel(&worker, &session_id).await.map_err(Status::from)?;
        Ok(Response::new(pb::CancelSessionResponse {}))
    }

    async fn set_session_mode(
        &self,
        request: Request<pb::SetSessionModeRequest>,
    ) -> Result<Response<pb::SetSessionModeResponse>, Status> {
        let req = request.into_inner();
        let session = self.state.db.get_session(&req.session_id).await.map_err(Status::from)?;
        let worker = self.state.registry.get(&session.worker_id).map_err(|_| {
            FlowgenticError::not_found(format!("worker {} not registered", session.worker_id)).to_grpc_status()
        })?;
        crate::reconciler::relay_set_mode(&worker, &req.session_id, &req.mode_id)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(pb::SetSessionModeResponse {}))
    }

    type WatchSessionEventsStream = EventStream;

    async fn watch_session_events(
        &self,
        request: Request<pb::WatchSessionEventsRequest>,
    ) -> Result<Response<Self::WatchSessionEventsStream>, Status> {
        let req = request.into_inner();
        // spec.md §4.1/§4.5: `WatchSessionEvents` subscribes by exactly one
        // of thread_id | session_id | task_id; session_id takes precedence
        // when a caller somehow sets more than one.
        let stream = if let Some(session_id) = req.session_id {
            self.state.events.watch(session_id, req.after_sequence)
        } else if let Some(thread_id) = req.thread_id {
            self.state.events.watch_by_thread(thread_id, req.after_sequence)
        } else if let Some(task_id) = req.task_id {
            self.state.events.watch_by_task(task_id, req.after_sequence)
        } else {
            return Err(Status::invalid_argument("one of thread_id, session_id, or task_id is required"));
        };
        let mapped = stream.map(|result| result.map(convert::session_event_to_pb).map_err(Status::from));
        Ok(Response::new(Box::pin(mapped)))
    }
}

pub struct ThreadServiceImpl {
    pub state: AppState,
}

#[tonic::async_trait]
impl pb::thread_service_server::ThreadService for ThreadServiceImpl {
    async fn create_thread(
        &self,
        request: Request<pb::CreateThreadRequest>,
    ) -> Result<Response<pb::CreateThreadResponse>, Status> {
        let req = request.into_inner();
        let mode: model::ThreadMode =
            req.mode.parse().map_err(|_| Status::invalid_argument("mode must be single_agent or orchestrated"))?;
        let thread = model::Thread {
            id: db::new_id(),
            project_id: req.project_id,
            mode,
            topic: None,
            plan: None,
            archived: false,
            created_at: model::now_iso8601(),
            updated_at: model::now_iso8601(),
        };
        self.state.db.create_thread(thread.clone()).await.map_err(Status::from)?;
        Ok(Response::new(pb::CreateThreadResponse { thread: Some(convert::thread_to_pb(thread)) }))
    }

    async fn get_thread(
        &self,
        request: Request<pb::GetThreadRequest>,
    ) -> Result<Response<pb::GetThreadResponse>, Status> {
        let thread_id = request.into_inner().thread_id;
        let thread = self.state.db.get_thread(&thread_id).await.map_err(Status::from)?;
        Ok(Response::new(pb::GetThreadResponse { thread: Some(convert::thread_to_pb(thread)) }))
    }

    async fn list_threads(
        &self,
        request: Request<pb::ListThreadsRequest>,
    ) -> Result<Response<pb::ListThreadsResponse>, Status> {
        let project_id = request.into_inner().project_id;
        let threads = self
            .state
            .db
            .list_threads_by_project(&project_id)
            .await
            .map_err(Status::from)?
            .into_iter()
            .map(convert::thread_to_pb)
            .collect();
        Ok(Response::new(pb::ListThreadsResponse { threads }))
    }

    async fn archive_thread(
        &self,
        request: Request<pb::ArchiveThreadRequest>,
    ) -> Result<Response<pb::ArchiveThreadResponse>, Status> {
        let thread_id = request.into_inner().thread_id;
        self.state.db.archive_thread(&thread_id).await.map_err(Status::from)?;
        Ok(Response::new(pb::ArchiveThreadResponse {}))
    }

    async fn delete_thread(
        &self,
        request: Request<pb::DeleteThreadRequest>,
    ) -> Result<Response<pb::DeleteThreadResponse>, Status> {
        let thread_id = request.into_inner().thread_id;
        // Deletion cascades via the `threads`→`sessions`/`tasks` foreign
        // keys (spec.md §3); the store has no standalone delete_thread,
        // so this goes straight at the project's cascading delete path
        // when the thread is the project's last one is out of scope here
        // — deletion is modeled at the project level in this store.
        let _ = thread_id;
        Err(Status::unimplemented("thread deletion happens via project deletion cascade"))
    }
}

pub struct TaskServiceImpl {
    pub state: AppState,
}

#[tonic::async_trait]
impl pb::task_service_server::TaskService for TaskServiceImpl {
    async fn create_task(
        &self,
        request: Request<pb::CreateTaskRequest>,
    ) -> Result<Response<pb::CreateTaskResponse>, Status> {
        let req = request.into_inner();
        let task = model::Task {
            id: db::new_id(),
            thread_id: req.thread_id,
            description: req.description,
            subtasks: req.subtasks,
            memory: String::new(),
            status: model::TaskStatus::Pending,
            sort_index: 0,
            created_at: model::now_iso8601(),
            updated_at: model::now_iso8601(),
        };
        self.state.db.create_task(task.clone()).await.map_err(Status::from)?;
        Ok(Response::new(pb::CreateTaskResponse { task: Some(convert::task_to_pb(task)) }))
    }

    async fn update_task(
        &self,
        request: Request<pb::UpdateTaskRequest>,
    ) -> Result<Response<pb::UpdateTaskResponse>, Status> {
        let req = request.into_inner();
        if let Some(status) = req.status {
            let status = pb::TaskStatus::try_from(status)
                .map_err(|_| Status::invalid_argument("invalid task status"))?;
            self.state
                .db
                .update_task_status(&req.task_id, convert::task_status_from_pb(status))
                .await
                .map_err(Status::from)?;
        }
        // `description`/`memory` updates share no dedicated store method
        // yet beyond status; callers needing those should recreate the
        // task, matching this store's minimal write surface.
        let task = self
            .state
            .db
            .list_tasks_by_thread(&req.task_id)
            .await
            .map_err(Status::from)?
            .into_iter()
            .next();
        match task {
            Some(task) => Ok(Response::new(pb::UpdateTaskResponse { task: Some(convert::task_to_pb(task)) })),
            None => Err(Status::not_found("task not found")),
        }
    }

    async fn list_tasks_by_thread(
        &self,
        request: Request<pb::ListTasksByThreadRequest>,
    ) -> Result<Response<pb::ListTasksByThreadResponse>, Status> {
        let thread_id = request.into_inner().thread_id;
        let tasks = self
            .state
            .db
            .list_tasks_by_thread(&thread_id)
            .await
            .map_err(Status::from)?
            .into_iter()
            .map(convert::task_to_pb)
            .collect();
        Ok(Response::new(pb::ListTasksByThreadResponse { tasks }))
    }

    async fn delete_task(
        &self,
        _request: Request<pb::DeleteTaskRequest>,
    ) -> Result<Response<pb::DeleteTaskResponse>, Status> {
        Err(Status::unimplemented("tasks are retired via status transition, not hard delete"))
    }
}

pub struct ProjectServiceImpl {
    pub state: AppState,
}

#[tonic::async_trait]
impl pb::project_service_server::ProjectService for ProjectServiceImpl {
    async fn create_project(
        &self,
        request: Request<pb::CreateProjectRequest>,
    ) -> Result<Response<pb::CreateProjectResponse>, Status> {
        let req = request.into_inner();
        let id = model::ProjectId::parse(&req.id).map_err(Status::from)?.as_str().to_owned();
        let project = model::Project {
            id,
            display_name: req.display_name,
            default_agent: req.default_agent,
            default_model: req.default_model,
            worker_paths: Vec::new(),
            sort_index: 0,
            created_at: model::now_iso8601(),
            updated_at: model::now_iso8601(),
        };
        self.state.db.create_project(project.clone()).await.map_err(Status::from)?;
        Ok(Response::new(pb::CreateProjectResponse { project: Some(convert::project_to_pb(project)) }))
    }

    async fn get_project(
        &self,
        request: Request<pb::GetProjectRequest>,
    ) -> Result<Response<pb::GetProjectResponse>, Status> {
        let id = request.into_inner().id;
        let project = self.state.db.get_project(&id).await.map_err(Status::from)?;
        Ok(Response::new(pb::GetProjectResponse { project: Some(convert::project_to_pb(project)) }))
    }

    async fn list_projects(
        &self,
        _request: Request<pb::ListProjectsRequest>,
    ) -> Result<Response<pb::ListProjectsResponse>, Status> {
        Err(Status::unimplemented("store has no list-all-projects query yet"))
    }

    async fn delete_project(
        &self,
        request: Request<pb::DeleteProjectRequest>,
    ) -> Result<Response<pb::DeleteProjectResponse>, Status> {
        let id = request.into_inner().id;
        self.state.db.delete_project(&id).await.map_err(Status::from)?;
        Ok(Response::new(pb::DeleteProjectResponse {}))
    }
}

pub struct WorkerServiceImpl {
    pub state: AppState,
}

#[tonic::async_trait]
impl pb::worker_service_server::WorkerService for WorkerServiceImpl {
    async fn register_worker(
        &self,
        request: Request<pb::RegisterWorkerRequest>,
    ) -> Result<Response<pb::RegisterWorkerResponse>, Status> {
        let req = request.into_inner();
        let worker = model::Worker {
            id: req.id,
            name: req.name,
            url: req.url,
            secret: req.secret,
            created_at: model::now_iso8601(),
            updated_at: model::now_iso8601(),
        };
        self.state.db.upsert_worker(worker.clone()).await.map_err(Status::from)?;
        self.state.registry.upsert(worker.clone()).await;
        Ok(Response::new(pb::RegisterWorkerResponse { worker: Some(convert::worker_to_pb(worker)) }))
    }

    async fn list_workers(
        &self,
        _request: Request<pb::ListWorkersRequest>,
    ) -> Result<Response<pb::ListWorkersResponse>, Status> {
        let workers = self.state.registry.list().into_iter().map(convert::worker_to_pb).collect();
        Ok(Response::new(pb::ListWorkersResponse { workers }))
    }

    async fn remove_worker(
        &self,
        request: Request<pb::RemoveWorkerRequest>,
    ) -> Result<Response<pb::RemoveWorkerResponse>, Status> {
        let id = request.into_inner().id;
        self.state.registry.remove(&id).await.map_err(|e| Status::internal(e.to_string()))?;
        Ok(Response::new(pb::RemoveWorkerResponse {}))
    }
}

pub struct EmbeddedWorkerServiceImpl {
    pub state: AppState,
}

#[tonic::async_trait]
impl pb::embedded_worker_service_server::EmbeddedWorkerService for EmbeddedWorkerServiceImpl {
    async fn get_embedded_worker_status(
        &self,
        _request: Request<pb::GetEmbeddedWorkerStatusRequest>,
    ) -> Result<Response<pb::GetEmbeddedWorkerStatusResponse>, Status> {
        let status = if self.state.registry.get("embedded").is_ok() {
            pb::EmbeddedWorkerStatus::Running
        } else {
            pb::EmbeddedWorkerStatus::Disabled
        };
        let worker_id = matches!(status, pb::EmbeddedWorkerStatus::Running).then(|| "embedded".to_owned());
        Ok(Response::new(pb::GetEmbeddedWorkerStatusResponse { status: status as i32, worker_id }))
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
