// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

//! Conversions between the store's domain model and the generated
//! Connect/gRPC message types. Kept in one module so every service
//! handler shares the same mapping instead of re-deriving it ad hoc.

use flowgentic_proto::controlplane::v1 as pb;
use flowgentic_store::model as domain;

pub fn project_to_pb(p: domain::Project) -> pb::Project {
    pb::Project {
        id: p.id,
        display_name: p.display_name,
        default_agent: p.default_agent,
        default_model: p.default_model,
        worker_paths: p
            .worker_paths
            .into_iter()
            .map(|wp| pb::WorkerPath { worker_id: wp.worker_id, path: wp.path })
            .collect(),
        sort_index: p.sort_index,
        created_at: p.created_at,
        updated_at: p.updated_at,
    }
}

pub fn worker_to_pb(w: domain::Worker) -> pb::Worker {
    pb::Worker { id: w.id, name: w.name, url: w.url, created_at: w.created_at, updated_at: w.updated_at }
}

pub fn thread_to_pb(t: domain::Thread) -> pb::Thread {
    pb::Thread {
        id: t.id,
        project_id: t.project_id,
        mode: t.mode.to_string(),
        topic: t.topic,
        plan: t.plan,
        archived: t.archived,
        created_at: t.created_at,
        updated_at: t.updated_at,
    }
}

pub fn task_status_to_pb(s: domain::TaskStatus) -> pb::TaskStatus {
    match s {
        domain::TaskStatus::Pending => pb::TaskStatus::Pending,
        domain::TaskStatus::Running => pb::TaskStatus::Running,
        domain::TaskStatus::Done => pb::TaskStatus::Done,
        domain::TaskStatus::Failed => pb::TaskStatus::Failed,
    }
}

pub fn task_status_from_pb(s: pb::TaskStatus) -> domain::TaskStatus {
    match s {
        pb::TaskStatus::Unspecified | pb::TaskStatus::Pending => domain::TaskStatus::Pending,
        pb::TaskStatus::Running => domain::TaskStatus::Running,
        pb::TaskStatus::Done => domain::TaskStatus::Done,
        pb::TaskStatus::Failed => domain::TaskStatus::Failed,
    }
}

pub fn task_to_pb(t: domain::Task) -> pb::Task {
    pb::Task {
        id: t.id,
        thread_id: t.thread_id,
        description: t.description,
        subtasks: t.subtasks,
        memory: t.memory,
        status: task_status_to_pb(t.status) as i32,
        sort_index: t.sort_index,
        created_at: t.created_at,
        updated_at: t.updated_at,
    }
}

pub fn session_status_to_pb(s: domain::SessionStatus) -> pb::SessionStatus {
    match s {
        domain::SessionStatus::Pending => pb::SessionStatus::Pending,
        domain::SessionStatus::Scheduling => pb::SessionStatus::Scheduling,
        domain::SessionStatus::Running => pb::SessionStatus::Running,
        domain::SessionStatus::Idle => pb::SessionStatus::Idle,
        domain::SessionStatus::Stopping => pb::SessionStatus::Stopping,
        domain::SessionStatus::Stopped => pb::SessionStatus::Stopped,
        domain::SessionStatus::Errored => pb::SessionStatus::Errored,
        domain::SessionStatus::Failed => pb::SessionStatus::Failed,
    }
}

pub fn session_to_pb(s: domain::Session) -> pb::Session {
    pb::Session {
        id: s.id,
        thread_id: s.thread_id,
        task_id: s.task_id,
        worker_id: s.worker_id,
        prompt: s.prompt,
        agent: s.agent,
        model: s.model,
        mode: s.mode,
        session_mode: s.session_mode,
        agent_session_id: s.agent_session_id,
        status: session_status_to_pb(s.status) as i32,
        created_at: s.created_at,
        updated_at: s.updated_at,
    }
}

pub fn session_event_to_pb(e: domain::SessionEvent) -> pb::SessionEvent {
    pb::SessionEvent {
        session_id: e.session_id,
        sequence: e.sequence,
        event_type: e.event_type.to_string(),
        payload: e.payload,
        created_at: e.created_at,
    }
}
