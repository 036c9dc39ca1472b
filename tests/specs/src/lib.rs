// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

//! Shared scenario-test harness (spec.md §8's "concrete end-to-end
//! scenarios"). Exercises the control plane's service/reconciler/
//! state-sync layers directly against an in-memory `AppState`, without a
//! real worker or agent subprocess — the driver's own ACP/subprocess
//! plumbing is covered at the unit level in `flowgentic-driver`, and a
//! live vendor agent binary isn't available in this environment.

use flowgentic_controlplane::state::AppState;
use flowgentic_registry::WorkerRegistry;
use flowgentic_store::db::Db;
use flowgentic_store::model::{now_iso8601, Project, Session, SessionStatus, Thread, ThreadMode, Worker};
use tokio_util::sync::CancellationToken;

pub fn worker(id: &str, url: &str) -> Worker {
    Worker {
        id: id.into(),
        name: id.into(),
        url: url.into(),
        secret: "shh".into(),
        created_at: now_iso8601(),
        updated_at: now_iso8601(),
    }
}

/// An `AppState` seeded with one project and one thread, plus whichever
/// workers the caller registers up front.
pub async fn seeded_state(workers: Vec<Worker>) -> AppState {
    let db = Db::open_in_memory().expect("in-memory db");
    db.create_project(Project {
        id: "p1".into(),
        display_name: "p1".into(),
        default_agent: "claude-code".into(),
        default_model: None,
        worker_paths: Vec::new(),
        sort_index: 0,
        created_at: now_iso8601(),
        updated_at: now_iso8601(),
    })
    .await
    .expect("create project");
    db.create_thread(Thread {
        id: "t1".into(),
        project_id: "p1".into(),
        mode: ThreadMode::SingleAgent,
        topic: None,
        plan: None,
        archived: false,
        created_at: now_iso8601(),
        updated_at: now_iso8601(),
    })
    .await
    .expect("create thread");
    let registry = WorkerRegistry::spawn(workers, CancellationToken::new());
    AppState::new(db, registry)
}

/// A pending session on thread `t1`, owned by `worker_id`.
pub fn pending_session(id: &str, worker_id: &str) -> Session {
    Session {
        id: id.into(),
        thread_id: "t1".into(),
        task_id: None,
        worker_id: worker_id.into(),
        prompt: "hello".into(),
        agent: "claude-code".into(),
        model: None,
        mode: "code".into(),
        session_mode: String::new(),
        agent_session_id: None,
        status: SessionStatus::Pending,
        created_at: now_iso8601(),
        updated_at: now_iso8601(),
        idempotency_key: None,
    }
}
