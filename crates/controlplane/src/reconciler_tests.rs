// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

use super::*;

fn worker(url: &str) -> Worker {
    Worker {
        id: "w1".into(),
        name: "worker-1".into(),
        url: url.into(),
        secret: "shh".into(),
        created_at: "2026-01-01T00:00:00.000Z".into(),
        updated_at: "2026-01-01T00:00:00.000Z".into(),
    }
}

#[test]
fn connect_accepts_a_well_formed_url() {
    let channel = connect(&worker("http://127.0.0.1:50051"));
    assert!(channel.is_ok());
}

#[test]
fn connect_rejects_a_malformed_url() {
    let err = connect(&worker("not a url")).unwrap_err();
    assert_eq!(err.kind, flowgentic_store::error::ErrorKind::Internal);
}

#[test]
fn authed_attaches_a_bearer_header() {
    let request = authed((), "topsecret").unwrap();
    let header = request.metadata().get("authorization").unwrap();
    assert_eq!(header.to_str().unwrap(), "Bearer topsecret");
}

async fn seeded_state(registry: flowgentic_registry::WorkerRegistry) -> (AppState, Session) {
    use flowgentic_store::db::Db;
    use flowgentic_store::model::{now_iso8601, Project, Thread, ThreadMode};

    let db = Db::open_in_memory().unwrap();
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
    .unwrap();
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
    .unwrap();
    let session = Session {
        id: "s1".into(),
        thread_id: "t1".into(),
        task_id: None,
        worker_id: "ghost".into(),
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
    };
    db.create_session(session.clone()).await.unwrap();
    (AppState::new(db, registry), session)
}

#[tokio::test]
async fn dispatch_against_an_unregistered_worker_fails_the_session_with_a_reason() {
    use tokio_stream::StreamExt;

    let registry = flowgentic_registry::WorkerRegistry::spawn(vec![], CancellationToken::new());
    let (state, session) = seeded_state(registry).await;

    dispatch(&state, session.clone()).await;

    let updated = state.db.get_session(&session.id).await.unwrap();
    assert_eq!(updated.status, SessionStatus::Failed);

    let mut stream = state.events.watch(session.id.clone(), 0);
    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.event_type, flowgentic_store::model::EventType::StatusChange);
    let payload: serde_json::Value = serde_json::from_slice(&first.payload).unwrap();
    assert_eq!(payload["status"], "failed");
    assert!(payload["reason"].as_str().unwrap().contains("unknown worker"));
}

#[tokio::test]
async fn reconcile_once_records_a_scheduling_event_before_dispatching() {
    use tokio_stream::StreamExt;

    let registry = flowgentic_registry::WorkerRegistry::spawn(vec![], CancellationToken::new());
    let (state, session) = seeded_state(registry).await;

    reconcile_once(&state).await.unwrap();

    let mut stream = state.events.watch(session.id.clone(), 0);
    let first = stream.next().await.unwrap().unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&first.payload).unwrap();
    assert_eq!(payload["status"], "scheduling");

    let second = stream.next().await.unwrap().unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&second.payload).unwrap();
    assert_eq!(payload["status"], "failed");
}
