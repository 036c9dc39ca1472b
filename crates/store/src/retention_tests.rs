// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

use super::*;
use crate::db::Db;
use crate::model::{now_iso8601, EventType, Project, Session, SessionStatus, Thread, ThreadMode};

async fn seeded_db() -> Db {
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
    db
}

fn session(id: &str, status: SessionStatus) -> Session {
    Session {
        id: id.to_owned(),
        thread_id: "t1".into(),
        task_id: None,
        worker_id: "w1".into(),
        prompt: "hi".into(),
        agent: "claude-code".into(),
        model: None,
        mode: "code".into(),
        session_mode: String::new(),
        agent_session_id: None,
        status,
        created_at: now_iso8601(),
        updated_at: now_iso8601(),
        idempotency_key: None,
    }
}

#[tokio::test]
async fn prune_only_deletes_events_of_terminal_sessions_before_cutoff() {
    let db = seeded_db().await;

    db.create_session(session("stopped-1", SessionStatus::Pending)).await.unwrap();
    db.append_event("stopped-1", EventType::UserMessage, b"hi".to_vec()).await.unwrap();
    db.update_session_status("stopped-1", SessionStatus::Stopped, None).await.unwrap();

    db.create_session(session("running-1", SessionStatus::Running)).await.unwrap();
    db.append_event("running-1", EventType::UserMessage, b"hi".to_vec()).await.unwrap();

    // A cutoff far in the future catches every terminal session regardless
    // of exact timestamp, but must never touch a non-terminal one.
    let deleted = db.prune_events_for_sessions_updated_before("2999-01-01T00:00:00.000Z").await.unwrap();
    assert_eq!(deleted, 1);

    let stopped_events = db.replay_events("stopped-1", 0).await.unwrap();
    assert!(stopped_events.is_empty());

    let running_events = db.replay_events("running-1", 0).await.unwrap();
    assert_eq!(running_events.len(), 1);
}

#[tokio::test]
async fn prune_respects_cutoff_in_the_past() {
    let db = seeded_db().await;

    db.create_session(session("stopped-1", SessionStatus::Pending)).await.unwrap();
    db.append_event("stopped-1", EventType::UserMessage, b"hi".to_vec()).await.unwrap();
    db.update_session_status("stopped-1", SessionStatus::Stopped, None).await.unwrap();

    // A cutoff in the distant past should not yet catch a just-stopped session.
    let deleted = db.prune_events_for_sessions_updated_before("2000-01-01T00:00:00.000Z").await.unwrap();
    assert_eq!(deleted, 0);

    let events = db.replay_events("stopped-1", 0).await.unwrap();
    assert_eq!(events.len(), 1);
}
