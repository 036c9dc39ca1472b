// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

use super::*;
use crate::model::{now_iso8601, EventType, Session, SessionStatus, Thread, ThreadMode};
use tokio_stream::StreamExt;

async fn seeded_db() -> Db {
    let db = Db::open_in_memory().unwrap();
    db.create_project(crate::model::Project {
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
    db.create_session(Session {
        id: "s1".into(),
        thread_id: "t1".into(),
        task_id: None,
        worker_id: "w1".into(),
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
    })
    .await
    .unwrap();
    db
}

#[tokio::test]
async fn watch_from_zero_receives_full_history_in_order() {
    let db = seeded_db().await;
    let publisher = EventPublisher::new(db);

    for i in 0..5 {
        publisher.append("s1", EventType::AgentMessageChunk, format!("chunk-{i}").into_bytes()).await.unwrap();
    }

    let mut stream = publisher.watch("s1".to_owned(), 0);
    for expected_seq in 1..=5u64 {
        let event = stream.next().await.unwrap().unwrap();
        assert_eq!(event.sequence, expected_seq);
    }
}

#[tokio::test]
async fn watch_after_k_skips_already_seen_events() {
    let db = seeded_db().await;
    let publisher = EventPublisher::new(db);

    for i in 0..3 {
        publisher.append("s1", EventType::AgentMessageChunk, format!("chunk-{i}").into_bytes()).await.unwrap();
    }

    let mut stream = publisher.watch("s1".to_owned(), 1);
    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.sequence, 2);
    let second = stream.next().await.unwrap().unwrap();
    assert_eq!(second.sequence, 3);
}

#[tokio::test]
async fn watch_sees_events_appended_after_subscription_with_no_gap() {
    let db = seeded_db().await;
    let publisher = EventPublisher::new(db);

    let mut stream = publisher.watch("s1".to_owned(), 0);

    let publisher2 = Arc::clone(&publisher);
    tokio::spawn(async move {
        for i in 0..3 {
            publisher2.append("s1", EventType::AgentMessageChunk, format!("chunk-{i}").into_bytes()).await.unwrap();
        }
    });

    for expected_seq in 1..=3u64 {
        let event = tokio::time::timeout(std::time::Duration::from_secs(5), stream.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(event.sequence, expected_seq);
    }
}
