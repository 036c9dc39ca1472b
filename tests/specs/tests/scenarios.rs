// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

//! In-process coverage of spec.md §8's testable properties.
//!
//! Scenarios 1 (happy path), 2's live half, 4 (cancel during prompt) and
//! 5 (permission auto-decline) all require a real ACP-speaking vendor
//! agent subprocess on the other end of `flowgentic-driver`'s `Driver`
//! contract; there is no such binary available in this environment and
//! one isn't fabricated here. What follows covers the scenarios that are
//! genuinely exercisable against an in-memory `AppState`: the
//! unknown-worker failure path (scenario 3), the topic-length boundary
//! (scenario 6), and the event log's replay-then-tail ordering guarantee
//! that underpins scenario 2.

use flowgentic_specs::{pending_session, seeded_state, worker};
use flowgentic_store::model::EventType;
use tokio_stream::StreamExt;

/// Scenario 6: `SetTopic` accepts exactly `MAX_TOPIC_LEN` characters and
/// rejects one more, per spec.md §4.8/§4.9.
#[tokio::test]
async fn set_topic_accepts_the_boundary_and_rejects_one_over() {
    let state = seeded_state(vec![]).await;

    let at_limit = "a".repeat(flowgentic_store::model::MAX_TOPIC_LEN);
    state.db.set_thread_topic("t1", &at_limit).await.expect("140 chars is in bounds");

    let thread = state.db.get_thread("t1").await.unwrap();
    assert_eq!(thread.topic.as_deref(), Some(at_limit.as_str()));

    let over_limit = "a".repeat(flowgentic_store::model::MAX_TOPIC_LEN + 1);
    let err = state.db.set_thread_topic("t1", &over_limit).await.unwrap_err();
    assert_eq!(err.kind, flowgentic_store::error::ErrorKind::InvalidArgument);

    // the rejected write must not have clobbered the prior, valid topic.
    let thread = state.db.get_thread("t1").await.unwrap();
    assert_eq!(thread.topic.as_deref(), Some(at_limit.as_str()));
}

/// Scenario 3: dispatching a session whose worker isn't registered fails
/// the session and records why, via the event log rather than only the
/// DB status column (spec.md §3: status is a projection of the latest
/// status_change event).
#[tokio::test]
async fn dispatching_to_an_unregistered_worker_records_a_status_change_with_reason() {
    let state = seeded_state(vec![]).await;
    let session = pending_session("s1", "ghost-worker");
    state.db.create_session(session.clone()).await.unwrap();

    flowgentic_controlplane::reconciler::reconcile_once(&state).await.unwrap();

    let updated = state.db.get_session(&session.id).await.unwrap();
    assert_eq!(updated.status, flowgentic_store::model::SessionStatus::Failed);

    let mut stream = state.events.watch(session.id.clone(), 0);
    let events: Vec<_> = tokio::time::timeout(std::time::Duration::from_secs(1), async {
        let mut seen = Vec::new();
        while seen.len() < 2 {
            seen.push(stream.next().await.unwrap().unwrap());
        }
        seen
    })
    .await
    .expect("both status_change events arrive promptly");

    assert!(events.iter().all(|e| e.event_type == EventType::StatusChange));
    let scheduling: serde_json::Value = serde_json::from_slice(&events[0].payload).unwrap();
    assert_eq!(scheduling["status"], "scheduling");
    let failed: serde_json::Value = serde_json::from_slice(&events[1].payload).unwrap();
    assert_eq!(failed["status"], "failed");
    assert!(failed["reason"].as_str().unwrap().contains("unknown worker"));
}

/// Scenario 2's event-log half: a watcher that subscribes after some
/// events already happened still gets them in order, then keeps
/// receiving new ones as they're appended ("replay-then-tail").
#[tokio::test]
async fn watch_replays_history_then_tails_new_events() {
    let state = seeded_state(vec![worker("w1", "http://127.0.0.1:50099")]).await;
    let session = pending_session("s1", "w1");
    state.db.create_session(session.clone()).await.unwrap();

    for i in 0..3u8 {
        state
            .events
            .append(&session.id, EventType::AgentMessageChunk, format!("chunk {i}").into_bytes())
            .await
            .unwrap();
    }

    let mut stream = state.events.watch(session.id.clone(), 0);
    for i in 0..3u8 {
        let event = stream.next().await.unwrap().unwrap();
        assert_eq!(event.sequence, u64::from(i) + 1);
        assert_eq!(event.payload, format!("chunk {i}").into_bytes());
    }

    state.events.append(&session.id, EventType::AgentMessageChunk, b"chunk 3".to_vec()).await.unwrap();
    let tailed = stream.next().await.unwrap().unwrap();
    assert_eq!(tailed.sequence, 4);
    assert_eq!(tailed.payload, b"chunk 3");
}
