// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

use super::*;

fn worker(id: &str, url: &str) -> Worker {
    Worker {
        id: id.to_owned(),
        name: id.to_owned(),
        url: url.to_owned(),
        secret: "s3cret".to_owned(),
        created_at: "2026-01-01T00:00:00.000Z".to_owned(),
        updated_at: "2026-01-01T00:00:00.000Z".to_owned(),
    }
}

#[tokio::test]
async fn seeded_workers_are_visible_immediately() {
    let registry = WorkerRegistry::spawn(vec![worker("w1", "http://10.0.0.1:9000")], CancellationToken::new());
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get("w1").unwrap().url, "http://10.0.0.1:9000");
}

#[tokio::test]
async fn get_missing_worker_errors() {
    let registry = WorkerRegistry::spawn(vec![], CancellationToken::new());
    assert!(matches!(registry.get("ghost"), Err(WorkerSnapshotError::NotFound(_))));
}

#[tokio::test]
async fn upsert_adds_and_updates() {
    let registry = WorkerRegistry::spawn(vec![], CancellationToken::new());

    registry.upsert(worker("w1", "http://old:9000")).await;
    // Give the writer task a chance to process before asserting; the
    // command channel is bounded so the send above already implies
    // backpressure, but the actor processes asynchronously.
    wait_until(|| registry.len() == 1).await;
    assert_eq!(registry.get("w1").unwrap().url, "http://old:9000");

    registry.upsert(worker("w1", "http://new:9000")).await;
    wait_until(|| registry.get("w1").map(|w| w.url) == Ok("http://new:9000".to_owned())).await;
}

#[tokio::test]
async fn remove_reports_whether_present() {
    let registry = WorkerRegistry::spawn(vec![worker("w1", "http://10.0.0.1:9000")], CancellationToken::new());
    assert!(registry.remove("w1").await.unwrap());
    wait_until(|| registry.is_empty()).await;
    assert!(!registry.remove("w1").await.unwrap());
}

#[tokio::test]
async fn list_reflects_all_registered_workers() {
    let registry = WorkerRegistry::spawn(
        vec![worker("w1", "http://a:9000"), worker("w2", "http://b:9000")],
        CancellationToken::new(),
    );
    let mut ids: Vec<String> = registry.list().into_iter().map(|w| w.id).collect();
    ids.sort();
    assert_eq!(ids, vec!["w1".to_owned(), "w2".to_owned()]);
}

#[tokio::test]
async fn shutdown_stops_the_writer_without_panicking() {
    let shutdown = CancellationToken::new();
    let registry = WorkerRegistry::spawn(vec![], shutdown.clone());
    shutdown.cancel();
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    // Reads still work off the last published snapshot even after the
    // writer task has exited.
    assert!(registry.is_empty());
}

async fn wait_until(mut predicate: impl FnMut() -> bool) {
    for _ in 0..100 {
        if predicate() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    panic!("condition not met within timeout");
}
