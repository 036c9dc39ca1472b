// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

use super::*;
use flowgentic_registry::WorkerRegistry;
use flowgentic_store::db::Db;

fn worker(id: &str) -> Worker {
    Worker {
        id: id.into(),
        name: id.into(),
        url: "http://127.0.0.1:1".into(),
        secret: "s".into(),
        created_at: "2026-01-01T00:00:00.000Z".into(),
        updated_at: "2026-01-01T00:00:00.000Z".into(),
    }
}

#[tokio::test]
async fn reconcile_watchers_tracks_registry_membership() {
    let shutdown = CancellationToken::new();
    let registry = WorkerRegistry::spawn(vec![worker("w1")], shutdown.child_token());
    let db = Db::open_in_memory().unwrap();
    let state = AppState::new(db, registry.clone());

    let mut spawned = HashMap::new();
    reconcile_watchers(&state, &shutdown, &mut spawned);
    assert_eq!(spawned.len(), 1);
    assert!(!spawned["w1"].is_cancelled());

    registry.remove("w1").await.unwrap();
    for _ in 0..50 {
        if registry.list().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    reconcile_watchers(&state, &shutdown, &mut spawned);
    assert!(spawned.is_empty());
}
