// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

//! Shared control-plane state. Grounded on the teacher's
//! `transport/state.rs::Store` (one struct of `Arc`-wrapped subsystems
//! passed into every handler).

use std::sync::Arc;

use flowgentic_registry::WorkerRegistry;
use flowgentic_store::db::Db;
use flowgentic_store::eventlog::EventPublisher;
use tokio::sync::Notify;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub registry: WorkerRegistry,
    pub events: Arc<EventPublisher>,
    /// Wakes the reconciler outside its 5-second tick (spec.md §4.4).
    /// `Notify` already coalesces: any number of `notify_one` calls before
    /// the reconciler next awaits `notified()` collapse into one wake.
    pub wake: Arc<Notify>,
}

impl AppState {
    pub fn new(db: Db, registry: WorkerRegistry) -> Self {
        let events = EventPublisher::new(db.clone());
        Self { db, registry, events, wake: Arc::new(Notify::new()) }
    }
}
