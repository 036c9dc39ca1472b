// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

//! Copy-on-write worker registry. Grounded on the teacher's
//! `broker/registry.rs::PodRegistry` (register/deregister/list/healthy
//! shape), replacing its `RwLock<HashMap>` with an `ArcSwap<HashMap>`: a
//! single writer task owns mutation and publishes a fresh immutable
//! snapshot on every change, so readers on the hot path (the reconciler
//! picking a worker, a gRPC handler resolving a worker's URL) never
//! contend with each other or with the writer.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use flowgentic_store::model::Worker;

#[derive(Debug, Error)]
pub enum WorkerSnapshotError {
    #[error("worker {0} is not registered")]
    NotFound(String),
    #[error("registry writer task is no longer running")]
    WriterGone,
}

enum Command {
    Upsert(Worker),
    Remove(String, oneshot::Sender<bool>),
}

/// Read/write handle to the worker registry. Cloning is cheap: the
/// `ArcSwap` and command channel are both reference-counted.
#[derive(Clone)]
pub struct WorkerRegistry {
    snapshot: Arc<ArcSwap<HashMap<String, Worker>>>,
    cmd_tx: mpsc::Sender<Command>,
}

impl WorkerRegistry {
    /// Spawn the writer-actor task and return a handle seeded with
    /// `initial` (typically loaded from configuration at startup;
    /// spec.md §3's "config drift updates URL/secret idempotently").
    pub fn spawn(initial: Vec<Worker>, shutdown: CancellationToken) -> Self {
        let seed: HashMap<String, Worker> = initial.into_iter().map(|w| (w.id.clone(), w)).collect();
        let snapshot = Arc::new(ArcSwap::from_pointee(seed.clone()));
        let (cmd_tx, mut cmd_rx) = mpsc::channel(128);

        let writer_snapshot = Arc::clone(&snapshot);
        tokio::spawn(async move {
            let mut workers = seed;
            info!(count = workers.len(), "worker registry writer started");
            loop {
                tokio::select! {
                    cmd = cmd_rx.recv() => {
                        match cmd {
                            Some(Command::Upsert(worker)) => {
                                workers.insert(worker.id.clone(), worker);
                                writer_snapshot.store(Arc::new(workers.clone()));
                            }
                            Some(Command::Remove(id, reply)) => {
                                let removed = workers.remove(&id).is_some();
                                if removed {
                                    writer_snapshot.store(Arc::new(workers.clone()));
                                }
                                let _ = reply.send(removed);
                            }
                            None => {
                                debug!("worker registry command channel closed");
                                return;
                            }
                        }
                    }
                    _ = shutdown.cancelled() => {
                        debug!("worker registry writer shutting down");
                        return;
                    }
                }
            }
        });

        Self { snapshot, cmd_tx }
    }

    /// Insert or update a worker. Fire-and-forget from the caller's
    /// perspective: the next `get`/`list` observes it once the writer
    /// task has processed the command, which on an unbounded-enough
    /// channel is effectively immediate.
    pub async fn upsert(&self, worker: Worker) {
        let _ = self.cmd_tx.send(Command::Upsert(worker)).await;
    }

    /// Remove a worker by id. Returns whether it was present.
    pub async fn remove(&self, id: &str) -> Result<bool, WorkerSnapshotError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Remove(id.to_owned(), tx))
            .await
            .map_err(|_| WorkerSnapshotError::WriterGone)?;
        rx.await.map_err(|_| WorkerSnapshotError::WriterGone)
    }

    /// Atomic, lock-free read of a single worker.
    pub fn get(&self, id: &str) -> Result<Worker, WorkerSnapshotError> {
        self.snapshot
            .load()
            .get(id)
            .cloned()
            .ok_or_else(|| WorkerSnapshotError::NotFound(id.to_owned()))
    }

    /// Atomic, lock-free read of every registered worker.
    pub fn list(&self) -> Vec<Worker> {
        self.snapshot.load().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
