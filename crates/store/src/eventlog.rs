// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

//! The event log's in-memory publishing half (C1): per-session broadcast
//! channels bridging appends to live watchers, combined with the SQLite
//! history in [`crate::db`]. Grounded on the teacher's
//! `transport/grpc/mod.rs::spawn_broadcast_stream` (bridging a
//! `broadcast::Receiver` into an `mpsc`-backed stream) for the live-tail
//! half; the subscribe-first watermark algorithm below is this crate's own,
//! built to satisfy spec.md §4.1's exactly-once replay-to-live boundary.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, Mutex};
use tokio_stream::wrappers::ReceiverStream;

use crate::db::Db;
use crate::error::FlowgenticError;
use crate::model::SessionEvent;

/// Bounded capacity of each subscriber's live-event buffer. Overflowing
/// this causes that subscriber specifically to be dropped (its receiver
/// observes `Lagged`), never the appender (spec.md §4.1, §5).
const SUBSCRIBER_BUFFER: usize = 1024;

/// One of the three keys `WatchSessionEvents` may subscribe by (spec.md
/// §4.1/§4.5): a single session, every session under a thread, or every
/// session targeting a task.
enum Scope {
    Session,
    Thread,
    Task,
}

/// Per-session (and per-thread, per-task) broadcast hub. Entries are
/// created lazily on first append or first watch and are never removed
/// (sessions keep their event history for forensic replay; see spec.md
/// §4.9 and the retention module for the only process that actually ages
/// them out).
pub struct EventPublisher {
    db: Db,
    channels: Mutex<HashMap<String, broadcast::Sender<SessionEvent>>>,
    thread_channels: Mutex<HashMap<String, broadcast::Sender<SessionEvent>>>,
    task_channels: Mutex<HashMap<String, broadcast::Sender<SessionEvent>>>,
}

impl EventPublisher {
    pub fn new(db: Db) -> Arc<Self> {
        Arc::new(Self {
            db,
            channels: Mutex::new(HashMap::new()),
            thread_channels: Mutex::new(HashMap::new()),
            task_channels: Mutex::new(HashMap::new()),
        })
    }

    async fn sender_for(map: &Mutex<HashMap<String, broadcast::Sender<SessionEvent>>>, key: &str) -> broadcast::Sender<SessionEvent> {
        let mut map = map.lock().await;
        map.entry(key.to_owned()).or_insert_with(|| broadcast::channel(SUBSCRIBER_BUFFER).0).clone()
    }

    /// Append through the store, then publish to the session's subscribers
    /// and, since a thread or task watcher is a union over its sessions'
    /// events, to that session's owning thread and (if any) task as well.
    /// Appends never fail silently: on a persistence error, the caller
    /// receives the error and no subscriber sees the event (spec.md §4.1).
    pub async fn append(
        &self,
        session_id: &str,
        event_type: crate::model::EventType,
        payload: Vec<u8>,
    ) -> Result<u64, FlowgenticError> {
        let sequence = self.db.append_event(session_id, event_type, payload.clone()).await?;
        let event = SessionEvent {
            session_id: session_id.to_owned(),
            sequence,
            event_type,
            payload,
            created_at: crate::model::now_iso8601(),
        };
        // No subscribers is not an error: `send` only fails when the
        // receiver count is zero, which simply means nobody is watching.
        let _ = Self::sender_for(&self.channels, session_id).await.send(event.clone());

        if let Ok(session) = self.db.get_session(session_id).await {
            let _ = Self::sender_for(&self.thread_channels, &session.thread_id).await.send(event.clone());
            if let Some(task_id) = &session.task_id {
                let _ = Self::sender_for(&self.task_channels, task_id).await.send(event);
            }
        }
        Ok(sequence)
    }

    /// `Watch(session_id, after_sequence)`: emits historical events from
    /// `after_sequence+1` first, then seamlessly transitions to live
    /// events with no duplication and no gap (spec.md §4.1).
    pub fn watch(
        self: &Arc<Self>,
        session_id: String,
        after_sequence: u64,
    ) -> ReceiverStream<Result<SessionEvent, FlowgenticError>> {
        self.watch_scoped(Scope::Session, session_id, after_sequence)
    }

    /// `Watch(thread_id, after_sequence)`: the union of every session under
    /// the thread, interleaved in replay order (spec.md §4.1/§4.5). A
    /// session created after the subscription starts is picked up as soon
    /// as it appends its first event, since every append also publishes to
    /// its owning thread's channel.
    pub fn watch_by_thread(
        self: &Arc<Self>,
        thread_id: String,
        after_sequence: u64,
    ) -> ReceiverStream<Result<SessionEvent, FlowgenticError>> {
        self.watch_scoped(Scope::Thread, thread_id, after_sequence)
    }

    /// `Watch(task_id, after_sequence)`: the union of every session
    /// targeting the task (spec.md §4.1/§4.5).
    pub fn watch_by_task(
        self: &Arc<Self>,
        task_id: String,
        after_sequence: u64,
    ) -> ReceiverStream<Result<SessionEvent, FlowgenticError>> {
        self.watch_scoped(Scope::Task, task_id, after_sequence)
    }

    /// Shared implementation: subscribe to the scope's broadcast channel
    /// *before* reading history, buffering anything published in between;
    /// then replay history up to the pre-subscribe point; then flush the
    /// buffered live events, skipping any whose sequence was already
    /// covered by the history read; then forward the channel live.
    ///
    /// Sequence numbers are only unique within a session, so a thread/task
    /// watch — which multiplexes several sessions onto one stream — tracks
    /// the replay-vs-live watermark per session_id rather than as a single
    /// scalar; a session-scoped watch is just the one-entry case of that.
    fn watch_scoped(
        self: &Arc<Self>,
        scope: Scope,
        key: String,
        after_sequence: u64,
    ) -> ReceiverStream<Result<SessionEvent, FlowgenticError>> {
        let (tx, rx) = mpsc::channel(64);
        let publisher = Arc::clone(self);
        tokio::spawn(async move {
            let channels = match scope {
                Scope::Session => &publisher.channels,
                Scope::Thread => &publisher.thread_channels,
                Scope::Task => &publisher.task_channels,
            };
            let mut live_rx = Self::sender_for(channels, &key).await.subscribe();

            let history = match scope {
                Scope::Session => publisher.db.replay_events(&key, after_sequence).await,
                Scope::Thread => publisher.db.replay_events_by_thread(&key, after_sequence).await,
                Scope::Task => publisher.db.replay_events_by_task(&key, after_sequence).await,
            };
            let history = match history {
                Ok(events) => events,
                Err(e) => {
                    let _ = tx.send(Err(e)).await;
                    return;
                }
            };

            let mut last_sent: HashMap<String, u64> = HashMap::new();
            for event in history {
                last_sent.insert(event.session_id.clone(), event.sequence);
                if tx.send(Ok(event)).await.is_err() {
                    return;
                }
            }

            loop {
                match live_rx.recv().await {
                    Ok(event) => {
                        let watermark = last_sent.get(&event.session_id).copied().unwrap_or(after_sequence);
                        if event.sequence <= watermark {
                            continue;
                        }
                        last_sent.insert(event.session_id.clone(), event.sequence);
                        if tx.send(Ok(event)).await.is_err() {
                            return;
                        }
                    }
                    // Overflow: this subscriber fell behind production of
                    // new events. Per spec.md §4.1/§5 the backpressure
                    // policy drops the slowest subscriber rather than
                    // blocking appends, so the watch terminates with an
                    // explicit error instead of silently skipping sequences.
                    Err(broadcast::error::RecvError::Lagged(_)) => {
                        let _ = tx
                            .send(Err(FlowgenticError::aborted(
                                "watcher fell behind and was dropped (event overflow)",
                            )))
                            .await;
                        return;
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
        });
        ReceiverStream::new(rx)
    }
}

#[cfg(test)]
#[path = "eventlog_tests.rs"]
mod tests;
