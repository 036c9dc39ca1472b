// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

//! SQLite-backed session store (C2). A single writer-owned connection
//! behind a `Mutex`, following the teacher's single-writer-task instinct
//! (`broker/registry.rs`'s lone `PodRegistry` owner) generalized to the
//! database connection: SQLite itself serializes writers, so a `Mutex`
//! around one `rusqlite::Connection` is the straightforward analogue,
//! with every operation dispatched via `spawn_blocking` so the async
//! runtime's worker threads are never blocked on disk I/O.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::{ErrorKind, FlowgenticError};
use crate::model::{
    EventType, Project, Session, SessionEvent, SessionStatus, Task, TaskStatus, Thread, ThreadMode,
    Worker, WorkerPath,
};

const MIGRATIONS: &[(i32, &str)] = &[
    (1, include_str!("../../../migrations/0001_init.sql")),
    (2, include_str!("../../../migrations/0002_session_idempotency.sql")),
];

/// Shared handle to the session store's database connection.
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    /// Open (creating if absent) the SQLite database at `path` and apply
    /// any migrations newer than its `PRAGMA user_version`.
    pub fn open(path: &Path) -> Result<Self, FlowgenticError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| FlowgenticError::internal(format!("creating db directory: {e}")))?;
        }
        let conn = Connection::open(path)
            .map_err(|e| FlowgenticError::internal(format!("opening database: {e}")))?;
        conn.pragma_update(None, "foreign_keys", "ON").map_err(FlowgenticError::from)?;
        Self::migrate(&conn)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Open an in-memory database, for tests.
    pub fn open_in_memory() -> Result<Self, FlowgenticError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| FlowgenticError::internal(format!("opening in-memory database: {e}")))?;
        conn.pragma_update(None, "foreign_keys", "ON").map_err(FlowgenticError::from)?;
        Self::migrate(&conn)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    fn migrate(conn: &Connection) -> Result<(), FlowgenticError> {
        let current: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))
            .map_err(FlowgenticError::from)?;
        for (version, sql) in MIGRATIONS {
            if *version > current {
                conn.execute_batch(sql).map_err(FlowgenticError::from)?;
                conn.pragma_update(None, "user_version", version).map_err(FlowgenticError::from)?;
            }
        }
        Ok(())
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, FlowgenticError>
    where
        F: FnOnce(&Connection) -> Result<T, FlowgenticError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            f(&guard)
        })
        .await
        .map_err(|e| FlowgenticError::internal(format!("db task panicked: {e}")))?
    }

    // -- Worker ---------------------------------------------------------

    /// Seed or idempotently update a worker from configuration (spec.md §3:
    /// "config drift updates URL/secret idempotently").
    pub async fn upsert_worker(&self, worker: Worker) -> Result<(), FlowgenticError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO workers (id, name, url, secret, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name, url = excluded.url, secret = excluded.secret,
                    updated_at = excluded.updated_at",
                params![
                    worker.id,
                    worker.name,
                    worker.url,
                    worker.secret,
                    crate::model::now_iso8601()
                ],
            )
            .map_err(FlowgenticError::from)?;
            Ok(())
        })
        .await
    }

    pub async fn get_worker(&self, id: &str) -> Result<Worker, FlowgenticError> {
        let id = id.to_owned();
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT id, name, url, secret, created_at, updated_at FROM workers WHERE id = ?1",
                params![id],
                row_to_worker,
            )
            .map_err(FlowgenticError::from)
        })
        .await
    }

    pub async fn list_workers(&self) -> Result<Vec<Worker>, FlowgenticError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, name, url, secret, created_at, updated_at FROM workers ORDER BY id")
                .map_err(FlowgenticError::from)?;
            let rows = stmt.query_map([], row_to_worker).map_err(FlowgenticError::from)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(FlowgenticError::from)
        })
        .await
    }

    // -- Project ---------------------------------------------------------

    pub async fn create_project(&self, project: Project) -> Result<(), FlowgenticError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO projects (id, display_name, default_agent, default_model, sort_index, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![
                    project.id,
                    project.display_name,
                    project.default_agent,
                    project.default_model,
                    project.sort_index,
                    crate::model::now_iso8601(),
                ],
            )
            .map_err(FlowgenticError::from)?;
            Ok(())
        })
        .await
    }

    pub async fn get_project(&self, id: &str) -> Result<Project, FlowgenticError> {
        let id = id.to_owned();
        self.with_conn(move |conn| {
            let mut project = conn
                .query_row(
                    "SELECT id, display_name, default_agent, default_model, sort_index, created_at, updated_at
                     FROM projects WHERE id = ?1",
                    params![id],
                    row_to_project,
                )
                .map_err(FlowgenticError::from)?;

            let mut stmt = conn
                .prepare("SELECT worker_id, path FROM worker_project_paths WHERE project_id = ?1")
                .map_err(FlowgenticError::from)?;
            let paths = stmt
                .query_map(params![project.id], |row| {
                    Ok(WorkerPath { worker_id: row.get(0)?, path: row.get(1)? })
                })
                .map_err(FlowgenticError::from)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(FlowgenticError::from)?;
            project.worker_paths = paths;
            Ok(project)
        })
        .await
    }

    /// Deletion cascades to threads (spec.md §3).
    pub async fn delete_project(&self, id: &str) -> Result<(), FlowgenticError> {
        let id = id.to_owned();
        self.with_conn(move |conn| {
            let changed =
                conn.execute("DELETE FROM projects WHERE id = ?1", params![id]).map_err(FlowgenticError::from)?;
            if changed == 0 {
                return Err(FlowgenticError::not_found(format!("project {id} not found")));
            }
            Ok(())
        })
        .await
    }

    /// Resolve (project × worker) -> absolute path, falling back to the
    /// project's embedded-worker path if no per-worker entry exists
    /// (spec.md §4.2 `GetCwdForSession`).
    pub async fn get_cwd_for_project_worker(
        &self,
        project_id: &str,
        worker_id: &str,
    ) -> Result<Option<String>, FlowgenticError> {
        let project_id = project_id.to_owned();
        let worker_id = worker_id.to_owned();
        self.with_conn(move |conn| {
            let specific: Option<String> = conn
                .query_row(
                    "SELECT path FROM worker_project_paths WHERE project_id = ?1 AND worker_id = ?2",
                    params![project_id, worker_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(FlowgenticError::from)?;
            if specific.is_some() {
                return Ok(specific);
            }
            conn.query_row(
                "SELECT path FROM worker_project_paths WHERE project_id = ?1 AND worker_id = 'embedded'",
                params![project_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(FlowgenticError::from)
        })
        .await
    }

    // -- Thread -----------------------------------------------------------

    pub async fn create_thread(&self, thread: Thread) -> Result<(), FlowgenticError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO threads (id, project_id, mode, topic, plan, archived, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    thread.id,
                    thread.project_id,
                    thread.mode.to_string(),
                    thread.topic,
                    thread.plan,
                    thread.archived,
                    crate::model::now_iso8601(),
                ],
            )
            .map_err(FlowgenticError::from)?;
            Ok(())
        })
        .await
    }

    pub async fn get_thread(&self, id: &str) -> Result<Thread, FlowgenticError> {
        let id = id.to_owned();
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT id, project_id, mode, topic, plan, archived, created_at, updated_at
                 FROM threads WHERE id = ?1",
                params![id],
                row_to_thread,
            )
            .map_err(FlowgenticError::from)
        })
        .await
    }

    pub async fn list_threads_by_project(&self, project_id: &str) -> Result<Vec<Thread>, FlowgenticError> {
        let project_id = project_id.to_owned();
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, project_id, mode, topic, plan, archived, created_at, updated_at
                     FROM threads WHERE project_id = ?1 ORDER BY created_at",
                )
                .map_err(FlowgenticError::from)?;
            let rows = stmt.query_map(params![project_id], row_to_thread).map_err(FlowgenticError::from)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(FlowgenticError::from)
        })
        .await
    }

    /// `SetTopic(S, t)` updates the owning thread's topic column directly
    /// (spec.md §4.8, §4.9).
    pub async fn set_thread_topic(&self, thread_id: &str, topic: &str) -> Result<(), FlowgenticError> {
        if topic.chars().count() > crate::model::MAX_TOPIC_LEN {
            return Err(FlowgenticError::invalid_argument(format!(
                "topic exceeds {} characters",
                crate::model::MAX_TOPIC_LEN
            )));
        }
        let thread_id = thread_id.to_owned();
        let topic = topic.to_owned();
        self.with_conn(move |conn| {
            let changed = conn
                .execute(
                    "UPDATE threads SET topic = ?1, updated_at = ?2 WHERE id = ?3",
                    params![topic, crate::model::now_iso8601(), thread_id],
                )
                .map_err(FlowgenticError::from)?;
            if changed == 0 {
                return Err(FlowgenticError::not_found(format!("thread {thread_id} not found")));
            }
            Ok(())
        })
        .await
    }

    /// `ArchiveThread(S)` sets the thread archived, hiding it from default
    /// listings without deleting its history (spec.md §4.8).
    pub async fn archive_thread(&self, thread_id: &str) -> Result<(), FlowgenticError> {
        let thread_id = thread_id.to_owned();
        self.with_conn(move |conn| {
            let changed = conn
                .execute(
                    "UPDATE threads SET archived = 1, updated_at = ?1 WHERE id = ?2",
                    params![crate::model::now_iso8601(), thread_id],
                )
                .map_err(FlowgenticError::from)?;
            if changed == 0 {
                return Err(FlowgenticError::not_found(format!("thread {thread_id} not found")));
            }
            Ok(())
        })
        .await
    }

    pub async fn set_thread_plan(&self, thread_id: &str, plan: &str) -> Result<(), FlowgenticError> {
        let thread_id = thread_id.to_owned();
        let plan = plan.to_owned();
        self.with_conn(move |conn| {
            let changed = conn
                .execute(
                    "UPDATE threads SET plan = ?1, updated_at = ?2 WHERE id = ?3",
                    params![plan, crate::model::now_iso8601(), thread_id],
                )
                .map_err(FlowgenticError::from)?;
            if changed == 0 {
                return Err(FlowgenticError::not_found(format!("thread {thread_id} not found")));
            }
            Ok(())
        })
        .await
    }

    // -- Task ---------------------------------------------------------------

    pub async fn create_task(&self, task: Task) -> Result<(), FlowgenticError> {
        self.with_conn(move |conn| {
            let subtasks_json =
                serde_json::to_string(&task.subtasks).map_err(|e| FlowgenticError::internal(e.to_string()))?;
            conn.execute(
                "INSERT INTO tasks (id, thread_id, description, subtasks, memory, status, sort_index, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
                params![
                    task.id,
                    task.thread_id,
                    task.description,
                    subtasks_json,
                    task.memory,
                    task.status.to_string(),
                    task.sort_index,
                    crate::model::now_iso8601(),
                ],
            )
            .map_err(FlowgenticError::from)?;
            Ok(())
        })
        .await
    }

    pub async fn update_task_status(&self, task_id: &str, status: TaskStatus) -> Result<(), FlowgenticError> {
        let task_id = task_id.to_owned();
        self.with_conn(move |conn| {
            let changed = conn
                .execute(
                    "UPDATE tasks SET status = ?1, updated_at = ?2 WHERE id = ?3",
                    params![status.to_string(), crate::model::now_iso8601(), task_id],
                )
                .map_err(FlowgenticError::from)?;
            if changed == 0 {
                return Err(FlowgenticError::not_found(format!("task {task_id} not found")));
            }
            Ok(())
        })
        .await
    }

    /// `ListTasksByThread` returns tasks ordered by `(sort_index, created_at)` (spec.md §4.9).
    pub async fn list_tasks_by_thread(&self, thread_id: &str) -> Result<Vec<Task>, FlowgenticError> {
        let thread_id = thread_id.to_owned();
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, thread_id, description, subtasks, memory, status, sort_index, created_at, updated_at
                     FROM tasks WHERE thread_id = ?1 ORDER BY sort_index, created_at",
                )
                .map_err(FlowgenticError::from)?;
            let rows = stmt.query_map(params![thread_id], row_to_task).map_err(FlowgenticError::from)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(FlowgenticError::from)
        })
        .await
    }

    // -- Session --------------------------------------------------------------

    pub async fn create_session(&self, session: Session) -> Result<(), FlowgenticError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO sessions (id, thread_id, task_id, worker_id, prompt, agent, model, mode, session_mode, agent_session_id, status, created_at, updated_at, idempotency_key)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12, ?13)",
                params![
                    session.id,
                    session.thread_id,
                    session.task_id,
                    session.worker_id,
                    session.prompt,
                    session.agent,
                    session.model,
                    session.mode,
                    session.session_mode,
                    session.agent_session_id,
                    session.status.to_string(),
                    crate::model::now_iso8601(),
                    session.idempotency_key,
                ],
            )
            .map_err(FlowgenticError::from)?;
            Ok(())
        })
        .await
    }

    pub async fn get_session(&self, id: &str) -> Result<Session, FlowgenticError> {
        let id = id.to_owned();
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT id, thread_id, task_id, worker_id, prompt, agent, model, mode, session_mode, agent_session_id, status, created_at, updated_at, idempotency_key
                 FROM sessions WHERE id = ?1",
                params![id],
                row_to_session,
            )
            .map_err(FlowgenticError::from)
        })
        .await
    }

    /// Looks up an existing session created under `thread_id` with the same
    /// client-supplied idempotency key, so a retried `CreateSession` resolves
    /// to the original row instead of creating a duplicate (spec.md §4.5).
    pub async fn find_session_by_idempotency_key(
        &self,
        thread_id: &str,
        key: &str,
    ) -> Result<Option<Session>, FlowgenticError> {
        let thread_id = thread_id.to_owned();
        let key = key.to_owned();
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT id, thread_id, task_id, worker_id, prompt, agent, model, mode, session_mode, agent_session_id, status, created_at, updated_at, idempotency_key
                 FROM sessions WHERE thread_id = ?1 AND idempotency_key = ?2",
                params![thread_id, key],
                row_to_session,
            )
            .optional()
            .map_err(FlowgenticError::from)
        })
        .await
    }

    pub async fn list_sessions_by_thread(&self, thread_id: &str) -> Result<Vec<Session>, FlowgenticError> {
        let thread_id = thread_id.to_owned();
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, thread_id, task_id, worker_id, prompt, agent, model, mode, session_mode, agent_session_id, status, created_at, updated_at, idempotency_key
                     FROM sessions WHERE thread_id = ?1 ORDER BY created_at",
                )
                .map_err(FlowgenticError::from)?;
            let rows = stmt.query_map(params![thread_id], row_to_session).map_err(FlowgenticError::from)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(FlowgenticError::from)
        })
        .await
    }

    /// `ListPendingSessions(limit)` — status = pending, oldest first (spec.md §4.2).
    pub async fn list_pending_sessions(&self, limit: u32) -> Result<Vec<Session>, FlowgenticError> {
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, thread_id, task_id, worker_id, prompt, agent, model, mode, session_mode, agent_session_id, status, created_at, updated_at, idempotency_key
                     FROM sessions WHERE status = 'pending' ORDER BY created_at, id LIMIT ?1",
                )
                .map_err(FlowgenticError::from)?;
            let rows = stmt.query_map(params![limit], row_to_session).map_err(FlowgenticError::from)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(FlowgenticError::from)
        })
        .await
    }

    /// Compare-and-set claim: only succeeds if the session is currently in
    /// `from`. Returns `Ok(true)` if the claim succeeded, `Ok(false)` if
    /// another reconciler iteration already claimed it (spec.md §4.4, §5,
    /// §8's "at most once" property).
    pub async fn claim_session(
        &self,
        session_id: &str,
        from: SessionStatus,
        to: SessionStatus,
    ) -> Result<bool, FlowgenticError> {
        let session_id = session_id.to_owned();
        self.with_conn(move |conn| {
            let changed = conn
                .execute(
                    "UPDATE sessions SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
                    params![to.to_string(), crate::model::now_iso8601(), session_id, from.to_string()],
                )
                .map_err(FlowgenticError::from)?;
            Ok(changed == 1)
        })
        .await
    }

    /// `UpdateSessionStatus(id, status, agent_session_id)` atomically sets
    /// both; `agent_session_id = None` leaves the column unchanged
    /// (spec.md §4.2). Idempotent when called twice with identical
    /// arguments (spec.md §8).
    pub async fn update_session_status(
        &self,
        session_id: &str,
        status: SessionStatus,
        agent_session_id: Option<&str>,
    ) -> Result<(), FlowgenticError> {
        let session_id = session_id.to_owned();
        let agent_session_id = agent_session_id.map(str::to_owned);
        self.with_conn(move |conn| {
            let changed = if let Some(aid) = agent_session_id {
                conn.execute(
                    "UPDATE sessions SET status = ?1, agent_session_id = ?2, updated_at = ?3 WHERE id = ?4",
                    params![status.to_string(), aid, crate::model::now_iso8601(), session_id],
                )
            } else {
                conn.execute(
                    "UPDATE sessions SET status = ?1, updated_at = ?2 WHERE id = ?3",
                    params![status.to_string(), crate::model::now_iso8601(), session_id],
                )
            }
            .map_err(FlowgenticError::from)?;
            if changed == 0 {
                return Err(FlowgenticError::not_found(format!("session {session_id} not found")));
            }
            Ok(())
        })
        .await
    }

    // -- Session events ------------------------------------------------------

    /// Serializes the append per session inside the single connection's
    /// write lock, assigning the next sequence (spec.md §4.1). Returns the
    /// assigned sequence.
    pub async fn append_event(
        &self,
        session_id: &str,
        event_type: EventType,
        payload: Vec<u8>,
    ) -> Result<u64, FlowgenticError> {
        let session_id = session_id.to_owned();
        self.with_conn(move |conn| {
            let next: i64 = conn
                .query_row(
                    "SELECT COALESCE(MAX(sequence), 0) + 1 FROM session_events WHERE session_id = ?1",
                    params![session_id],
                    |row| row.get(0),
                )
                .map_err(FlowgenticError::from)?;
            conn.execute(
                "INSERT INTO session_events (session_id, sequence, event_type, payload, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![session_id, next, event_type.to_string(), payload, crate::model::now_iso8601()],
            )
            .map_err(FlowgenticError::from)?;
            Ok(next as u64)
        })
        .await
    }

    /// `Replay(session_id, after_sequence)`: strict ascending order, no
    /// duplicates, no gaps (spec.md §4.1).
    pub async fn replay_events(
        &self,
        session_id: &str,
        after_sequence: u64,
    ) -> Result<Vec<SessionEvent>, FlowgenticError> {
        let session_id = session_id.to_owned();
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT session_id, sequence, event_type, payload, created_at
                     FROM session_events WHERE session_id = ?1 AND sequence > ?2 ORDER BY sequence",
                )
                .map_err(FlowgenticError::from)?;
            let rows = stmt
                .query_map(params![session_id, after_sequence as i64], row_to_event)
                .map_err(FlowgenticError::from)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(FlowgenticError::from)
        })
        .await
    }

    pub async fn replay_events_by_thread(
        &self,
        thread_id: &str,
        after_sequence: u64,
    ) -> Result<Vec<SessionEvent>, FlowgenticError> {
        let thread_id = thread_id.to_owned();
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT e.session_id, e.sequence, e.event_type, e.payload, e.created_at
                     FROM session_events e JOIN sessions s ON s.id = e.session_id
                     WHERE s.thread_id = ?1 AND e.sequence > ?2 ORDER BY e.session_id, e.sequence",
                )
                .map_err(FlowgenticError::from)?;
            let rows = stmt
                .query_map(params![thread_id, after_sequence as i64], row_to_event)
                .map_err(FlowgenticError::from)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(FlowgenticError::from)
        })
        .await
    }

    pub async fn replay_events_by_task(
        &self,
        task_id: &str,
        after_sequence: u64,
    ) -> Result<Vec<SessionEvent>, FlowgenticError> {
        let task_id = task_id.to_owned();
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT e.session_id, e.sequence, e.event_type, e.payload, e.created_at
                     FROM session_events e JOIN sessions s ON s.id = e.session_id
                     WHERE s.task_id = ?1 AND e.sequence > ?2 ORDER BY e.session_id, e.sequence",
                )
                .map_err(FlowgenticError::from)?;
            let rows = stmt
                .query_map(params![task_id, after_sequence as i64], row_to_event)
                .map_err(FlowgenticError::from)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(FlowgenticError::from)
        })
        .await
    }

    /// Highest sequence the store has durably persisted for `session_id`,
    /// used by the state-sync watcher to tell a reconnecting worker what
    /// to replay (spec.md §4.6).
    pub async fn max_sequence(&self, session_id: &str) -> Result<u64, FlowgenticError> {
        let session_id = session_id.to_owned();
        self.with_conn(move |conn| {
            let max: i64 = conn
                .query_row(
                    "SELECT COALESCE(MAX(sequence), 0) FROM session_events WHERE session_id = ?1",
                    params![session_id],
                    |row| row.get(0),
                )
                .map_err(FlowgenticError::from)?;
            Ok(max as u64)
        })
        .await
    }

    /// Delete events whose owning session is in a terminal status and was
    /// last updated before `cutoff` (ISO-8601 string; sorts lexicographically).
    /// Backs the retention pruner (DESIGN.md open question #2).
    pub async fn prune_events_for_sessions_updated_before(&self, cutoff: &str) -> Result<u64, FlowgenticError> {
        let cutoff = cutoff.to_owned();
        self.with_conn(move |conn| {
            let deleted = conn
                .execute(
                    "DELETE FROM session_events WHERE session_id IN (
                        SELECT id FROM sessions
                        WHERE status IN ('stopped', 'errored', 'failed') AND updated_at < ?1
                    )",
                    params![cutoff],
                )
                .map_err(FlowgenticError::from)?;
            Ok(deleted as u64)
        })
        .await
    }
}

fn row_to_worker(row: &rusqlite::Row) -> rusqlite::Result<Worker> {
    Ok(Worker {
        id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        secret: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn row_to_project(row: &rusqlite::Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        display_name: row.get(1)?,
        default_agent: row.get(2)?,
        default_model: row.get(3)?,
        worker_paths: Vec::new(),
        sort_index: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn row_to_thread(row: &rusqlite::Row) -> rusqlite::Result<Thread> {
    let mode_str: String = row.get(2)?;
    let mode = mode_str.parse::<ThreadMode>().unwrap_or(ThreadMode::SingleAgent);
    Ok(Thread {
        id: row.get(0)?,
        project_id: row.get(1)?,
        mode,
        topic: row.get(3)?,
        plan: row.get(4)?,
        archived: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    let subtasks_json: String = row.get(3)?;
    let subtasks: Vec<String> = serde_json::from_str(&subtasks_json).unwrap_or_default();
    let status_str: String = row.get(5)?;
    let status = status_str.parse::<TaskStatus>().unwrap_or(TaskStatus::Pending);
    Ok(Task {
        id: row.get(0)?,
        thread_id: row.get(1)?,
        description: row.get(2)?,
        subtasks,
        memory: row.get(4)?,
        status,
        sort_index: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn row_to_session(row: &rusqlite::Row) -> rusqlite::Result<Session> {
    let status_str: String = row.get(10)?;
    let status = status_str.parse::<SessionStatus>().unwrap_or(SessionStatus::Pending);
    Ok(Session {
        id: row.get(0)?,
        thread_id: row.get(1)?,
        task_id: row.get(2)?,
        worker_id: row.get(3)?,
        prompt: row.get(4)?,
        agent: row.get(5)?,
        model: row.get(6)?,
        mode: row.get(7)?,
        session_mode: row.get(8)?,
        agent_session_id: row.get(9)?,
        status,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
        idempotency_key: row.get(13)?,
    })
}

fn row_to_event(row: &rusqlite::Row) -> rusqlite::Result<SessionEvent> {
    let event_type_str: String = row.get(2)?;
    let event_type = event_type_str.parse::<EventType>().unwrap_or(EventType::UserMessage);
    let sequence: i64 = row.get(1)?;
    Ok(SessionEvent {
        session_id: row.get(0)?,
        sequence: sequence as u64,
        event_type,
        payload: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Generate a new UUIDv7 identifier (Session and Task ids per spec.md §3).
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
