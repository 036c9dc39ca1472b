// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

//! Core domain types (§3 of the data model): Project, Worker, Thread,
//! Task, Session, and the immutable SessionEvent log entries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A lowercase DNS-label project identifier, `^[a-z]([-a-z0-9]*[a-z0-9])?$`, ≤ 63 chars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn parse(raw: &str) -> Result<Self, crate::error::FlowgenticError> {
        if raw.is_empty() || raw.len() > 63 {
            return Err(crate::error::FlowgenticError::invalid_argument(
                "project id must be 1-63 characters",
            ));
        }
        let valid = {
            let mut chars = raw.chars();
            let first_ok = chars.next().is_some_and(|c| c.is_ascii_lowercase());
            let rest_ok = raw.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
            let last_ok = !raw.ends_with('-');
            first_ok && rest_ok && last_ok
        };
        if !valid {
            return Err(crate::error::FlowgenticError::invalid_argument(
                "project id must match ^[a-z]([-a-z0-9]*[a-z0-9])?$",
            ));
        }
        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub display_name: String,
    pub default_agent: String,
    pub default_model: Option<String>,
    pub worker_paths: Vec<WorkerPath>,
    pub sort_index: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerPath {
    pub worker_id: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: String,
    pub name: String,
    pub url: String,
    pub secret: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadMode {
    SingleAgent,
    Orchestrated,
}

impl fmt::Display for ThreadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleAgent => f.write_str("single_agent"),
            Self::Orchestrated => f.write_str("orchestrated"),
        }
    }
}

impl std::str::FromStr for ThreadMode {
    type Err = crate::error::FlowgenticError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single_agent" => Ok(Self::SingleAgent),
            "orchestrated" => Ok(Self::Orchestrated),
            other => Err(crate::error::FlowgenticError::invalid_argument(format!(
                "unknown thread mode: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub project_id: String,
    pub mode: ThreadMode,
    pub topic: Option<String>,
    pub plan: Option<String>,
    pub archived: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Max length for a thread topic, enforced by `SetTopic` (spec.md §4.8, §8 scenario 6).
pub const MAX_TOPIC_LEN: usize = 140;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Done,
    Failed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = crate::error::FlowgenticError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "done" => Ok(Self::Done),
            "failed" => Ok(Self::Failed),
            other => {
                Err(crate::error::FlowgenticError::invalid_argument(format!("unknown task status: {other}")))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// UUIDv7 so sort-by-id is time-ordered.
    pub id: String,
    pub thread_id: String,
    pub description: String,
    pub subtasks: Vec<String>,
    pub memory: String,
    pub status: TaskStatus,
    pub sort_index: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Session lifecycle (spec.md §3):
/// `pending -> scheduling -> running <-> idle -> (stopping ->) stopped | errored`,
/// plus `failed` for reconciler dispatch failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Scheduling,
    Running,
    Idle,
    Stopping,
    Stopped,
    Errored,
    Failed,
}

impl SessionStatus {
    /// Whether `self -> next` is a legal transition per the state diagram.
    /// `running <-> idle` is the only permitted cycle; everything else is
    /// monotonic forward progress, matching spec.md §5's ordering guarantee.
    pub fn can_transition_to(self, next: Self) -> bool {
        use SessionStatus::*;
        match (self, next) {
            (a, b) if a == b => true,
            (Pending, Scheduling) => true,
            (Pending, Failed) => true,
            (Scheduling, Running) => true,
            (Scheduling, Failed) => true,
            (Running, Idle) | (Idle, Running) => true,
            (Running, Stopping) | (Idle, Stopping) => true,
            (Running, Errored) | (Idle, Errored) => true,
            (Stopping, Stopped) | (Stopping, Errored) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Scheduling => "scheduling",
            Self::Running => "running",
            Self::Idle => "idle",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Errored => "errored",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = crate::error::FlowgenticError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "scheduling" => Ok(Self::Scheduling),
            "running" => Ok(Self::Running),
            "idle" => Ok(Self::Idle),
            "stopping" => Ok(Self::Stopping),
            "stopped" => Ok(Self::Stopped),
            "errored" => Ok(Self::Errored),
            "failed" => Ok(Self::Failed),
            other => Err(crate::error::FlowgenticError::invalid_argument(format!(
                "unknown session status: {other}"
            ))),
        }
    }
}

impl SessionStatus {
    /// Statuses after which a session's events become eligible for
    /// pruning by the retention policy (DESIGN.md open question #2).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Errored | Self::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub thread_id: String,
    pub task_id: Option<String>,
    pub worker_id: String,
    pub prompt: String,
    pub agent: String,
    pub model: Option<String>,
    pub mode: String,
    pub session_mode: String,
    pub agent_session_id: Option<String>,
    pub status: SessionStatus,
    pub created_at: String,
    pub updated_at: String,
    pub idempotency_key: Option<String>,
}

/// The nine event types of the taxonomy (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    UserMessage,
    AgentMessageChunk,
    AgentThoughtChunk,
    ToolCall,
    ToolCallUpdate,
    StatusChange,
    Plan,
    CurrentModeUpdate,
    AvailableCommandsUpdate,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::UserMessage => "user_message",
            Self::AgentMessageChunk => "agent_message_chunk",
            Self::AgentThoughtChunk => "agent_thought_chunk",
            Self::ToolCall => "tool_call",
            Self::ToolCallUpdate => "tool_call_update",
            Self::StatusChange => "status_change",
            Self::Plan => "plan",
            Self::CurrentModeUpdate => "current_mode_update",
            Self::AvailableCommandsUpdate => "available_commands_update",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for EventType {
    type Err = crate::error::FlowgenticError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user_message" => Ok(Self::UserMessage),
            "agent_message_chunk" => Ok(Self::AgentMessageChunk),
            "agent_thought_chunk" => Ok(Self::AgentThoughtChunk),
            "tool_call" => Ok(Self::ToolCall),
            "tool_call_update" => Ok(Self::ToolCallUpdate),
            "status_change" => Ok(Self::StatusChange),
            "plan" => Ok(Self::Plan),
            "current_mode_update" => Ok(Self::CurrentModeUpdate),
            "available_commands_update" => Ok(Self::AvailableCommandsUpdate),
            other => {
                Err(crate::error::FlowgenticError::invalid_argument(format!("unknown event type: {other}")))
            }
        }
    }
}

/// `(session_id, sequence, event_type, payload, created_at)`, `UNIQUE(session_id, sequence)`.
/// Immutable once written; `sequence` starts at 1 and strictly increases by 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    pub session_id: String,
    pub sequence: u64,
    pub event_type: EventType,
    pub payload: Vec<u8>,
    pub created_at: String,
}

/// Current UTC time formatted as `YYYY-MM-DDTHH:MM:SS.sssZ` (spec.md §6).
pub fn now_iso8601() -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    let millis = now.as_millis() as u64;
    format_epoch_millis(millis)
}

/// Format epoch milliseconds as `YYYY-MM-DDTHH:MM:SS.sssZ` without pulling in a
/// date/time crate — this crate's only timestamp consumer is string storage
/// and string comparison (ISO-8601 sorts lexicographically), so a hand-rolled
/// civil-calendar conversion is enough.
pub fn format_epoch_millis(millis: u64) -> String {
    let secs = millis / 1000;
    let ms = millis % 1000;
    let days = secs / 86_400;
    let time_of_day = secs % 86_400;
    let (h, m, s) = (time_of_day / 3600, (time_of_day % 3600) / 60, time_of_day % 60);
    let (y, mo, d) = civil_from_days(days as i64);
    format!("{y:04}-{mo:02}-{d:02}T{h:02}:{m:02}:{s:02}.{ms:03}Z")
}

/// Howard Hinnant's `civil_from_days` algorithm, converting a day count
/// since the Unix epoch into a proleptic Gregorian (year, month, day).
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    (if m <= 2 { y + 1 } else { y }, m, d)
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
