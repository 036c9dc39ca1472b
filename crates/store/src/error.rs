// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unified error kinds shared across the control plane, the worker, and
/// every transport that sits in front of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    Unauthenticated,
    Unavailable,
    Internal,
    FailedPrecondition,
    Aborted,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::NotFound => "not_found",
            Self::Unauthenticated => "unauthenticated",
            Self::Unavailable => "unavailable",
            Self::Internal => "internal",
            Self::FailedPrecondition => "failed_precondition",
            Self::Aborted => "aborted",
        }
    }

    /// Whether an occurrence of this kind should be logged at `error`
    /// level (vs. just reported to the caller). Per spec.md §7: only
    /// `internal` is logged as error; `unavailable` logs at warn;
    /// everything else is reported without a log line.
    pub fn log_level(&self) -> Option<tracing::Level> {
        match self {
            Self::Internal => Some(tracing::Level::ERROR),
            Self::Unavailable => Some(tracing::Level::WARN),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error surfaced from the store (or anything built on top of it) to
/// a transport layer, carrying both a machine-readable kind and a
/// human-readable message.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FlowgenticError {
    pub kind: ErrorKind,
    pub message: String,
}

impl FlowgenticError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn failed_precondition(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FailedPrecondition, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, message)
    }

    pub fn aborted(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Aborted, message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthenticated, message)
    }

    /// Emit the configured log line for this error's kind, if any.
    pub fn log(&self) {
        match self.kind.log_level() {
            Some(tracing::Level::ERROR) => tracing::error!(kind = %self.kind, "{}", self.message),
            Some(tracing::Level::WARN) => tracing::warn!(kind = %self.kind, "{}", self.message),
            _ => {}
        }
    }

    /// Convert this error into a [`tonic::Status`] with the given message.
    pub fn to_grpc_status(&self) -> tonic::Status {
        let code = match self.kind {
            ErrorKind::InvalidArgument => tonic::Code::InvalidArgument,
            ErrorKind::NotFound => tonic::Code::NotFound,
            ErrorKind::Unauthenticated => tonic::Code::Unauthenticated,
            ErrorKind::Unavailable => tonic::Code::Unavailable,
            ErrorKind::Internal => tonic::Code::Internal,
            ErrorKind::FailedPrecondition => tonic::Code::FailedPrecondition,
            ErrorKind::Aborted => tonic::Code::Aborted,
        };
        tonic::Status::new(code, self.message.clone())
    }
}

impl From<FlowgenticError> for tonic::Status {
    fn from(err: FlowgenticError) -> Self {
        err.log();
        err.to_grpc_status()
    }
}

impl From<rusqlite::Error> for FlowgenticError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => {
                Self::new(ErrorKind::NotFound, "row not found")
            }
            rusqlite::Error::SqliteFailure(ref sqlite_err, _)
                if sqlite_err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::new(ErrorKind::InvalidArgument, format!("constraint violation: {err}"))
            }
            other => Self::new(ErrorKind::Internal, format!("storage error: {other}")),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
