// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

//! Shared worker state, mirroring `flowgentic_controlplane::state::AppState`'s
//! one-struct-of-`Arc`-subsystems shape.

use std::sync::Arc;

use crate::session::SessionManager;

#[derive(Clone)]
pub struct WorkerState {
    pub sessions: Arc<SessionManager>,
    /// Shared secret required on every inbound RPC (control-plane relay
    /// calls and agent-subprocess callbacks alike). `None` disables auth.
    pub auth_token: Option<Arc<str>>,
}

impl WorkerState {
    pub fn new(auth_token: Option<String>) -> Self {
        Self { sessions: SessionManager::new(), auth_token: auth_token.map(Into::into) }
    }
}
