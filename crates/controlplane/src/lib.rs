// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

//! Control-plane process: C4 (reconciler), C5 (session/thread/task/
//! project/worker gRPC services), C6 (state-sync watcher). Grounded on
//! the teacher's `run.rs` (top-level runner shared by `main` and
//! integration tests, `init_tracing`) and `transport/grpc/mod.rs`
//! (service wiring, auth interceptor shape).

pub mod config;
pub mod convert;
pub mod reconciler;
pub mod service;
pub mod state;
pub mod statesync;

pub use state::AppState;
