// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

//! Worker registry and relay (C3): the control plane's copy-on-write view
//! of which workers exist and how to authenticate calls to them. Grounded
//! on the teacher's `broker/registry.rs::PodRegistry`, generalized from a
//! `RwLock<HashMap>` to an `ArcSwap<HashMap>` with a single writer task per
//! DESIGN.md, since the spec requires readers (the reconciler, the gRPC
//! services) to see an atomic, torn-free snapshot without blocking on a
//! lock held by a slow writer.

pub mod auth;
pub mod registry;

pub use registry::{WorkerRegistry, WorkerSnapshotError};
