// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

//! Generated Connect/gRPC stubs for the control-plane and worker wire
//! protocols. Kept as a dedicated crate so that `flowgentic-store`,
//! `flowgentic-registry`, and `flowgentic-driver` can stay free of codegen
//! and so the `.proto` → Rust boundary is a single, auditable place.

pub mod controlplane {
    pub mod v1 {
        tonic::include_proto!("controlplane.v1");
    }
}

pub mod worker {
    pub mod v1 {
        tonic::include_proto!("worker.v1");
    }
}
