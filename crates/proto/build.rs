// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tonic_prost_build::configure().build_server(true).build_client(true).compile_protos(
        &[
            "../../proto/controlplane/v1/session.proto",
            "../../proto/controlplane/v1/thread.proto",
            "../../proto/controlplane/v1/task.proto",
            "../../proto/controlplane/v1/project.proto",
            "../../proto/controlplane/v1/worker.proto",
            "../../proto/controlplane/v1/embedded_worker.proto",
            "../../proto/worker/v1/session.proto",
            "../../proto/worker/v1/agent.proto",
            "../../proto/worker/v1/hook.proto",
        ],
        &["../../proto"],
    )?;

    println!("cargo:rerun-if-changed=../../proto");

    Ok(())
}
