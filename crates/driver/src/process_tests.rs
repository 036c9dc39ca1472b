// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

use super::*;

#[test]
fn current_process_is_alive() {
    assert!(is_process_alive(std::process::id()));
}

#[test]
fn an_implausible_pid_is_not_alive() {
    // PIDs this high do not exist on Linux (default pid_max is 32768 or
    // 4194304) or Windows; best-effort negative case.
    assert!(!is_process_alive(u32::MAX - 1));
}

#[cfg(unix)]
#[tokio::test]
async fn configure_orphan_kill_lets_the_child_spawn_normally() {
    let mut command = tokio::process::Command::new("true");
    configure_orphan_kill(&mut command);
    let status = command.status().await.unwrap();
    assert!(status.success());
}
