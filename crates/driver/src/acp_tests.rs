// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

use super::*;
use serde_json::json;
use tokio::process::Command;

fn shell(script: &str) -> Child {
    Command::new("sh")
        .arg("-c")
        .arg(script)
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .expect("spawn sh")
}

#[tokio::test]
async fn call_resolves_with_the_agents_result() {
    let child = shell(
        r#"while IFS= read -r line; do printf '{"jsonrpc":"2.0","id":1,"result":{"echoed":true}}\n'; done"#,
    );
    let (tx, _rx) = mpsc::channel(8);
    let conn = AcpConnection::new(child, tx).unwrap();

    let result = conn.call("ping", json!({})).await.unwrap();
    assert_eq!(result, json!({"echoed": true}));
}

#[tokio::test]
async fn call_surfaces_a_remote_error() {
    let child = shell(
        r#"while IFS= read -r line; do printf '{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"nope"}}\n'; done"#,
    );
    let (tx, _rx) = mpsc::channel(8);
    let conn = AcpConnection::new(child, tx).unwrap();

    let err = conn.call("ping", json!({})).await.unwrap_err();
    match err {
        AcpError::Remote { code, message } => {
            assert_eq!(code, -32000);
            assert_eq!(message, "nope");
        }
        other => panic!("expected Remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn unsolicited_messages_are_delivered_as_notifications() {
    let child = shell(r#"printf '{"jsonrpc":"2.0","method":"sessionUpdate","params":{"x":1}}\n'; cat >/dev/null"#);
    let (tx, mut rx) = mpsc::channel(8);
    let _conn = AcpConnection::new(child, tx).unwrap();

    let notification = rx.recv().await.expect("notification delivered");
    assert_eq!(notification.method, "sessionUpdate");
    assert_eq!(notification.params, json!({"x": 1}));
}

#[tokio::test]
async fn pending_calls_fail_when_the_process_exits_without_replying() {
    let child = shell("cat >/dev/null");
    let (tx, _rx) = mpsc::channel(8);
    let conn = AcpConnection::new(child, tx).unwrap();
    conn.kill().await.unwrap();

    let err = conn.call("ping", json!({})).await.unwrap_err();
    assert!(matches!(err, AcpError::ProcessExited));
}
