// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

use super::*;

#[test]
fn load_parses_minimal_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flowgentic.json");
    std::fs::write(
        &path,
        r#"{
            "control_plane": {
                "port": 7420,
                "database_path": "/tmp/flowgentic.db",
                "workers": [{"id": "w1", "url": "http://10.0.0.1:7421", "secret": "s3cret"}]
            }
        }"#,
    )
    .unwrap();

    let cfg = load(&path).unwrap();
    assert_eq!(cfg.control_plane.port, 7420);
    assert_eq!(cfg.control_plane.workers.len(), 1);
    assert_eq!(cfg.control_plane.workers[0].id, "w1");
    assert!(!cfg.control_plane.embedded_worker.enabled);
}

#[test]
fn load_missing_file_is_invalid_argument() {
    let err = load(Path::new("/nonexistent/flowgentic.json")).unwrap_err();
    assert_eq!(err.kind, crate::error::ErrorKind::InvalidArgument);
}

#[test]
fn load_malformed_json_is_invalid_argument() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flowgentic.json");
    std::fs::write(&path, "{not json").unwrap();
    let err = load(&path).unwrap_err();
    assert_eq!(err.kind, crate::error::ErrorKind::InvalidArgument);
}
