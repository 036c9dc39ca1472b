// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

use super::*;

fn base() -> Config {
    Config {
        listen_addr: "0.0.0.0:7421".into(),
        auth_token: None,
        log_format: "text".into(),
        log_level: "info".into(),
    }
}

#[test]
fn valid_config_passes() {
    assert!(base().validate().is_ok());
}

#[test]
fn rejects_a_malformed_listen_addr() {
    let mut config = base();
    config.listen_addr = "not-an-addr".into();
    assert!(config.validate().is_err());
}

#[test]
fn rejects_an_unknown_log_format() {
    let mut config = base();
    config.log_format = "xml".into();
    assert!(config.validate().is_err());
}
