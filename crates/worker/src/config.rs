// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

//! Process configuration, mirroring `flowgentic_controlplane::config`'s
//! `clap::Parser` + `validate()` shape.

use clap::Parser;

/// Flowgentic worker: hosts one or more vendor agent subprocesses and
/// exposes them to the control plane over gRPC.
#[derive(Debug, Parser)]
#[command(name = "flowgentic-worker", version, about)]
pub struct Config {
    /// Address to bind the gRPC server to.
    #[arg(long, env = "FLOWGENTIC_LISTEN_ADDR", default_value = "0.0.0.0:7421")]
    pub listen_addr: String,

    /// Bearer token the control plane (and agent-subprocess callbacks)
    /// must present. Unset disables auth, appropriate only for local
    /// development.
    #[arg(long, env = "FLOWGENTIC_AUTH_TOKEN")]
    pub auth_token: Option<String>,

    /// Log format (json or text).
    #[arg(long, env = "FLOWGENTIC_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "FLOWGENTIC_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            anyhow::bail!("--listen-addr must be a valid socket address, got {}", self.listen_addr);
        }
        match self.log_format.as_str() {
            "json" | "text" => {}
            other => anyhow::bail!("--log-format must be 'json' or 'text', got {other}"),
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
