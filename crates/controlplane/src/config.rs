// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

//! Process configuration. Grounded on the teacher's `config.rs` (one
//! `clap::Parser` struct with `--flag`/`env` pairs and a `validate()`
//! pass run once at startup).

use std::path::PathBuf;

use clap::Parser;

/// Flowgentic control plane: reconciles sessions onto workers and serves
/// the project/thread/task/session/worker gRPC API.
#[derive(Debug, Parser)]
#[command(name = "flowgentic-control-plane", version, about)]
pub struct Config {
    /// Address to bind the gRPC server to.
    #[arg(long, env = "FLOWGENTIC_LISTEN_ADDR", default_value = "0.0.0.0:7420")]
    pub listen_addr: String,

    /// Path to the SQLite database file.
    #[arg(long, env = "FLOWGENTIC_DB_PATH", default_value = "flowgentic.db")]
    pub db_path: PathBuf,

    /// Bearer token required on every incoming RPC. Unset disables auth,
    /// which is only appropriate for local development.
    #[arg(long, env = "FLOWGENTIC_AUTH_TOKEN")]
    pub auth_token: Option<String>,

    /// Log format (json or text).
    #[arg(long, env = "FLOWGENTIC_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "FLOWGENTIC_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Retention cutoff, in days, after which a terminal session's events
    /// become eligible for pruning. 0 disables the pruner.
    #[arg(long, env = "FLOWGENTIC_RETENTION_DAYS", default_value = "30")]
    pub retention_days: u32,
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
