// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

//! Configuration loading (spec.md §6). The schema is a JSON file read from
//! `FLOWGENTIC_CONFIG` (default `flowgentic.json`); each binary also
//! accepts a thin `clap` overlay for the listen address, following the
//! teacher's `#[arg(long, env = "...")]` convention.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::FlowgenticError;

/// The on-disk JSON config schema (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub control_plane: ControlPlaneConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlPlaneConfig {
    pub port: u16,
    pub database_path: String,
    #[serde(default)]
    pub workers: Vec<WorkerConfig>,
    #[serde(default)]
    pub embedded_worker: EmbeddedWorkerConfig,
    #[serde(default)]
    pub tailscale: TailscaleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub id: String,
    pub url: String,
    pub secret: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddedWorkerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TailscaleConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub https: bool,
}

/// Default config file name, relative to the current directory, used
/// when `FLOWGENTIC_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "flowgentic.json";

/// Resolve the config file path from `FLOWGENTIC_CONFIG`, falling back to
/// [`DEFAULT_CONFIG_FILE`].
pub fn config_path() -> PathBuf {
    std::env::var("FLOWGENTIC_CONFIG").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Load and parse the config file at `path`.
pub fn load(path: &Path) -> Result<FileConfig, FlowgenticError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        FlowgenticError::invalid_argument(format!("reading config {}: {e}", path.display()))
    })?;
    serde_json::from_str(&raw)
        .map_err(|e| FlowgenticError::invalid_argument(format!("parsing config {}: {e}", path.display())))
}

/// Resolve `~/.flowgentic/flowgentic.db` (spec.md §6's default persisted-state path).
pub fn default_database_path() -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    home.join(".flowgentic").join("flowgentic.db")
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
