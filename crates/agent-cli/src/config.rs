// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

//! Process configuration. Grounded on the teacher's `config.rs` (one
//! `clap::Parser` struct, a `validate()` pass run once at startup) —
//! simplified here to positional/flag CLI args only, since this binary
//! drives a single local agent subprocess rather than a server.

use clap::Parser;

/// Interactive REPL that drives one vendor coding agent directly,
/// bypassing the control plane entirely (spec.md §6's agent CLI).
#[derive(Debug, Parser)]
#[command(name = "flowgentic-agent-cli", version, about)]
pub struct Config {
    /// Agent vendor to launch (claude-code, codex, opencode, gemini).
    #[arg(long)]
    pub agent: String,

    /// Working directory for the agent subprocess.
    #[arg(long, default_value = ".")]
    pub cwd: String,

    /// Session mode (code, plan, ask).
    #[arg(long, default_value = "code")]
    pub mode: String,

    /// Model override, if the vendor supports one.
    #[arg(long)]
    pub model: Option<String>,

    /// System prompt override.
    #[arg(long)]
    pub system: Option<String>,

    /// Initial prompt. If omitted, the REPL prompts interactively for
    /// the first line before talking to the agent.
    pub prompt: Vec<String>,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.agent.trim().is_empty() {
            anyhow::bail!("--agent must not be empty");
        }
        match self.mode.as_str() {
            "code" | "plan" | "ask" => {}
            other => anyhow::bail!("--mode must be one of code/plan/ask, got {other}"),
        }
        Ok(())
    }

    /// Joins the positional prompt words into the initial prompt text.
    pub fn initial_prompt(&self) -> String {
        self.prompt.join(" ")
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
