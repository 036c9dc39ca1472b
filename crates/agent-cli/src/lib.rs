// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

//! Standalone agent REPL (spec.md §6): drives one vendor coding agent
//! directly over ACP, with no control plane in the loop. Grounded on
//! `flowgentic-driver`'s `Driver`/`Session` contract, the same contract
//! `flowgentic-worker` hosts behind gRPC.

pub mod config;
pub mod repl;

pub use config::Config;
