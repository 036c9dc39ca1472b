// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

use clap::Parser;
use flowgentic_agent_cli::Config;
use tracing::error;

#[tokio::main]
async fn main() {
    let config = Config::parse();

    if let Err(e) = config.validate() {
        eprintln!("error: {e}");
        std::process::exit(2);
    }

    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    if let Err(e) = flowgentic_agent_cli::repl::run(config).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}
