// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

use clap::Parser;
use flowgentic_proto::worker::v1::agent_service_server::AgentServiceServer;
use flowgentic_proto::worker::v1::hook_service_server::HookServiceServer;
use flowgentic_proto::worker::v1::worker_session_service_server::WorkerSessionServiceServer;
use flowgentic_worker::config::Config;
use flowgentic_worker::service::{AgentServiceImpl, HookServiceImpl, WorkerSessionServiceImpl};
use flowgentic_worker::WorkerState;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let config = Config::parse();

    if let Err(e) = config.validate() {
        eprintln!("error: {e}");
        std::process::exit(2);
    }

    init_tracing(&config);

    if let Err(e) = run(config).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}

/// Mirrors `flowgentic_controlplane::main::init_tracing`'s env-filter
/// priority: explicit `--log-level`/`FLOWGENTIC_LOG_LEVEL` > `RUST_LOG` > default.
fn init_tracing(config: &Config) {
    use tracing_subscriber::fmt;

    let filter = if std::env::var("FLOWGENTIC_LOG_LEVEL").is_err() && config.log_level == "info" {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
    } else {
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let result = match config.log_format.as_str() {
        "json" => fmt::fmt().with_env_filter(filter).json().try_init(),
        _ => fmt::fmt().with_env_filter(filter).try_init(),
    };
    drop(result);
}

async fn run(config: Config) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();
    let state = WorkerState::new(config.auth_token.clone());

    let addr = config.listen_addr.parse()?;
    info!(%addr, "worker listening");

    let auth_token = config.auth_token.clone();
    let interceptor = move |req: tonic::Request<()>| -> Result<tonic::Request<()>, tonic::Status> {
        flowgentic_registry::auth::validate_bearer(req.metadata(), auth_token.as_deref())?;
        Ok(req)
    };

    let server = Server::builder()
        .layer(tonic::service::interceptor(interceptor))
        .add_service(WorkerSessionServiceServer::new(WorkerSessionServiceImpl { state: state.clone() }))
        .add_service(AgentServiceServer::new(AgentServiceImpl { state: state.clone() }))
        .add_service(HookServiceServer::new(HookServiceImpl { state: state.clone() }))
        .serve_with_shutdown(addr, shutdown.clone().cancelled_owned());

    tokio::spawn(signal_handler(shutdown));

    server.await?;
    info!("worker stopped");
    Ok(())
}

async fn signal_handler(shutdown: CancellationToken) {
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).ok();
    let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt()).ok();

    tokio::select! {
        _ = async {
            match sigterm.as_mut() {
                Some(s) => s.recv().await,
                None => std::future::pending().await,
            }
        } => info!("received SIGTERM"),
        _ = async {
            match sigint.as_mut() {
                Some(s) => s.recv().await,
                None => std::future::pending().await,
            }
        } => info!("received SIGINT"),
    }
    shutdown.cancel();
}
