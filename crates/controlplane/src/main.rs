// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

use clap::Parser;
use flowgentic_controlplane::config::Config;
use flowgentic_controlplane::service::{
    EmbeddedWorkerServiceImpl, ProjectServiceImpl, SessionServiceImpl, TaskServiceImpl, ThreadServiceImpl,
    WorkerServiceImpl,
};
use flowgentic_controlplane::AppState;
use flowgentic_proto::controlplane::v1::embedded_worker_service_server::EmbeddedWorkerServiceServer;
use flowgentic_proto::controlplane::v1::project_service_server::ProjectServiceServer;
use flowgentic_proto::controlplane::v1::session_service_server::SessionServiceServer;
use flowgentic_proto::controlplane::v1::task_service_server::TaskServiceServer;
use flowgentic_proto::controlplane::v1::thread_service_server::ThreadServiceServer;
use flowgentic_proto::controlplane::v1::worker_service_server::WorkerServiceServer;
use flowgentic_registry::WorkerRegistry;
use flowgentic_store::db::Db;
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

/// Priority: `--log-level`/`FLOWGENTIC_LOG_LEVEL` > `RUST_LOG` > default "info".
/// Mirrors the teacher's `run.rs::init_tracing`.
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
    let db = Db::open(&config.db_path)?;
    let shutdown = CancellationToken::new();

    let seed_workers = db.list_workers().await?;
    let registry = WorkerRegistry::spawn(seed_workers, shutdown.child_token());
    let state = AppState::new(db, registry);

    {
        let state = state.clone();
        let shutdown = shutdown.child_token();
        tokio::spawn(async move { flowgentic_controlplane::reconciler::run(state, shutdown).await });
    }
    {
        let state = state.clone();
        let shutdown = shutdown.child_token();
        tokio::spawn(async move { flowgentic_controlplane::statesync::run(state, shutdown).await });
    }
    if config.retention_days > 0 {
        let db = state.db.clone();
        let shutdown = shutdown.child_token();
        let retention = std::time::Duration::from_secs(u64::from(config.retention_days) * 24 * 3600);
        tokio::spawn(async move { flowgentic_store::retention::run(db, retention, shutdown).await });
    }

    let addr = config.listen_addr.parse()?;
    info!(%addr, "control plane listening");

    let auth_token = config.auth_token.clone();
    let interceptor = move |req: tonic::Request<()>| -> Result<tonic::Request<()>, tonic::Status> {
        flowgentic_registry::auth::validate_bearer(req.metadata(), auth_token.as_deref())?;
        Ok(req)
    };

    let server = Server::builder()
        .layer(tonic::service::interceptor(interceptor))
        .add_service(SessionServiceServer::new(SessionServiceImpl { state: state.clone() }))
        .add_service(ThreadServiceServer::new(ThreadServiceImpl { state: state.clone() }))
        .add_service(TaskServiceServer::new(TaskServiceImpl { state: state.clone() }))
        .add_service(ProjectServiceServer::new(ProjectServiceImpl { state: state.clone() }))
        .add_service(WorkerServiceServer::new(WorkerServiceImpl { state: state.clone() }))
        .add_service(EmbeddedWorkerServiceServer::new(EmbeddedWorkerServiceImpl { state: state.clone() }))
        .serve_with_shutdown(addr, shutdown.clone().cancelled_owned());

    tokio::spawn(signal_handler(shutdown));

    server.await?;
    info!("control plane stopped");
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
