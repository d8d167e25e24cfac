mod config;
mod history;
mod protocol;
mod routes;
mod services;
mod state;

use std::net::SocketAddr;
use std::process::ExitCode;

use tokio::net::TcpListener;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

use crate::config::{Config, ConfigError};
use crate::services::hub::HubHandle;

#[derive(Debug, thiserror::Error)]
enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: SocketAddr, source: std::io::Error },
    #[error("server failed: {0}")]
    Serve(#[source] std::io::Error),
    #[error("hub task failed: {0}")]
    HubTask(#[from] JoinError),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let result = match Config::from_env() {
        Ok(config) => run(config).await,
        Err(e) => Err(e.into()),
    };
    ExitCode::from(exit_status(&result))
}

/// Process exit status for a finished run; errors are logged here.
fn exit_status(result: &Result<(), ServerError>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            error!(error = %e, "chatroom exited with error");
            1
        }
    }
}

async fn run(config: Config) -> Result<(), ServerError> {
    let addr = config.addr();

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    let (hub, hub_task) = HubHandle::spawn(config.hub_queue_capacity);
    let app = routes::app(state::AppState::new(hub.clone(), config));

    info!(%addr, "chatroom listening");
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(hub.clone()))
        .await
        .map_err(ServerError::Serve);

    hub.shutdown().await;
    let joined = join_hub(hub_task).await;
    served?;
    joined?;
    info!("chatroom stopped");
    Ok(())
}

/// Wait for the hub task to finish; a panic or cancellation is an error.
async fn join_hub(task: JoinHandle<()>) -> Result<(), ServerError> {
    task.await.map_err(|e| {
        error!(error = %e, "hub task did not finish cleanly");
        ServerError::HubTask(e)
    })
}

/// Wait for Ctrl-C or SIGTERM, then stop the hub so open sockets close.
async fn shutdown_signal(hub: HubHandle) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    if let Ok(stats) = hub.stats().await {
        info!(clients = stats.clients, messages = stats.messages, "shutdown requested");
    }
    hub.shutdown().await;
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
