//! Process entry point: boots a node, serves until SIGTERM, drains
//! in-flight requests, and exits per `spec.md` §6.

use node::config::Config;
use node::server::Server;
use node::NodeContext;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(err) = run().await {
        tracing::error!(error = %err, "fatal boot error");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let ctx = NodeContext::bootstrap(&config).await?;
    // Bound before we start waiting on signals, so a bind failure is a
    // fatal boot error (`spec.md` §6), not a silently-failed background task.
    let listener = Server::bind(&config.bind_addr).await?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let server_task = tokio::spawn(async move { ctx.server.serve(listener, shutdown_rx).await });

    wait_for_sigterm().await;
    tracing::info!("signal received, draining outstanding requests");
    let _ = shutdown_tx.send(true);

    match server_task.await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::error!(error = %err, "server loop exited with error"),
        Err(err) => tracing::error!(error = %err, "server task panicked"),
    }

    Ok(())
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    let mut int = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
    tokio::select! {
        _ = term.recv() => {}
        _ = int.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    let _ = tokio::signal::ctrl_c().await;
}
