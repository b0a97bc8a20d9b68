use std::{net::SocketAddr, sync::Arc, time::Duration};

use clap::Parser;
use ledger_core::{CancelFlag, LedgerEngine};
use ledger_node::{new_node_id, router, AppState, HttpChainFetcher, NodeArgs};
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = NodeArgs::parse();
    let node_id = new_node_id();

    let mut engine = LedgerEngine::new(args.engine_config(&node_id));
    for peer in &args.peers {
        engine.add_peer(peer)?;
    }
    let fetcher = HttpChainFetcher::new(Duration::from_secs(args.peer_timeout_secs))?;
    let state = AppState::new(engine, Arc::new(fetcher), node_id);
    let cancel = state.cancel.clone();
    let app = router(state.clone());

    let addr: SocketAddr = args.listen.parse()?;
    info!(node_id = %state.node_id, difficulty = args.difficulty, "ledger-node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal(cancel))
        .await?;
    info!("ledger-node stopped");
    Ok(())
}

/// Resolves on Ctrl-C and interrupts any proof search in flight.
async fn shutdown_signal(cancel: CancelFlag) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
    cancel.cancel();
}
