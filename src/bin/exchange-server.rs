//! Exchange server binary: binds the listening socket, wires the session
//! layer to the engine driver and runs until interrupted.

use cda_exchange::prelude::*;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ExchangeConfig::from_env();
    let listener = TcpListener::bind(config.listen_addr()).await?;
    info!("exchange listening on {}", listener.local_addr()?);

    let server = SessionServer::new();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    server.register_listener(inbound_tx.clone());
    tokio::spawn(Arc::clone(&server).serve(listener));

    let exchange = Exchange::new(Stock::new(&config.stock));
    let clock = MidnightClock::from_offset_hours(config.utc_offset_hours);
    let journal = MarketJournal::open(&config.log_dir);
    let engine = tokio::spawn(run(
        exchange,
        Arc::clone(&server),
        clock,
        journal,
        inbound_rx,
        inbound_tx,
    ));

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    engine.abort();
    Ok(())
}
