//! # CDA Exchange
//!
//! A simulated equities exchange: a continuous double auction (CDA)
//! matching engine behind a binary, header-prefixed session protocol
//! modeled on NASDAQ's OUCH/ITCH family.
//!
//! ## Architecture
//!
//! - **[`protocol`]** — the wire codec: one header byte per message type,
//!   fixed big-endian payloads, separate inbound and outbound namespaces.
//! - **[`orderbook`]** — the two-sided price-time-priority book. Incoming
//!   marketable orders sweep the opposite side at the resting price before
//!   any residual rests; the book never holds a crossed state.
//! - **[`engine`]** — the matching engine: an [`engine::Exchange`] value
//!   with one handler per inbound message type, an authoritative order
//!   store, and separate targeted and broadcast outbound queues. Orders
//!   with a bounded time-in-force are expired through the same cancel path
//!   clients use, via timer-injected CancelOrder messages.
//! - **[`server`]** — the TCP session layer: one reader and one writer task
//!   per session, even session ids, odd listener ids, and fan-out of
//!   broadcasts to every connected session.
//! - **[`journal`]** — append-only JSON-lines market logs (book history,
//!   executions, client actions).
//!
//! ## Concurrency model
//!
//! All engine state is owned by a single driver task ([`engine::run`]).
//! Session readers and fired timers funnel messages into it over one
//! channel; handlers are atomic, and every outbound message a handler
//! produces is queued before the next inbound message is processed. No
//! locks guard the book or the store — there is exactly one owner.
//!
//! ## Quick start
//!
//! ```no_run
//! use cda_exchange::prelude::*;
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ExchangeConfig::default();
//!     let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
//!     let server = SessionServer::new();
//!     let (tx, rx) = mpsc::unbounded_channel();
//!     server.register_listener(tx.clone());
//!     tokio::spawn(Arc::clone(&server).serve(listener));
//!     let exchange = Exchange::new(Stock::new(&config.stock));
//!     let clock = MidnightClock::from_offset_hours(config.utc_offset_hours);
//!     let journal = MarketJournal::open(&config.log_dir);
//!     cda_exchange::engine::run(exchange, server, clock, journal, rx, tx).await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod journal;
pub mod orderbook;
pub mod protocol;
pub mod server;

pub mod prelude;
pub mod utils;

pub use config::ExchangeConfig;
pub use engine::{ClientAction, DeferredCancel, Exchange, OrderEntry, OrderStore, SessionMessage};
pub use journal::MarketJournal;
pub use orderbook::{Bbo, BookEntry, BookSnapshot, CdaBook, Cross, EnterResult};
pub use protocol::{
    Accepted, BestBidAndOffer, CancelOrder, Canceled, EnterOrder, Executed, Firm, InboundMessage,
    InboundType, OrderToken, OutboundMessage, OutboundType, ProtocolError, RejectReason, Rejected,
    ReplaceOrder, Replaced, Side, Stock, SystemEvent, SystemStart,
};
pub use server::SessionServer;
pub use utils::MidnightClock;
