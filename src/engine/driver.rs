//! Async driver: the single owner of the exchange state.
//!
//! One task receives every inbound message (from session readers and from
//! fired timers alike), applies it to the [`Exchange`], then drains the
//! outbound queues to the session layer and the market logs. Timed cancels
//! are scheduled here as sleep tasks that re-inject a synthesized
//! CancelOrder through the same channel, so expiry shares the client cancel
//! path end to end.

use super::{DeferredCancel, Exchange, SessionMessage};
use crate::journal::MarketJournal;
use crate::protocol::{InboundMessage, OutboundMessage};
use crate::server::SessionServer;
use crate::utils::MidnightClock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

/// Drive the exchange until the inbound channel closes.
///
/// `injector` must be a sender for the same channel `inbound` receives
/// from; it carries timer-fired cancels back into the engine.
pub async fn run(
    mut exchange: Exchange,
    server: Arc<SessionServer>,
    clock: MidnightClock,
    mut journal: MarketJournal,
    mut inbound: mpsc::UnboundedReceiver<SessionMessage>,
    injector: mpsc::UnboundedSender<SessionMessage>,
) {
    info!("engine driver started");
    while let Some(message) = inbound.recv().await {
        let timestamp = clock.nanoseconds_since_midnight();
        exchange.apply(message, timestamp);

        for deferred in exchange.take_deferred() {
            schedule_cancel(deferred, injector.clone());
        }
        for action in exchange.drain_actions() {
            journal.log_action(timestamp, &action);
        }
        for (session, reply) in exchange.drain_targeted() {
            server.send_targeted(session, &reply);
        }
        for outgoing in exchange.drain_broadcast() {
            if let OutboundMessage::Executed(executed) = &outgoing {
                journal.log_transaction(clock.nanoseconds_since_midnight(), executed);
            }
            server.send_broadcast(&outgoing);
        }
        journal.log_book(
            clock.nanoseconds_since_midnight(),
            exchange.book().snapshot(),
        );
    }
    info!("engine driver stopped");
}

fn schedule_cancel(deferred: DeferredCancel, injector: mpsc::UnboundedSender<SessionMessage>) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(u64::from(deferred.delay_secs))).await;
        let _ = injector.send(SessionMessage {
            session: deferred.session,
            message: InboundMessage::CancelOrder(deferred.cancel),
        });
    });
}
