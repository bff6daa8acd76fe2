//! The matching engine: one handler per inbound message type, orchestrating
//! the order store, the book and the outbound queues.
//!
//! [`Exchange`] is a plain value owned by a single driver task. Handlers are
//! synchronous and atomic: each one mutates state and enqueues every
//! resulting outbound message before the next inbound message is looked at.
//! The driver ([`run`]) drains the queues to the session layer after each
//! handler returns.

mod driver;
mod store;

pub use driver::run;
pub use store::{OrderEntry, OrderStore};

use crate::orderbook::{Bbo, CdaBook};
use crate::protocol::{
    Accepted, BestBidAndOffer, CancelOrder, Canceled, EnterOrder, Executed, InboundMessage,
    OrderToken, OutboundMessage, RejectReason, Rejected, ReplaceOrder, Replaced, Side, Stock,
    SystemEvent, SystemStart,
};
use std::collections::VecDeque;
use tracing::info;

use serde::Serialize;

/// Time-in-force value meaning "rest until cancelled".
pub const GOOD_TILL_CANCEL: u32 = 99_999;

/// True when this time in force asks for a timed cancellation: positive
/// and below the sentinel range.
fn schedules_expiry(time_in_force: u32) -> bool {
    time_in_force > 0 && time_in_force < 99_998
}

/// A decoded inbound message tagged with the session that sent it.
#[derive(Debug, Clone, Copy)]
pub struct SessionMessage {
    /// Even id of the originating session; timer-injected cancels reuse the
    /// id of the session that entered the order.
    pub session: u64,
    /// The decoded message.
    pub message: InboundMessage,
}

/// A cancellation the driver must schedule `delay_secs` in the future.
///
/// Fired cancels are re-injected as ordinary [`CancelOrder`] messages so
/// that timed expiry and client cancels share one code path.
#[derive(Debug, Clone, Copy)]
pub struct DeferredCancel {
    /// Seconds until the cancel fires.
    pub delay_secs: u32,
    /// Session tag for the synthesized message.
    pub session: u64,
    /// The cancel to inject (full cancel: target remainder 0).
    pub cancel: CancelOrder,
}

/// A client action worth recording in the action log.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ClientAction {
    /// `"place_limit_order"` or `"cancel_limit_order"`.
    pub action: &'static str,
    /// The message as received.
    pub message: InboundMessage,
}

/// The exchange core: store, book, counters and outbound queues.
pub struct Exchange {
    /// Symbol stamped on BBO broadcasts.
    stock: Stock,
    /// Authoritative token registry.
    store: OrderStore,
    /// The two-sided book.
    book: CdaBook,
    /// Next match number; both sides of a trade share one.
    next_match_number: u64,
    /// Next order reference number; odd, step 2.
    order_ref_numbers: u64,
    /// Replies addressed to one session (rejections, system acks, replaces).
    targeted: VecDeque<(u64, OutboundMessage)>,
    /// Messages for every session (accepts, executions, cancels, BBOs).
    broadcast: VecDeque<OutboundMessage>,
    /// Timed cancels awaiting scheduling by the driver.
    deferred: VecDeque<DeferredCancel>,
    /// Client actions awaiting the action log.
    actions: VecDeque<ClientAction>,
}

impl Exchange {
    /// Create an empty exchange for one symbol.
    pub fn new(stock: Stock) -> Self {
        Self {
            stock,
            store: OrderStore::new(),
            book: CdaBook::new(),
            next_match_number: 0,
            order_ref_numbers: 1,
            targeted: VecDeque::new(),
            broadcast: VecDeque::new(),
            deferred: VecDeque::new(),
            actions: VecDeque::new(),
        }
    }

    /// Process one inbound message. `timestamp` is nanoseconds since local
    /// midnight, stamped on every resulting outbound message.
    pub fn apply(&mut self, message: SessionMessage, timestamp: u64) {
        match message.message {
            InboundMessage::EnterOrder(enter) => {
                self.enter_order(message.session, enter, timestamp)
            }
            InboundMessage::CancelOrder(cancel) => {
                self.cancel_order(message.session, cancel, timestamp)
            }
            InboundMessage::ReplaceOrder(replace) => {
                self.replace_order(message.session, replace, timestamp)
            }
            InboundMessage::SystemStart(start) => {
                self.system_start(message.session, start, timestamp)
            }
        }
    }

    /// The order store, for inspection.
    pub fn store(&self) -> &OrderStore {
        &self.store
    }

    /// The book, for inspection.
    pub fn book(&self) -> &CdaBook {
        &self.book
    }

    /// Take every queued targeted reply, in emission order.
    pub fn drain_targeted(&mut self) -> Vec<(u64, OutboundMessage)> {
        self.targeted.drain(..).collect()
    }

    /// Take every queued broadcast message, in emission order.
    pub fn drain_broadcast(&mut self) -> Vec<OutboundMessage> {
        self.broadcast.drain(..).collect()
    }

    /// Take the cancels the last handler deferred.
    pub fn take_deferred(&mut self) -> Vec<DeferredCancel> {
        self.deferred.drain(..).collect()
    }

    /// Take the client actions recorded since the last drain.
    pub fn drain_actions(&mut self) -> Vec<ClientAction> {
        self.actions.drain(..).collect()
    }

    fn next_order_reference(&mut self) -> u64 {
        let reference = self.order_ref_numbers;
        self.order_ref_numbers += 2;
        reference
    }

    /// Enter a limit order: reject duplicates, schedule expiry, sweep the
    /// book, then emit Accepted, the Executed pairs and any BBO delta.
    fn enter_order(&mut self, session: u64, enter: EnterOrder, timestamp: u64) {
        let order_token = enter.order_token;
        if !self.store.store_order(order_token, enter) {
            info!("order {} already stored, rejected", order_token);
            self.targeted.push_back((
                session,
                OutboundMessage::Rejected(Rejected {
                    timestamp,
                    order_token,
                    reason: RejectReason::REPEAT_ID,
                    price: enter.price,
                    shares: enter.shares,
                }),
            ));
            return;
        }

        let enter_into_book = enter.time_in_force > 0;
        if schedules_expiry(enter.time_in_force) {
            self.deferred.push_back(DeferredCancel {
                delay_secs: enter.time_in_force,
                session,
                cancel: CancelOrder {
                    order_token,
                    shares: 0,
                },
            });
        }

        let result = match enter.side {
            Side::Buy => self
                .book
                .enter_buy(order_token, enter.price, enter.shares, enter_into_book),
            Side::Sell => self
                .book
                .enter_sell(order_token, enter.price, enter.shares, enter_into_book),
        };

        let accepted = OutboundMessage::Accepted(Accepted {
            timestamp,
            order_reference_number: self.next_order_reference(),
            order_state: b'L',
            bbo_weight_indicator: b' ',
            order: enter,
        });
        self.store.add_to_order(order_token, accepted);
        self.broadcast.push_back(accepted);

        for cross in result.crosses {
            self.process_cross(
                cross.incoming_token,
                cross.resting_token,
                cross.price,
                cross.shares,
                timestamp,
            );
        }

        if let Some(bbo) = result.bbo {
            self.push_bbo(bbo, timestamp);
        }

        self.actions.push_back(ClientAction {
            action: "place_limit_order",
            message: InboundMessage::EnterOrder(enter),
        });
    }

    /// Emit the paired Executed messages for one cross and record them on
    /// both store entries.
    fn process_cross(
        &mut self,
        incoming_token: OrderToken,
        resting_token: OrderToken,
        price: u32,
        shares: u32,
        timestamp: u64,
    ) {
        info!(
            "orders ({}, {}) crossed at price {}, volume {}",
            incoming_token, resting_token, price, shares
        );
        let match_number = self.next_match_number;
        self.next_match_number += 1;

        for order_token in [incoming_token, resting_token] {
            let midpoint_peg = self
                .store
                .get(&order_token)
                .map(|entry| entry.enter.midpoint_peg)
                .unwrap_or(b'N');
            let executed = OutboundMessage::Executed(Executed {
                timestamp,
                order_token,
                executed_shares: shares,
                execution_price: price,
                liquidity_flag: b'?',
                match_number,
                midpoint_peg,
            });
            self.store.add_to_order(order_token, executed);
            self.broadcast.push_back(executed);
        }
    }

    /// Cancel down to the requested remainder. Unknown tokens and orders
    /// already off the book are silent no-ops.
    fn cancel_order(&mut self, _session: u64, cancel: CancelOrder, timestamp: u64) {
        let Some(entry) = self.store.get(&cancel.order_token) else {
            info!("no such order to cancel, ignored: {}", cancel.order_token);
            return;
        };
        let enter = entry.enter;

        let (cancelled, bbo) =
            self.book
                .cancel_order(cancel.order_token, enter.price, cancel.shares, enter.side);

        // A full cancel pops the record even when nothing was resting; the
        // token becomes reusable once the order is gone.
        if cancel.shares == 0 {
            self.store.remove(&cancel.order_token);
        }

        if cancelled.is_empty() && bbo.is_none() {
            return;
        }

        for (order_token, decrement_shares) in cancelled {
            let canceled = OutboundMessage::Canceled(Canceled {
                timestamp,
                order_token,
                decrement_shares,
                reason: b'U',
                midpoint_peg: enter.midpoint_peg,
                price: enter.price,
                side: enter.side,
            });
            self.store.add_to_order(order_token, canceled);
            self.broadcast.push_back(canceled);
        }

        if let Some(bbo) = bbo {
            self.push_bbo(bbo, timestamp);
        }

        self.actions.push_back(ClientAction {
            action: "cancel_limit_order",
            message: InboundMessage::CancelOrder(cancel),
        });
    }

    /// Atomically cancel the existing order and enter its successor under
    /// the replacement token, inheriting queue-independent metadata.
    fn replace_order(&mut self, session: u64, replace: ReplaceOrder, timestamp: u64) {
        if !self.store.contains(&replace.existing_order_token) {
            info!(
                "existing token {} unknown, replace ignored",
                replace.existing_order_token
            );
            return;
        }
        if self.store.contains(&replace.replacement_order_token) {
            info!(
                "replacement token {} already used, replace ignored",
                replace.replacement_order_token
            );
            return;
        }
        let Some(existing) = self.store.get(&replace.existing_order_token) else {
            return;
        };
        let original = existing.enter;

        let (cancelled, bbo_post_cancel) = self.book.cancel_order(
            replace.existing_order_token,
            original.price,
            0,
            original.side,
        );
        let Some(&(_, amount_cancelled)) = cancelled.first() else {
            info!("nothing resting to replace for {}", replace.existing_order_token);
            return;
        };

        let shares_diff = i64::from(replace.shares) - i64::from(original.shares);
        let liable_shares = (i64::from(amount_cancelled) + shares_diff).max(0) as u32;
        if liable_shares == 0 {
            info!("no liable shares left to replace for {}", replace.existing_order_token);
            return;
        }

        let successor = EnterOrder {
            order_token: replace.replacement_order_token,
            side: original.side,
            shares: replace.shares,
            stock: original.stock,
            price: replace.price,
            time_in_force: replace.time_in_force,
            firm: original.firm,
            display: replace.display,
            capacity: original.capacity,
            intermarket_sweep_eligibility: replace.intermarket_sweep_eligibility,
            minimum_quantity: replace.minimum_quantity,
            cross_type: original.cross_type,
            customer_type: original.customer_type,
            midpoint_peg: original.midpoint_peg,
        };
        self.store
            .store_order(replace.replacement_order_token, successor);

        let enter_into_book = replace.time_in_force > 0;
        if schedules_expiry(replace.time_in_force) {
            self.deferred.push_back(DeferredCancel {
                delay_secs: replace.time_in_force,
                session,
                cancel: CancelOrder {
                    order_token: replace.replacement_order_token,
                    shares: 0,
                },
            });
        }

        let result = match original.side {
            Side::Buy => self.book.enter_buy(
                replace.replacement_order_token,
                replace.price,
                liable_shares,
                enter_into_book,
            ),
            Side::Sell => self.book.enter_sell(
                replace.replacement_order_token,
                replace.price,
                liable_shares,
                enter_into_book,
            ),
        };

        let replaced = OutboundMessage::Replaced(Replaced {
            timestamp,
            order_reference_number: self.next_order_reference(),
            order_state: if result.entered.is_some() { b'L' } else { b'D' },
            bbo_weight_indicator: b'*',
            replacement_order_token: replace.replacement_order_token,
            side: original.side,
            shares: liable_shares,
            stock: original.stock,
            price: replace.price,
            time_in_force: replace.time_in_force,
            firm: original.firm,
            display: replace.display,
            capacity: b'*',
            intermarket_sweep_eligibility: replace.intermarket_sweep_eligibility,
            minimum_quantity: replace.minimum_quantity,
            cross_type: b'*',
            previous_order_token: replace.existing_order_token,
            midpoint_peg: original.midpoint_peg,
        });
        self.store
            .add_to_order(replace.replacement_order_token, replaced);
        self.targeted.push_back((session, replaced));

        for cross in result.crosses {
            self.process_cross(
                cross.incoming_token,
                cross.resting_token,
                cross.price,
                cross.shares,
                timestamp,
            );
        }

        if let Some(bbo) = result.bbo.or(bbo_post_cancel) {
            self.push_bbo(bbo, timestamp);
        }
    }

    /// Discard every order and acknowledge the reset to the sender. Timers
    /// scheduled for pre-start orders become no-ops: their tokens no longer
    /// resolve.
    fn system_start(&mut self, session: u64, _start: SystemStart, timestamp: u64) {
        self.store.clear();
        self.book.reset_book();
        self.targeted.push_back((
            session,
            OutboundMessage::SystemEvent(SystemEvent {
                event_code: b'S',
                timestamp,
            }),
        ));
    }

    fn push_bbo(&mut self, bbo: Bbo, timestamp: u64) {
        self.broadcast
            .push_back(OutboundMessage::BestBidAndOffer(BestBidAndOffer {
                timestamp,
                stock: self.stock,
                best_bid: bbo.best_bid,
                volume_at_best_bid: bbo.volume_at_best_bid,
                best_ask: bbo.best_ask,
                volume_at_best_ask: bbo.volume_at_best_ask,
                next_bid: bbo.next_bid,
                next_ask: bbo.next_ask,
            }));
    }
}
