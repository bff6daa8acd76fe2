//! Order lifecycle: time-in-force expiry, system reset and replaces.

use cda_exchange::{
    CancelOrder, EnterOrder, Exchange, Firm, InboundMessage, OrderToken, OutboundMessage,
    ReplaceOrder, SessionMessage, Side, Stock, SystemStart,
};

const SESSION: u64 = 0;

fn enter_order(token: &str, side: Side, shares: u32, price: u32, time_in_force: u32) -> EnterOrder {
    EnterOrder {
        order_token: OrderToken::new(token),
        side,
        shares,
        stock: Stock::new("AMAZGOOG"),
        price,
        time_in_force,
        firm: Firm::new("FIRM"),
        display: b'Y',
        capacity: b'A',
        intermarket_sweep_eligibility: b'N',
        minimum_quantity: 1,
        cross_type: b'N',
        customer_type: b'R',
        midpoint_peg: b'N',
    }
}

fn enter(token: &str, side: Side, shares: u32, price: u32, time_in_force: u32) -> SessionMessage {
    SessionMessage {
        session: SESSION,
        message: InboundMessage::EnterOrder(enter_order(token, side, shares, price, time_in_force)),
    }
}

fn cancel(token: &str, shares: u32) -> SessionMessage {
    SessionMessage {
        session: SESSION,
        message: InboundMessage::CancelOrder(CancelOrder {
            order_token: OrderToken::new(token),
            shares,
        }),
    }
}

fn new_exchange() -> Exchange {
    Exchange::new(Stock::new("AMAZGOOG"))
}

#[test]
fn bounded_time_in_force_defers_a_full_cancel() {
    let mut exchange = new_exchange();
    exchange.apply(enter("B1", Side::Buy, 10, 50, 30), 1_000);

    let deferred = exchange.take_deferred();
    assert_eq!(deferred.len(), 1);
    assert_eq!(deferred[0].delay_secs, 30);
    assert_eq!(deferred[0].session, SESSION);
    assert_eq!(deferred[0].cancel.order_token, OrderToken::new("B1"));
    assert_eq!(deferred[0].cancel.shares, 0);

    // The order still rests until the timer fires.
    assert_eq!(exchange.book().bbo().best_bid, 50);
}

#[test]
fn sentinel_time_in_force_values_never_expire() {
    let mut exchange = new_exchange();
    exchange.apply(enter("B1", Side::Buy, 10, 50, 99_999), 1_000);
    exchange.apply(enter("B2", Side::Buy, 10, 49, 99_998), 1_100);

    assert!(exchange.take_deferred().is_empty());
}

#[test]
fn zero_time_in_force_never_rests() {
    let mut exchange = new_exchange();
    exchange.apply(enter("S1", Side::Sell, 10, 50, 0), 1_000);

    assert!(exchange.take_deferred().is_empty());
    assert!(exchange.book().is_empty());
    // The order is acknowledged and stored even though nothing rested.
    let broadcast = exchange.drain_broadcast();
    assert_eq!(broadcast.len(), 1);
    assert!(matches!(broadcast[0], OutboundMessage::Accepted(_)));
    assert!(exchange.store().contains(&OrderToken::new("S1")));
}

#[test]
fn zero_time_in_force_still_crosses_before_dropping() {
    let mut exchange = new_exchange();
    exchange.apply(enter("B1", Side::Buy, 10, 50, 99_999), 1_000);
    exchange.drain_broadcast();

    exchange.apply(enter("S1", Side::Sell, 15, 50, 0), 2_000);
    let broadcast = exchange.drain_broadcast();

    let executions: Vec<_> = broadcast
        .iter()
        .filter_map(|m| match m {
            OutboundMessage::Executed(e) => Some(*e),
            _ => None,
        })
        .collect();
    assert_eq!(executions.len(), 2);
    assert_eq!(executions[0].executed_shares, 10);
    // The 5 unmatched shares are dropped, not rested.
    assert!(exchange.book().is_empty());
}

#[test]
fn fired_timer_cancel_follows_the_client_cancel_path() {
    let mut exchange = new_exchange();
    exchange.apply(enter("B1", Side::Buy, 10, 50, 30), 1_000);
    exchange.drain_broadcast();
    let deferred = exchange.take_deferred().remove(0);

    // The driver would inject exactly this message when the timer fires.
    exchange.apply(
        SessionMessage {
            session: deferred.session,
            message: InboundMessage::CancelOrder(deferred.cancel),
        },
        31_000,
    );

    let broadcast = exchange.drain_broadcast();
    assert_eq!(broadcast.len(), 2);
    let OutboundMessage::Canceled(canceled) = broadcast[0] else {
        panic!("expected Canceled, got {:?}", broadcast[0]);
    };
    assert_eq!(canceled.decrement_shares, 10);
    assert!(!exchange.store().contains(&OrderToken::new("B1")));
    assert!(exchange.book().is_empty());
}

#[test]
fn cancel_of_unknown_token_is_silent() {
    let mut exchange = new_exchange();
    exchange.apply(cancel("GHOST", 0), 1_000);

    assert!(exchange.drain_broadcast().is_empty());
    assert!(exchange.drain_targeted().is_empty());
}

#[test]
fn full_cancel_of_executed_order_pops_the_record_silently() {
    let mut exchange = new_exchange();
    exchange.apply(enter("B1", Side::Buy, 10, 50, 99_999), 1_000);
    exchange.apply(enter("S1", Side::Sell, 10, 50, 99_999), 2_000);
    exchange.drain_broadcast();
    assert!(exchange.store().contains(&OrderToken::new("B1")));

    // A late cancel (say, a fired timer) finds nothing on the book: no
    // messages, but the store record is released and the token reusable.
    exchange.apply(cancel("B1", 0), 3_000);
    assert!(exchange.drain_broadcast().is_empty());
    assert!(!exchange.store().contains(&OrderToken::new("B1")));

    exchange.apply(enter("B1", Side::Buy, 5, 40, 99_999), 4_000);
    assert!(exchange.drain_targeted().is_empty());
    assert!(exchange.store().contains(&OrderToken::new("B1")));
}

#[test]
fn system_start_clears_state_and_acks_the_sender() {
    let mut exchange = new_exchange();
    exchange.apply(enter("B1", Side::Buy, 10, 50, 30), 1_000);
    exchange.drain_broadcast();
    let deferred = exchange.take_deferred().remove(0);

    exchange.apply(
        SessionMessage {
            session: SESSION,
            message: InboundMessage::SystemStart(SystemStart { event_code: b'S' }),
        },
        5_000,
    );

    assert!(exchange.book().is_empty());
    assert!(exchange.store().is_empty());
    assert!(exchange.drain_broadcast().is_empty());
    let targeted = exchange.drain_targeted();
    assert_eq!(targeted.len(), 1);
    let (session, OutboundMessage::SystemEvent(event)) = targeted[0] else {
        panic!("expected SystemEvent, got {:?}", targeted[0]);
    };
    assert_eq!(session, SESSION);
    assert_eq!(event.event_code, b'S');
    assert_eq!(event.timestamp, 5_000);

    // A timer scheduled before the reset fires into nothing.
    exchange.apply(
        SessionMessage {
            session: deferred.session,
            message: InboundMessage::CancelOrder(deferred.cancel),
        },
        31_000,
    );
    assert!(exchange.drain_broadcast().is_empty());
}

#[test]
fn replace_moves_remaining_shares_to_the_new_token() {
    let mut exchange = new_exchange();
    exchange.apply(enter("B1", Side::Buy, 10, 50, 99_999), 1_000);
    exchange.drain_broadcast();

    exchange.apply(
        SessionMessage {
            session: SESSION,
            message: InboundMessage::ReplaceOrder(ReplaceOrder {
                existing_order_token: OrderToken::new("B1"),
                replacement_order_token: OrderToken::new("B1R"),
                shares: 10,
                price: 52,
                time_in_force: 99_999,
                display: b'Y',
                intermarket_sweep_eligibility: b'N',
                minimum_quantity: 1,
            }),
        },
        2_000,
    );

    let targeted = exchange.drain_targeted();
    assert_eq!(targeted.len(), 1);
    let (session, OutboundMessage::Replaced(replaced)) = targeted[0] else {
        panic!("expected Replaced, got {:?}", targeted[0]);
    };
    assert_eq!(session, SESSION);
    assert_eq!(replaced.replacement_order_token, OrderToken::new("B1R"));
    assert_eq!(replaced.previous_order_token, OrderToken::new("B1"));
    assert_eq!(replaced.order_state, b'L');
    assert_eq!(replaced.shares, 10);
    assert_eq!(replaced.price, 52);
    assert_eq!(replaced.side, Side::Buy);

    let bbo = exchange.book().bbo();
    assert_eq!(bbo.best_bid, 52);
    assert_eq!(bbo.volume_at_best_bid, 10);
    assert!(exchange.store().contains(&OrderToken::new("B1R")));

    // The BBO move is broadcast.
    let broadcast = exchange.drain_broadcast();
    assert_eq!(broadcast.len(), 1);
    assert!(matches!(broadcast[0], OutboundMessage::BestBidAndOffer(_)));
}

#[test]
fn replace_accounts_for_prior_executions() {
    let mut exchange = new_exchange();
    exchange.apply(enter("B1", Side::Buy, 10, 50, 99_999), 1_000);
    exchange.apply(enter("S1", Side::Sell, 4, 50, 99_999), 2_000);
    exchange.drain_broadcast();

    // 6 shares rest; asking for 8 total means 8 - 10 = -2 against the
    // cancelled 6, leaving 4 liable.
    exchange.apply(
        SessionMessage {
            session: SESSION,
            message: InboundMessage::ReplaceOrder(ReplaceOrder {
                existing_order_token: OrderToken::new("B1"),
                replacement_order_token: OrderToken::new("B1R"),
                shares: 8,
                price: 50,
                time_in_force: 99_999,
                display: b'Y',
                intermarket_sweep_eligibility: b'N',
                minimum_quantity: 1,
            }),
        },
        3_000,
    );

    let targeted = exchange.drain_targeted();
    let (_, OutboundMessage::Replaced(replaced)) = targeted[0] else {
        panic!("expected Replaced, got {:?}", targeted[0]);
    };
    assert_eq!(replaced.shares, 4);
    assert_eq!(exchange.book().bbo().volume_at_best_bid, 4);
}

#[test]
fn replace_of_unknown_or_taken_token_is_silent() {
    let mut exchange = new_exchange();
    exchange.apply(enter("B1", Side::Buy, 10, 50, 99_999), 1_000);
    exchange.apply(enter("B2", Side::Buy, 10, 49, 99_999), 1_100);
    exchange.drain_broadcast();

    let replace = |existing: &str, replacement: &str| SessionMessage {
        session: SESSION,
        message: InboundMessage::ReplaceOrder(ReplaceOrder {
            existing_order_token: OrderToken::new(existing),
            replacement_order_token: OrderToken::new(replacement),
            shares: 10,
            price: 51,
            time_in_force: 99_999,
            display: b'Y',
            intermarket_sweep_eligibility: b'N',
            minimum_quantity: 1,
        }),
    };

    exchange.apply(replace("GHOST", "G1"), 2_000);
    exchange.apply(replace("B1", "B2"), 2_100);

    assert!(exchange.drain_targeted().is_empty());
    assert!(exchange.drain_broadcast().is_empty());
    assert_eq!(exchange.book().bbo().best_bid, 50);
}
