//! Authoritative per-order records.
//!
//! The store is the single source of truth for "does this token exist?".
//! The book holds only the resting subset; an order that traded instantly
//! or was entered non-resting still has a store entry until cancelled.

use crate::protocol::{EnterOrder, OrderToken, OutboundMessage};
use std::collections::HashMap;
use tracing::trace;

/// Full lifecycle record of one order.
#[derive(Debug, Clone)]
pub struct OrderEntry {
    /// The original submission. For replacements this is the synthesized
    /// successor order carrying the original's metadata.
    pub enter: EnterOrder,
    /// Server messages issued for this token, in emission order; the
    /// Accepted (or Replaced) comes first.
    pub history: Vec<OutboundMessage>,
    /// Shares executed so far, accumulated from Executed messages.
    pub executed_quantity: u32,
}

/// Token-keyed order registry.
#[derive(Debug, Default)]
pub struct OrderStore {
    orders: HashMap<OrderToken, OrderEntry>,
}

impl OrderStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new order under `order_token`.
    ///
    /// Returns false without touching the store when the token is already
    /// present; the caller must reject the submission.
    pub fn store_order(&mut self, order_token: OrderToken, enter: EnterOrder) -> bool {
        if self.orders.contains_key(&order_token) {
            return false;
        }
        self.orders.insert(
            order_token,
            OrderEntry {
                enter,
                history: Vec::new(),
                executed_quantity: 0,
            },
        );
        true
    }

    /// Append a server message to the order's history.
    ///
    /// An [`OutboundMessage::Executed`] also advances the running
    /// `executed_quantity`. Messages for unknown tokens are dropped.
    pub fn add_to_order(&mut self, order_token: OrderToken, message: OutboundMessage) {
        let Some(entry) = self.orders.get_mut(&order_token) else {
            trace!("no store entry for {}, message dropped", order_token);
            return;
        };
        if let OutboundMessage::Executed(executed) = &message {
            entry.executed_quantity = entry
                .executed_quantity
                .saturating_add(executed.executed_shares);
        }
        entry.history.push(message);
    }

    /// Look up an order by token.
    pub fn get(&self, order_token: &OrderToken) -> Option<&OrderEntry> {
        self.orders.get(order_token)
    }

    /// True when the token has a live entry.
    pub fn contains(&self, order_token: &OrderToken) -> bool {
        self.orders.contains_key(order_token)
    }

    /// Remove an order record, returning it if present.
    pub fn remove(&mut self, order_token: &OrderToken) -> Option<OrderEntry> {
        self.orders.remove(order_token)
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.orders.clear();
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// True when no entries are live.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Executed, Firm, Side, Stock};

    fn enter(token: &str) -> EnterOrder {
        EnterOrder {
            order_token: OrderToken::new(token),
            side: Side::Buy,
            shares: 10,
            stock: Stock::new("AMAZGOOG"),
            price: 50,
            time_in_force: 99_999,
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

    #[test]
    fn test_duplicate_token_rejected() {
        let mut store = OrderStore::new();
        assert!(store.store_order(OrderToken::new("B1"), enter("B1")));
        assert!(!store.store_order(OrderToken::new("B1"), enter("B1")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_executed_messages_accumulate_quantity() {
        let mut store = OrderStore::new();
        let token = OrderToken::new("B1");
        store.store_order(token, enter("B1"));

        for shares in [4, 6] {
            store.add_to_order(
                token,
                OutboundMessage::Executed(Executed {
                    timestamp: 0,
                    order_token: token,
                    executed_shares: shares,
                    execution_price: 50,
                    liquidity_flag: b'?',
                    match_number: 0,
                    midpoint_peg: b'N',
                }),
            );
        }

        let entry = store.get(&token).unwrap();
        assert_eq!(entry.executed_quantity, 10);
        assert_eq!(entry.history.len(), 2);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut store = OrderStore::new();
        store.store_order(OrderToken::new("B1"), enter("B1"));
        store.store_order(OrderToken::new("B2"), enter("B2"));

        assert!(store.remove(&OrderToken::new("B1")).is_some());
        assert!(store.remove(&OrderToken::new("B1")).is_none());
        assert!(store.contains(&OrderToken::new("B2")));

        store.clear();
        assert!(store.is_empty());
    }
}
