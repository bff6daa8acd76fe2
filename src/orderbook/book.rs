//! Core continuous double auction book: price-time priority matching over
//! two ordered sides.

use crate::protocol::{OrderToken, Side};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use tracing::trace;

/// One resting order inside a price level queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BookEntry {
    /// Token of the resting order.
    pub order_token: OrderToken,
    /// Shares still resting.
    pub shares: u32,
}

/// One trade produced while entering an order.
///
/// The price is always the resting order's price: a marketable incoming
/// order gets price improvement, never the resting side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cross {
    /// Token of the incoming (taker) order.
    pub incoming_token: OrderToken,
    /// Token of the resting (maker) order.
    pub resting_token: OrderToken,
    /// Execution price, in ticks.
    pub price: u32,
    /// Shares exchanged.
    pub shares: u32,
}

/// Top-of-book snapshot: best price and depth on each side, plus the
/// second-best price. 0 means "nothing at this depth".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Bbo {
    /// Highest bid price.
    pub best_bid: u32,
    /// Total shares at the best bid.
    pub volume_at_best_bid: u32,
    /// Lowest ask price.
    pub best_ask: u32,
    /// Total shares at the best ask.
    pub volume_at_best_ask: u32,
    /// Second-best bid price.
    pub next_bid: u32,
    /// Second-best ask price.
    pub next_ask: u32,
}

/// Outcome of entering an order into the book.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnterResult {
    /// Trades produced while sweeping the opposite side, in match order.
    pub crosses: Vec<Cross>,
    /// The residual that was left resting, if any.
    pub entered: Option<BookEntry>,
    /// The new top of book, present only when an observable field changed.
    pub bbo: Option<Bbo>,
}

/// Serializable depth dump of one price level, for the book log.
#[derive(Debug, Clone, Serialize)]
pub struct LevelSnapshot {
    /// Price of this level.
    pub price: u32,
    /// Total shares across the level.
    pub shares: u32,
    /// Resting orders in time priority.
    pub orders: Vec<BookEntry>,
}

/// Serializable dump of the whole book, best-first on both sides.
#[derive(Debug, Clone, Serialize)]
pub struct BookSnapshot {
    /// Bid levels, highest price first.
    pub bids: Vec<LevelSnapshot>,
    /// Ask levels, lowest price first.
    pub asks: Vec<LevelSnapshot>,
}

/// Two-sided limit order book with price-time priority.
///
/// Each side maps price to a FIFO queue of resting orders. Empty levels are
/// removed eagerly, and the book never holds a crossed state: incoming
/// marketable orders are fully matched before any residual rests.
#[derive(Debug, Default)]
pub struct CdaBook {
    /// Buy side; best bid is the highest key.
    bids: BTreeMap<u32, VecDeque<BookEntry>>,
    /// Sell side; best ask is the lowest key.
    asks: BTreeMap<u32, VecDeque<BookEntry>>,
}

impl CdaBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a buy order: sweep asks priced at or below `price`, then rest
    /// any residual at `price` when `resting` is set.
    ///
    /// Returns the crosses in match order, the residual entry (if one was
    /// left on the book) and the new BBO when it changed.
    pub fn enter_buy(
        &mut self,
        order_token: OrderToken,
        price: u32,
        shares: u32,
        resting: bool,
    ) -> EnterResult {
        let before = self.bbo();
        let (remaining, crosses) = self.sweep_asks(order_token, price, shares);
        let entered = if remaining > 0 && resting {
            let entry = BookEntry {
                order_token,
                shares: remaining,
            };
            self.bids.entry(price).or_default().push_back(entry);
            trace!("bid {} resting {} shares at {}", order_token, remaining, price);
            Some(entry)
        } else {
            None
        };
        EnterResult {
            crosses,
            entered,
            bbo: self.bbo_delta(before),
        }
    }

    /// Enter a sell order: sweep bids priced at or above `price`, then rest
    /// any residual at `price` when `resting` is set.
    pub fn enter_sell(
        &mut self,
        order_token: OrderToken,
        price: u32,
        shares: u32,
        resting: bool,
    ) -> EnterResult {
        let before = self.bbo();
        let (remaining, crosses) = self.sweep_bids(order_token, price, shares);
        let entered = if remaining > 0 && resting {
            let entry = BookEntry {
                order_token,
                shares: remaining,
            };
            self.asks.entry(price).or_default().push_back(entry);
            trace!("ask {} resting {} shares at {}", order_token, remaining, price);
            Some(entry)
        } else {
            None
        };
        EnterResult {
            crosses,
            entered,
            bbo: self.bbo_delta(before),
        }
    }

    /// Cancel a resting order down to `volume_remaining` shares.
    ///
    /// `volume_remaining` is the target amount to *leave* on the book, not
    /// the amount to remove; 0 removes the order entirely. A token that is
    /// not resting at `price` on `side` is a silent no-op — the order may
    /// have traded or expired already.
    pub fn cancel_order(
        &mut self,
        order_token: OrderToken,
        price: u32,
        volume_remaining: u32,
        side: Side,
    ) -> (Vec<(OrderToken, u32)>, Option<Bbo>) {
        let before = self.bbo();
        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        let Some(queue) = levels.get_mut(&price) else {
            return (Vec::new(), None);
        };
        let Some(position) = queue.iter().position(|e| e.order_token == order_token) else {
            return (Vec::new(), None);
        };
        let current = queue[position].shares;
        let removed = current.saturating_sub(volume_remaining);
        if removed == current {
            queue.remove(position);
        } else {
            queue[position].shares = current - removed;
        }
        if queue.is_empty() {
            levels.remove(&price);
        }
        trace!(
            "cancelled {} shares of {} at {} ({})",
            removed, order_token, price, side
        );
        (vec![(order_token, removed)], self.bbo_delta(before))
    }

    /// Remove every order from both sides.
    pub fn reset_book(&mut self) {
        self.bids.clear();
        self.asks.clear();
        trace!("book reset");
    }

    /// True when neither side holds any orders.
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Current top of book.
    pub fn bbo(&self) -> Bbo {
        let mut bids = self.bids.iter().rev();
        let (best_bid, volume_at_best_bid) = bids
            .next()
            .map(|(price, queue)| (*price, level_volume(queue)))
            .unwrap_or((0, 0));
        let next_bid = bids.next().map(|(price, _)| *price).unwrap_or(0);

        let mut asks = self.asks.iter();
        let (best_ask, volume_at_best_ask) = asks
            .next()
            .map(|(price, queue)| (*price, level_volume(queue)))
            .unwrap_or((0, 0));
        let next_ask = asks.next().map(|(price, _)| *price).unwrap_or(0);

        Bbo {
            best_bid,
            volume_at_best_bid,
            best_ask,
            volume_at_best_ask,
            next_bid,
            next_ask,
        }
    }

    /// Depth dump for the book log.
    pub fn snapshot(&self) -> BookSnapshot {
        let level = |(price, queue): (&u32, &VecDeque<BookEntry>)| LevelSnapshot {
            price: *price,
            shares: level_volume(queue),
            orders: queue.iter().copied().collect(),
        };
        BookSnapshot {
            bids: self.bids.iter().rev().map(level).collect(),
            asks: self.asks.iter().map(level).collect(),
        }
    }

    /// Match an incoming buy against asks priced at or below `limit`,
    /// consuming levels best-first and orders front-first. Depleted orders
    /// and levels are popped as they empty. Returns the unmatched remainder
    /// and the crosses produced.
    fn sweep_asks(
        &mut self,
        incoming_token: OrderToken,
        limit: u32,
        mut shares: u32,
    ) -> (u32, Vec<Cross>) {
        let mut crosses = Vec::new();
        while shares > 0 {
            let Some(mut level) = self.asks.first_entry() else {
                break;
            };
            let level_price = *level.key();
            if level_price > limit {
                break;
            }
            let queue = level.get_mut();
            if let Some(front) = queue.front_mut() {
                let volume = shares.min(front.shares);
                crosses.push(Cross {
                    incoming_token,
                    resting_token: front.order_token,
                    price: level_price,
                    shares: volume,
                });
                shares -= volume;
                front.shares -= volume;
                if front.shares == 0 {
                    queue.pop_front();
                }
            }
            if queue.is_empty() {
                level.remove();
            }
        }
        (shares, crosses)
    }

    /// Match an incoming sell against bids priced at or above `limit`.
    fn sweep_bids(
        &mut self,
        incoming_token: OrderToken,
        limit: u32,
        mut shares: u32,
    ) -> (u32, Vec<Cross>) {
        let mut crosses = Vec::new();
        while shares > 0 {
            let Some(mut level) = self.bids.last_entry() else {
                break;
            };
            let level_price = *level.key();
            if level_price < limit {
                break;
            }
            let queue = level.get_mut();
            if let Some(front) = queue.front_mut() {
                let volume = shares.min(front.shares);
                crosses.push(Cross {
                    incoming_token,
                    resting_token: front.order_token,
                    price: level_price,
                    shares: volume,
                });
                shares -= volume;
                front.shares -= volume;
                if front.shares == 0 {
                    queue.pop_front();
                }
            }
            if queue.is_empty() {
                level.remove();
            }
        }
        (shares, crosses)
    }

    /// The current BBO when it differs from `before`.
    fn bbo_delta(&self, before: Bbo) -> Option<Bbo> {
        let after = self.bbo();
        (after != before).then_some(after)
    }
}

fn level_volume(queue: &VecDeque<BookEntry>) -> u32 {
    queue.iter().map(|entry| entry.shares).sum()
}
