//! Server-to-client messages and their codec.
//!
//! Outbound headers live in their own namespace, separate from the inbound
//! set, mirroring the OUCH split into client and server message families.
//!
//! ```text
//! Header  Type             Payload bytes
//! 'A'     Accepted         67
//! 'C'     Canceled         33
//! 'E'     Executed         40
//! 'J'     Rejected         38
//! 'Q'     BestBidAndOffer  40
//! 'S'     SystemEvent       9
//! 'U'     Replaced         80
//! ```

use super::error::ProtocolError;
use super::inbound::EnterOrder;
use super::types::{Firm, OrderToken, RejectReason, Side, Stock};
use super::wire::{Reader, Writer};
use serde::Serialize;

/// Acknowledges entry of an order.
///
/// Payload: timestamp 8, order_reference_number 8, order_state 1,
/// bbo_weight_indicator 1, then the 49 EnterOrder payload bytes echoed
/// field-for-field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Accepted {
    /// Nanoseconds since local midnight.
    pub timestamp: u64,
    /// Server-assigned odd reference number, distinct from the token.
    pub order_reference_number: u64,
    /// `b'L'` for a live limit order.
    pub order_state: u8,
    /// Always a space in this exchange.
    pub bbo_weight_indicator: u8,
    /// The original submission, echoed in full.
    pub order: EnterOrder,
}

/// Reports shares removed from a resting order.
///
/// Payload: timestamp 8, order_token 14, decrement_shares 4, reason 1,
/// midpoint_peg 1, price 4, buy_sell_indicator 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Canceled {
    /// Nanoseconds since local midnight.
    pub timestamp: u64,
    /// Token of the cancelled order.
    pub order_token: OrderToken,
    /// Shares removed by this cancellation.
    pub decrement_shares: u32,
    /// Cancellation reason, `b'U'` for user-requested.
    pub reason: u8,
    /// Midpoint peg flag from the original order.
    pub midpoint_peg: u8,
    /// Price of the cancelled order.
    pub price: u32,
    /// Side of the cancelled order.
    pub side: Side,
}

/// Reports one side of a trade.
///
/// Payload: timestamp 8, order_token 14, executed_shares 4,
/// execution_price 4, liquidity_flag 1, match_number 8, midpoint_peg 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Executed {
    /// Nanoseconds since local midnight.
    pub timestamp: u64,
    /// Token of the order that traded.
    pub order_token: OrderToken,
    /// Shares exchanged in this fill.
    pub executed_shares: u32,
    /// Price of the fill — always the resting order's price.
    pub execution_price: u32,
    /// Liquidity flag; `b'?'` when not attributed.
    pub liquidity_flag: u8,
    /// Pairs the two sides of one trade.
    pub match_number: u64,
    /// Midpoint peg flag from the original order.
    pub midpoint_peg: u8,
}

/// Rejects an order without touching the book.
///
/// Payload: timestamp 8, order_token 14, reason 8, price 4, shares 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rejected {
    /// Nanoseconds since local midnight.
    pub timestamp: u64,
    /// Token of the rejected submission.
    pub order_token: OrderToken,
    /// Why the order was rejected, e.g. `RepeatID`.
    pub reason: RejectReason,
    /// Price from the rejected submission.
    pub price: u32,
    /// Shares from the rejected submission.
    pub shares: u32,
}

/// Top-of-book snapshot, broadcast when any observable field changes.
///
/// A value of 0 means the side is empty at that depth. Payload:
/// timestamp 8, stock 8, then six 4-byte fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BestBidAndOffer {
    /// Nanoseconds since local midnight.
    pub timestamp: u64,
    /// Stock symbol.
    pub stock: Stock,
    /// Highest bid price, 0 when no bids.
    pub best_bid: u32,
    /// Total shares at the best bid.
    pub volume_at_best_bid: u32,
    /// Lowest ask price, 0 when no asks.
    pub best_ask: u32,
    /// Total shares at the best ask.
    pub volume_at_best_ask: u32,
    /// Second-best bid price, 0 when absent.
    pub next_bid: u32,
    /// Second-best ask price, 0 when absent.
    pub next_ask: u32,
}

/// System-level event acknowledgement.
///
/// Payload: event_code 1, timestamp 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SystemEvent {
    /// Event code, `b'S'` for start.
    pub event_code: u8,
    /// Nanoseconds since local midnight.
    pub timestamp: u64,
}

/// Acknowledges a replace: the successor order is live (or done) under the
/// replacement token.
///
/// Payload: timestamp 8, order_reference_number 8, order_state 1,
/// bbo_weight_indicator 1, replacement_order_token 14,
/// buy_sell_indicator 1, shares 4, stock 8, price 4, time_in_force 4,
/// firm 4, display 1, capacity 1, intermarket_sweep_eligibility 1,
/// minimum_quantity 4, cross_type 1, previous_order_token 14,
/// midpoint_peg 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Replaced {
    /// Nanoseconds since local midnight.
    pub timestamp: u64,
    /// Fresh odd reference number for the successor order.
    pub order_reference_number: u64,
    /// `b'L'` when the successor rests, `b'D'` when it is already done.
    pub order_state: u8,
    /// Always `b'*'` on replaces, as the original exchange emits.
    pub bbo_weight_indicator: u8,
    /// Token the successor order lives under.
    pub replacement_order_token: OrderToken,
    /// Side inherited from the original order.
    pub side: Side,
    /// Shares liable on the successor order.
    pub shares: u32,
    /// Stock symbol from the original order.
    pub stock: Stock,
    /// Price of the successor order.
    pub price: u32,
    /// Time in force of the successor order.
    pub time_in_force: u32,
    /// Firm from the original order.
    pub firm: Firm,
    /// Display flag from the replace request.
    pub display: u8,
    /// Capacity; `b'*'` on replaces.
    pub capacity: u8,
    /// Sweep eligibility from the replace request.
    pub intermarket_sweep_eligibility: u8,
    /// Minimum quantity from the replace request.
    pub minimum_quantity: u32,
    /// Cross type; `b'*'` on replaces.
    pub cross_type: u8,
    /// Token of the order that was replaced.
    pub previous_order_token: OrderToken,
    /// Midpoint peg flag from the original order.
    pub midpoint_peg: u8,
}

/// Message types the server may send, keyed by header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutboundType {
    /// `'A'` — order accepted.
    Accepted,
    /// `'C'` — shares cancelled.
    Canceled,
    /// `'E'` — one side of a trade.
    Executed,
    /// `'J'` — order rejected.
    Rejected,
    /// `'Q'` — top-of-book update.
    BestBidAndOffer,
    /// `'S'` — system event.
    SystemEvent,
    /// `'U'` — order replaced.
    Replaced,
}

impl OutboundType {
    /// The header byte identifying this type on the wire.
    #[inline]
    pub const fn header(self) -> u8 {
        match self {
            OutboundType::Accepted => b'A',
            OutboundType::Canceled => b'C',
            OutboundType::Executed => b'E',
            OutboundType::Rejected => b'J',
            OutboundType::BestBidAndOffer => b'Q',
            OutboundType::SystemEvent => b'S',
            OutboundType::Replaced => b'U',
        }
    }

    /// Fixed payload size in bytes for this type.
    #[inline]
    pub const fn payload_size(self) -> usize {
        match self {
            OutboundType::Accepted => 67,
            OutboundType::Canceled => 33,
            OutboundType::Executed => 40,
            OutboundType::Rejected => 38,
            OutboundType::BestBidAndOffer => 40,
            OutboundType::SystemEvent => 9,
            OutboundType::Replaced => 80,
        }
    }

    /// Human-readable type name, used in errors and logs.
    pub const fn name(self) -> &'static str {
        match self {
            OutboundType::Accepted => "Accepted",
            OutboundType::Canceled => "Canceled",
            OutboundType::Executed => "Executed",
            OutboundType::Rejected => "Rejected",
            OutboundType::BestBidAndOffer => "BestBidAndOffer",
            OutboundType::SystemEvent => "SystemEvent",
            OutboundType::Replaced => "Replaced",
        }
    }

    /// Resolve a header byte to a message type.
    ///
    /// # Errors
    /// Returns [`ProtocolError::UnknownMessageType`] for unrecognized
    /// headers.
    pub fn lookup(header: u8) -> Result<Self, ProtocolError> {
        match header {
            b'A' => Ok(OutboundType::Accepted),
            b'C' => Ok(OutboundType::Canceled),
            b'E' => Ok(OutboundType::Executed),
            b'J' => Ok(OutboundType::Rejected),
            b'Q' => Ok(OutboundType::BestBidAndOffer),
            b'S' => Ok(OutboundType::SystemEvent),
            b'U' => Ok(OutboundType::Replaced),
            _ => Err(ProtocolError::UnknownMessageType {
                header,
                direction: "outbound",
            }),
        }
    }
}

/// A server message, ready to encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutboundMessage {
    /// Order accepted.
    Accepted(Accepted),
    /// Shares cancelled.
    Canceled(Canceled),
    /// One side of a trade.
    Executed(Executed),
    /// Order rejected.
    Rejected(Rejected),
    /// Top-of-book update.
    BestBidAndOffer(BestBidAndOffer),
    /// System event.
    SystemEvent(SystemEvent),
    /// Order replaced.
    Replaced(Replaced),
}

impl OutboundMessage {
    /// The wire type of this message.
    pub fn message_type(&self) -> OutboundType {
        match self {
            OutboundMessage::Accepted(_) => OutboundType::Accepted,
            OutboundMessage::Canceled(_) => OutboundType::Canceled,
            OutboundMessage::Executed(_) => OutboundType::Executed,
            OutboundMessage::Rejected(_) => OutboundType::Rejected,
            OutboundMessage::BestBidAndOffer(_) => OutboundType::BestBidAndOffer,
            OutboundMessage::SystemEvent(_) => OutboundType::SystemEvent,
            OutboundMessage::Replaced(_) => OutboundType::Replaced,
        }
    }

    /// Encode as a full frame: `header || payload`, exactly
    /// `1 + payload_size` bytes.
    pub fn encode(&self) -> Vec<u8> {
        let message_type = self.message_type();
        let mut w = Writer::frame(message_type.header(), message_type.payload_size());
        match self {
            OutboundMessage::Accepted(m) => {
                w.be_u64(m.timestamp);
                w.be_u64(m.order_reference_number);
                w.byte(m.order_state);
                w.byte(m.bbo_weight_indicator);
                w.bytes(m.order.order_token.as_bytes());
                w.byte(m.order.side.indicator());
                w.be_u32(m.order.shares);
                w.bytes(m.order.stock.as_bytes());
                w.be_u32(m.order.price);
                w.be_u32(m.order.time_in_force);
                w.bytes(m.order.firm.as_bytes());
                w.byte(m.order.display);
                w.byte(m.order.capacity);
                w.byte(m.order.intermarket_sweep_eligibility);
                w.be_u32(m.order.minimum_quantity);
                w.byte(m.order.cross_type);
                w.byte(m.order.customer_type);
                w.byte(m.order.midpoint_peg);
            }
            OutboundMessage::Canceled(m) => {
                w.be_u64(m.timestamp);
                w.bytes(m.order_token.as_bytes());
                w.be_u32(m.decrement_shares);
                w.byte(m.reason);
                w.byte(m.midpoint_peg);
                w.be_u32(m.price);
                w.byte(m.side.indicator());
            }
            OutboundMessage::Executed(m) => {
                w.be_u64(m.timestamp);
                w.bytes(m.order_token.as_bytes());
                w.be_u32(m.executed_shares);
                w.be_u32(m.execution_price);
                w.byte(m.liquidity_flag);
                w.be_u64(m.match_number);
                w.byte(m.midpoint_peg);
            }
            OutboundMessage::Rejected(m) => {
                w.be_u64(m.timestamp);
                w.bytes(m.order_token.as_bytes());
                w.bytes(m.reason.as_bytes());
                w.be_u32(m.price);
                w.be_u32(m.shares);
            }
            OutboundMessage::BestBidAndOffer(m) => {
                w.be_u64(m.timestamp);
                w.bytes(m.stock.as_bytes());
                w.be_u32(m.best_bid);
                w.be_u32(m.volume_at_best_bid);
                w.be_u32(m.best_ask);
                w.be_u32(m.volume_at_best_ask);
                w.be_u32(m.next_bid);
                w.be_u32(m.next_ask);
            }
            OutboundMessage::SystemEvent(m) => {
                w.byte(m.event_code);
                w.be_u64(m.timestamp);
            }
            OutboundMessage::Replaced(m) => {
                w.be_u64(m.timestamp);
                w.be_u64(m.order_reference_number);
                w.byte(m.order_state);
                w.byte(m.bbo_weight_indicator);
                w.bytes(m.replacement_order_token.as_bytes());
                w.byte(m.side.indicator());
                w.be_u32(m.shares);
                w.bytes(m.stock.as_bytes());
                w.be_u32(m.price);
                w.be_u32(m.time_in_force);
                w.bytes(m.firm.as_bytes());
                w.byte(m.display);
                w.byte(m.capacity);
                w.byte(m.intermarket_sweep_eligibility);
                w.be_u32(m.minimum_quantity);
                w.byte(m.cross_type);
                w.bytes(m.previous_order_token.as_bytes());
                w.byte(m.midpoint_peg);
            }
        }
        w.finish()
    }

    /// Decode a payload for the given type. The client side of the codec;
    /// the server only encodes these.
    ///
    /// # Errors
    /// Returns [`ProtocolError::MalformedPayload`] when `payload` is not
    /// exactly `message_type.payload_size()` bytes.
    pub fn decode(message_type: OutboundType, payload: &[u8]) -> Result<Self, ProtocolError> {
        if payload.len() != message_type.payload_size() {
            return Err(ProtocolError::MalformedPayload {
                message_type: message_type.name(),
                expected: message_type.payload_size(),
                actual: payload.len(),
            });
        }
        let mut r = Reader::new(payload);
        Ok(match message_type {
            OutboundType::Accepted => OutboundMessage::Accepted(Accepted {
                timestamp: r.be_u64(),
                order_reference_number: r.be_u64(),
                order_state: r.byte(),
                bbo_weight_indicator: r.byte(),
                order: EnterOrder {
                    order_token: OrderToken(r.array()),
                    side: Side::from_indicator(r.byte()),
                    shares: r.be_u32(),
                    stock: Stock(r.array()),
                    price: r.be_u32(),
                    time_in_force: r.be_u32(),
                    firm: Firm(r.array()),
                    display: r.byte(),
                    capacity: r.byte(),
                    intermarket_sweep_eligibility: r.byte(),
                    minimum_quantity: r.be_u32(),
                    cross_type: r.byte(),
                    customer_type: r.byte(),
                    midpoint_peg: r.byte(),
                },
            }),
            OutboundType::Canceled => OutboundMessage::Canceled(Canceled {
                timestamp: r.be_u64(),
                order_token: OrderToken(r.array()),
                decrement_shares: r.be_u32(),
                reason: r.byte(),
                midpoint_peg: r.byte(),
                price: r.be_u32(),
                side: Side::from_indicator(r.byte()),
            }),
            OutboundType::Executed => OutboundMessage::Executed(Executed {
                timestamp: r.be_u64(),
                order_token: OrderToken(r.array()),
                executed_shares: r.be_u32(),
                execution_price: r.be_u32(),
                liquidity_flag: r.byte(),
                match_number: r.be_u64(),
                midpoint_peg: r.byte(),
            }),
            OutboundType::Rejected => OutboundMessage::Rejected(Rejected {
                timestamp: r.be_u64(),
                order_token: OrderToken(r.array()),
                reason: RejectReason(r.array()),
                price: r.be_u32(),
                shares: r.be_u32(),
            }),
            OutboundType::BestBidAndOffer => OutboundMessage::BestBidAndOffer(BestBidAndOffer {
                timestamp: r.be_u64(),
                stock: Stock(r.array()),
                best_bid: r.be_u32(),
                volume_at_best_bid: r.be_u32(),
                best_ask: r.be_u32(),
                volume_at_best_ask: r.be_u32(),
                next_bid: r.be_u32(),
                next_ask: r.be_u32(),
            }),
            OutboundType::SystemEvent => OutboundMessage::SystemEvent(SystemEvent {
                event_code: r.byte(),
                timestamp: r.be_u64(),
            }),
            OutboundType::Replaced => OutboundMessage::Replaced(Replaced {
                timestamp: r.be_u64(),
                order_reference_number: r.be_u64(),
                order_state: r.byte(),
                bbo_weight_indicator: r.byte(),
                replacement_order_token: OrderToken(r.array()),
                side: Side::from_indicator(r.byte()),
                shares: r.be_u32(),
                stock: Stock(r.array()),
                price: r.be_u32(),
                time_in_force: r.be_u32(),
                firm: Firm(r.array()),
                display: r.byte(),
                capacity: r.byte(),
                intermarket_sweep_eligibility: r.byte(),
                minimum_quantity: r.be_u32(),
                cross_type: r.byte(),
                previous_order_token: OrderToken(r.array()),
                midpoint_peg: r.byte(),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executed_frame_layout() {
        let executed = Executed {
            timestamp: 1_234,
            order_token: OrderToken::new("S1"),
            executed_shares: 10,
            execution_price: 50,
            liquidity_flag: b'?',
            match_number: 7,
            midpoint_peg: b'N',
        };
        let frame = OutboundMessage::Executed(executed).encode();
        assert_eq!(frame.len(), 41);
        assert_eq!(frame[0], b'E');
        assert_eq!(&frame[1..9], &1_234u64.to_be_bytes());
        assert_eq!(&frame[9..23], OrderToken::new("S1").as_bytes());
        assert_eq!(&frame[23..27], &10u32.to_be_bytes());
        assert_eq!(&frame[27..31], &50u32.to_be_bytes());
        assert_eq!(frame[31], b'?');
        assert_eq!(&frame[32..40], &7u64.to_be_bytes());
        assert_eq!(frame[40], b'N');
    }

    #[test]
    fn test_bbo_frame_layout() {
        let bbo = BestBidAndOffer {
            timestamp: 0,
            stock: Stock::new("AMAZGOOG"),
            best_bid: 50,
            volume_at_best_bid: 10,
            best_ask: 0,
            volume_at_best_ask: 0,
            next_bid: 0,
            next_ask: 0,
        };
        let frame = OutboundMessage::BestBidAndOffer(bbo).encode();
        assert_eq!(frame.len(), 41);
        assert_eq!(frame[0], b'Q');
        assert_eq!(&frame[9..17], b"AMAZGOOG");
        assert_eq!(&frame[17..21], &50u32.to_be_bytes());
        assert_eq!(&frame[21..25], &10u32.to_be_bytes());
    }

    #[test]
    fn test_rejected_carries_reason_text() {
        let rejected = Rejected {
            timestamp: 0,
            order_token: OrderToken::new("B1"),
            reason: RejectReason::REPEAT_ID,
            price: 40,
            shares: 1,
        };
        let frame = OutboundMessage::Rejected(rejected).encode();
        assert_eq!(frame.len(), 39);
        assert_eq!(&frame[23..31], b"RepeatID");
    }

    #[test]
    fn test_accepted_decodes_from_bytes() {
        let accepted = Accepted {
            timestamp: 99,
            order_reference_number: 1,
            order_state: b'L',
            bbo_weight_indicator: b' ',
            order: EnterOrder {
                order_token: OrderToken::new("B1"),
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
            },
        };
        let frame = OutboundMessage::Accepted(accepted).encode();
        assert_eq!(frame.len(), 68);
        let message_type = OutboundType::lookup(frame[0]).unwrap();
        let decoded = OutboundMessage::decode(message_type, &frame[1..]).unwrap();
        assert_eq!(decoded, OutboundMessage::Accepted(accepted));
    }

    #[test]
    fn test_unknown_outbound_header_rejected() {
        assert!(OutboundType::lookup(b'z').is_err());
    }
}
