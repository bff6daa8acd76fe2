//! Client-to-server messages and their codec.
//!
//! Each frame is a single header byte followed by a fixed, type-specific
//! payload. Integers are big-endian unsigned; symbolic fields are
//! space-padded ASCII.
//!
//! ```text
//! Header  Type         Payload bytes
//! 'O'     EnterOrder   49
//! 'X'     CancelOrder  18
//! 'U'     ReplaceOrder 46
//! 'S'     SystemStart   1
//! ```

use super::error::ProtocolError;
use super::types::{Firm, OrderToken, Side, Stock};
use super::wire::{Reader, Writer};
use serde::Serialize;

/// Submit a limit order.
///
/// Payload layout (49 bytes):
///
/// ```text
/// Offset  Size  Field
/// 0       14    order_token
/// 14      1     buy_sell_indicator
/// 15      4     shares
/// 19      8     stock
/// 27      4     price
/// 31      4     time_in_force
/// 35      4     firm
/// 39      1     display
/// 40      1     capacity
/// 41      1     intermarket_sweep_eligibility
/// 42      4     minimum_quantity
/// 46      1     cross_type
/// 47      1     customer_type
/// 48      1     midpoint_peg
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnterOrder {
    /// Client-chosen token, unique per order.
    pub order_token: OrderToken,
    /// Buy or sell.
    pub side: Side,
    /// Number of shares, positive.
    pub shares: u32,
    /// Stock symbol.
    pub stock: Stock,
    /// Limit price in integer ticks.
    pub price: u32,
    /// Seconds the order may rest: 0 = immediate-or-cancel, 99_999 =
    /// good-till-cancel, anything between = resting with a timed cancel.
    pub time_in_force: u32,
    /// Entering firm.
    pub firm: Firm,
    /// Display flag, echoed into acknowledgements.
    pub display: u8,
    /// Capacity, echoed into acknowledgements.
    pub capacity: u8,
    /// Intermarket sweep eligibility, echoed.
    pub intermarket_sweep_eligibility: u8,
    /// Minimum execution quantity, echoed.
    pub minimum_quantity: u32,
    /// Cross type, echoed.
    pub cross_type: u8,
    /// Customer type, echoed.
    pub customer_type: u8,
    /// Midpoint peg flag, echoed into every message about this order.
    pub midpoint_peg: u8,
}

/// Cancel all or part of a resting order.
///
/// `shares` is the number of shares to *leave* on the book, not the amount
/// to remove; 0 is a full cancel. Payload: order_token 14, shares 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CancelOrder {
    /// Token of the order to cancel.
    pub order_token: OrderToken,
    /// Target remaining shares (0 = cancel everything).
    pub shares: u32,
}

/// Atomically cancel an existing order and enter a successor under a new
/// token, preserving the original's queue-independent metadata.
///
/// Payload layout (46 bytes): existing_order_token 14,
/// replacement_order_token 14, shares 4, price 4, time_in_force 4,
/// display 1, intermarket_sweep_eligibility 1, minimum_quantity 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReplaceOrder {
    /// Token of the live order being replaced.
    pub existing_order_token: OrderToken,
    /// Fresh token for the successor order.
    pub replacement_order_token: OrderToken,
    /// New total shares.
    pub shares: u32,
    /// New limit price.
    pub price: u32,
    /// New time in force.
    pub time_in_force: u32,
    /// New display flag.
    pub display: u8,
    /// New sweep eligibility.
    pub intermarket_sweep_eligibility: u8,
    /// New minimum quantity.
    pub minimum_quantity: u32,
}

/// Reset the exchange: clear the store, the book and any pending timers'
/// effect. Payload: event_code 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SystemStart {
    /// Event code, echoed in the `SystemEvent` acknowledgement.
    pub event_code: u8,
}

/// Message types a client may send, keyed by header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InboundType {
    /// `'O'` — submit a limit order.
    EnterOrder,
    /// `'X'` — cancel down to a target remainder.
    CancelOrder,
    /// `'U'` — cancel-and-reenter under a new token.
    ReplaceOrder,
    /// `'S'` — reset the exchange.
    SystemStart,
}

impl InboundType {
    /// The header byte identifying this type on the wire.
    #[inline]
    pub const fn header(self) -> u8 {
        match self {
            InboundType::EnterOrder => b'O',
            InboundType::CancelOrder => b'X',
            InboundType::ReplaceOrder => b'U',
            InboundType::SystemStart => b'S',
        }
    }

    /// Fixed payload size in bytes for this type.
    #[inline]
    pub const fn payload_size(self) -> usize {
        match self {
            InboundType::EnterOrder => 49,
            InboundType::CancelOrder => 18,
            InboundType::ReplaceOrder => 46,
            InboundType::SystemStart => 1,
        }
    }

    /// Human-readable type name, used in errors and logs.
    pub const fn name(self) -> &'static str {
        match self {
            InboundType::EnterOrder => "EnterOrder",
            InboundType::CancelOrder => "CancelOrder",
            InboundType::ReplaceOrder => "ReplaceOrder",
            InboundType::SystemStart => "SystemStart",
        }
    }

    /// Resolve a header byte to a message type.
    ///
    /// # Errors
    /// Returns [`ProtocolError::UnknownMessageType`] for unrecognized
    /// headers.
    pub fn lookup(header: u8) -> Result<Self, ProtocolError> {
        match header {
            b'O' => Ok(InboundType::EnterOrder),
            b'X' => Ok(InboundType::CancelOrder),
            b'U' => Ok(InboundType::ReplaceOrder),
            b'S' => Ok(InboundType::SystemStart),
            _ => Err(ProtocolError::UnknownMessageType {
                header,
                direction: "inbound",
            }),
        }
    }
}

/// A decoded client message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InboundMessage {
    /// Submit a limit order.
    EnterOrder(EnterOrder),
    /// Cancel down to a target remainder.
    CancelOrder(CancelOrder),
    /// Cancel-and-reenter under a new token.
    ReplaceOrder(ReplaceOrder),
    /// Reset the exchange.
    SystemStart(SystemStart),
}

impl InboundMessage {
    /// The wire type of this message.
    pub fn message_type(&self) -> InboundType {
        match self {
            InboundMessage::EnterOrder(_) => InboundType::EnterOrder,
            InboundMessage::CancelOrder(_) => InboundType::CancelOrder,
            InboundMessage::ReplaceOrder(_) => InboundType::ReplaceOrder,
            InboundMessage::SystemStart(_) => InboundType::SystemStart,
        }
    }

    /// Decode a payload for the given type.
    ///
    /// # Errors
    /// Returns [`ProtocolError::MalformedPayload`] when `payload` is not
    /// exactly `message_type.payload_size()` bytes.
    pub fn decode(message_type: InboundType, payload: &[u8]) -> Result<Self, ProtocolError> {
        if payload.len() != message_type.payload_size() {
            return Err(ProtocolError::MalformedPayload {
                message_type: message_type.name(),
                expected: message_type.payload_size(),
                actual: payload.len(),
            });
        }
        let mut r = Reader::new(payload);
        Ok(match message_type {
            InboundType::EnterOrder => InboundMessage::EnterOrder(EnterOrder {
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
            }),
            InboundType::CancelOrder => InboundMessage::CancelOrder(CancelOrder {
                order_token: OrderToken(r.array()),
                shares: r.be_u32(),
            }),
            InboundType::ReplaceOrder => InboundMessage::ReplaceOrder(ReplaceOrder {
                existing_order_token: OrderToken(r.array()),
                replacement_order_token: OrderToken(r.array()),
                shares: r.be_u32(),
                price: r.be_u32(),
                time_in_force: r.be_u32(),
                display: r.byte(),
                intermarket_sweep_eligibility: r.byte(),
                minimum_quantity: r.be_u32(),
            }),
            InboundType::SystemStart => InboundMessage::SystemStart(SystemStart {
                event_code: r.byte(),
            }),
        })
    }

    /// Encode as a full frame: `header || payload`, exactly
    /// `1 + payload_size` bytes.
    pub fn encode(&self) -> Vec<u8> {
        let message_type = self.message_type();
        let mut w = Writer::frame(message_type.header(), message_type.payload_size());
        match self {
            InboundMessage::EnterOrder(m) => {
                w.bytes(m.order_token.as_bytes());
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
                w.byte(m.customer_type);
                w.byte(m.midpoint_peg);
            }
            InboundMessage::CancelOrder(m) => {
                w.bytes(m.order_token.as_bytes());
                w.be_u32(m.shares);
            }
            InboundMessage::ReplaceOrder(m) => {
                w.bytes(m.existing_order_token.as_bytes());
                w.bytes(m.replacement_order_token.as_bytes());
                w.be_u32(m.shares);
                w.be_u32(m.price);
                w.be_u32(m.time_in_force);
                w.byte(m.display);
                w.byte(m.intermarket_sweep_eligibility);
                w.be_u32(m.minimum_quantity);
            }
            InboundMessage::SystemStart(m) => {
                w.byte(m.event_code);
            }
        }
        w.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_enter() -> EnterOrder {
        EnterOrder {
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
        }
    }

    #[test]
    fn test_enter_order_frame_layout() {
        let frame = InboundMessage::EnterOrder(sample_enter()).encode();
        assert_eq!(frame.len(), 1 + InboundType::EnterOrder.payload_size());
        assert_eq!(frame[0], b'O');
        assert_eq!(&frame[1..15], OrderToken::new("B1").as_bytes());
        assert_eq!(frame[15], b'B');
        assert_eq!(&frame[16..20], &10u32.to_be_bytes());
        assert_eq!(&frame[20..28], b"AMAZGOOG");
        assert_eq!(&frame[28..32], &50u32.to_be_bytes());
        assert_eq!(&frame[32..36], &99_999u32.to_be_bytes());
        assert_eq!(frame[47], b'N');
        assert_eq!(frame[48], b'R');
        assert_eq!(frame[49], b'N');
    }

    #[test]
    fn test_enter_order_decodes_from_bytes() {
        let frame = InboundMessage::EnterOrder(sample_enter()).encode();
        let message_type = InboundType::lookup(frame[0]).unwrap();
        let decoded = InboundMessage::decode(message_type, &frame[1..]).unwrap();
        assert_eq!(decoded, InboundMessage::EnterOrder(sample_enter()));
    }

    #[test]
    fn test_cancel_order_frame_layout() {
        let cancel = CancelOrder {
            order_token: OrderToken::new("B1"),
            shares: 0,
        };
        let frame = InboundMessage::CancelOrder(cancel).encode();
        assert_eq!(frame.len(), 19);
        assert_eq!(frame[0], b'X');
        assert_eq!(&frame[15..19], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_unknown_header_rejected() {
        let err = InboundType::lookup(b'?').unwrap_err();
        assert_eq!(
            err,
            ProtocolError::UnknownMessageType {
                header: b'?',
                direction: "inbound"
            }
        );
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err = InboundMessage::decode(InboundType::CancelOrder, &[0u8; 17]).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::MalformedPayload {
                expected: 18,
                actual: 17,
                ..
            }
        ));
    }
}
