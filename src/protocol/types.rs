//! Fixed-width field types shared by inbound and outbound messages.
//!
//! All symbolic fields on the wire are fixed-width ASCII, space-padded on
//! the right. The newtypes here keep the raw wire bytes and render trimmed
//! text for logs.

use serde::{Serialize, Serializer};
use std::fmt;

/// Client-chosen order identifier, 14 ASCII bytes, space-padded.
///
/// Unique per order for the lifetime of the exchange session; the engine
/// rejects re-use with a `RepeatID` rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderToken(pub [u8; 14]);

/// Stock symbol, 8 ASCII bytes, space-padded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Stock(pub [u8; 8]);

/// Firm identifier, 4 ASCII bytes, space-padded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Firm(pub [u8; 4]);

/// Rejection reason, 8 ASCII bytes, space-padded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RejectReason(pub [u8; 8]);

impl RejectReason {
    /// The order token was already used by a prior order.
    pub const REPEAT_ID: RejectReason = RejectReason(*b"RepeatID");
}

/// Order side as carried in the `buy_sell_indicator` wire field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Side {
    /// A bid; rests on the buy side of the book.
    Buy,
    /// An offer; rests on the sell side of the book.
    Sell,
}

impl Side {
    /// The wire byte for this side (`b'B'` or `b'S'`).
    #[inline]
    pub const fn indicator(self) -> u8 {
        match self {
            Side::Buy => b'B',
            Side::Sell => b'S',
        }
    }

    /// Parse a `buy_sell_indicator` byte. Anything other than `b'B'` is a
    /// sell, matching the original protocol's two-valued field.
    #[inline]
    pub const fn from_indicator(byte: u8) -> Self {
        if byte == b'B' { Side::Buy } else { Side::Sell }
    }

    /// The opposite side of the book.
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "Buy"),
            Side::Sell => write!(f, "Sell"),
        }
    }
}

macro_rules! ascii_field {
    ($name:ident, $len:expr) => {
        impl $name {
            /// Build from text, right-padded with spaces. Input longer than
            /// the field width is truncated.
            pub fn new(text: &str) -> Self {
                let mut raw = [b' '; $len];
                let bytes = text.as_bytes();
                let n = bytes.len().min($len);
                raw[..n].copy_from_slice(&bytes[..n]);
                Self(raw)
            }

            /// The raw wire bytes.
            #[inline]
            pub const fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let text = String::from_utf8_lossy(&self.0);
                write!(f, "{}", text.trim_end())
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.collect_str(self)
            }
        }
    };
}

ascii_field!(OrderToken, 14);
ascii_field!(Stock, 8);
ascii_field!(Firm, 4);
ascii_field!(RejectReason, 8);
