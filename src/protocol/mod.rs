//! Binary session protocol: header-prefixed, fixed-layout messages.
//!
//! Every frame is `header(1) || payload(fixed width by type)`. The inbound
//! (client → server) and outbound (server → client) message families each
//! have their own header namespace. The codec maps bytes to typed messages
//! and back; it performs no semantic validation beyond length and width.

mod error;
mod inbound;
mod outbound;
mod types;
mod wire;

pub use error::ProtocolError;
pub use inbound::{
    CancelOrder, EnterOrder, InboundMessage, InboundType, ReplaceOrder, SystemStart,
};
pub use outbound::{
    Accepted, BestBidAndOffer, Canceled, Executed, OutboundMessage, OutboundType, Rejected,
    Replaced, SystemEvent,
};
pub use types::{Firm, OrderToken, RejectReason, Side, Stock};
