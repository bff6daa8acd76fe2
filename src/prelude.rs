//! Convenience re-exports for the common surface of the crate.

pub use crate::config::ExchangeConfig;
pub use crate::engine::{Exchange, SessionMessage, run};
pub use crate::journal::MarketJournal;
pub use crate::orderbook::{Bbo, CdaBook};
pub use crate::protocol::{
    CancelOrder, EnterOrder, InboundMessage, InboundType, OrderToken, OutboundMessage,
    OutboundType, Side, Stock, SystemStart,
};
pub use crate::server::SessionServer;
pub use crate::utils::MidnightClock;
