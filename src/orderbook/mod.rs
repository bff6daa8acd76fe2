//! Continuous double auction order book: entry, matching, cancellation and
//! best-bid-and-offer tracking.

mod book;

pub use book::{Bbo, BookEntry, BookSnapshot, CdaBook, Cross, EnterResult, LevelSnapshot};
