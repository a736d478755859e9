//! MBO (market-by-order) limit order book engine.
//!
//! Core pieces:
//! - [`OrderBook`]: full-depth (L3) book with time-priority FIFO per price.
//! - [`TopOfBookBook`]: BBO-only book for top-of-book feeds.
//! - [`Market`]: one book per (publisher, instrument), plus a consolidated
//!   BBO fold across publishers.
//!
//! The engine is synchronous and single-threaded: `Market::apply` is the
//! sole mutator, and every other query borrows immutably.

mod arena;
pub mod error;
mod price_level;

pub mod book;
pub mod market;
pub mod render;
pub mod top_of_book;
pub mod types;

pub use arena::{NodeHandle, OrderNode};
pub use book::{Book, BookLike, OrderBook};
pub use error::{EngineError, Result};
pub use market::Market;
pub use top_of_book::TopOfBookBook;
pub use types::{
    Action, BestBidOffer, Flags, MboRecord, Message, Price, RawSide, Record, Side, SymbolMapping,
    SystemRecord, UNDEF_PRICE,
};
