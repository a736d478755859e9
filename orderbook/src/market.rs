//! Cross-exchange view: one book per (publisher, instrument) pair, plus a
//! consolidated BBO fold across every publisher quoting a given instrument.

use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::book::{Book, BookLike, OrderBook};
use crate::error::Result;
use crate::top_of_book::TopOfBookBook;
use crate::types::{BestBidOffer, Flags, Record, SymbolMapping};

/// Key a book is stored and looked up under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct BookKey {
    publisher_id: u16,
    instrument_id: u32,
}

/// Holds every per-(publisher, instrument) book seen so far, the instrument
/// symbology learned from `SymbolMapping` records, and whether the most
/// recent batch of records has fully arrived (`F_LAST` seen on its last
/// record).
#[derive(Clone, Debug, Default)]
pub struct Market {
    books: HashMap<BookKey, Book>,
    /// Iterated in key order so consolidated output is reproducible across
    /// runs; this ordering has no bearing on the fold result itself.
    symbology: BTreeMap<u32, String>,
    is_ready: bool,
}

impl Market {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.is_ready
    }

    pub fn symbol_for(&self, instrument_id: u32) -> Option<&str> {
        self.symbology.get(&instrument_id).map(String::as_str)
    }

    fn set_symbology(&mut self, mapping: SymbolMapping) {
        self.symbology
            .insert(mapping.instrument_id, mapping.stype_out_symbol);
    }

    /// Applies a decoded record: routes an MBO message to its
    /// (publisher, instrument) book, lazily creating it (as a [`Book::Full`]
    /// or [`Book::TopOfBook`], chosen by whether the message carries
    /// `F_TOB`) the first time that pair is seen. Updates `is_ready` to
    /// whether the message was the last of its batch.
    pub fn apply(&mut self, record: Record) -> Result<()> {
        match record {
            Record::SymbolMapping(mapping) => {
                self.set_symbology(mapping);
                Ok(())
            }
            Record::System(_) => Ok(()),
            Record::Mbo(raw) => {
                let flags = raw.flags;
                let msg = crate::types::Message::try_from(raw)?;
                let key = BookKey {
                    publisher_id: msg.publisher_id,
                    instrument_id: msg.instrument_id,
                };

                let book = self.books.entry(key).or_insert_with(|| {
                    if flags.contains(Flags::F_TOB) {
                        Book::TopOfBook(TopOfBookBook::new(msg.instrument_id, msg.publisher_id))
                    } else {
                        Book::Full(OrderBook::new(msg.instrument_id, msg.publisher_id))
                    }
                });
                book.apply(&msg)?;
                self.is_ready = flags.contains(Flags::F_LAST);
                Ok(())
            }
        }
    }

    /// Returns a copy of the book for (`publisher_id`, `instrument_id`), or
    /// a fresh, empty full-depth book if that pair has never traded.
    pub fn get_order_book(&self, publisher_id: u16, instrument_id: u32) -> Book {
        let key = BookKey {
            publisher_id,
            instrument_id,
        };
        self.books
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Book::Full(OrderBook::new(instrument_id, publisher_id)))
    }

    /// Best bid/offer for `instrument_id`.
    ///
    /// With `publisher_id` given, delegates to that single exchange's book
    /// (a fresh, empty book's `bbo()` if the pair is unknown). With
    /// `publisher_id` absent, folds every publisher currently quoting this
    /// instrument into a consolidated pair: the highest bid and the lowest
    /// offer win, with ties keeping whichever publisher was folded in first
    /// (publishers are folded in ascending `publisher_id` order, solely so
    /// output is reproducible — the fold never replaces an equal quote).
    ///
    /// Never fails: an instrument with no books yields a zero-value pair,
    /// the same as `get_order_book` returning a fresh book for an unknown
    /// key — this query is safe to call on any key.
    pub fn bbo(&self, instrument_id: u32, publisher_id: Option<u16>) -> (BestBidOffer, BestBidOffer) {
        if let Some(publisher_id) = publisher_id {
            let key = BookKey {
                publisher_id,
                instrument_id,
            };
            return self
                .books
                .get(&key)
                .map(|book| book.bbo())
                .unwrap_or_default();
        }

        let mut publisher_ids: Vec<u16> = self
            .books
            .keys()
            .filter(|k| k.instrument_id == instrument_id)
            .map(|k| k.publisher_id)
            .collect();
        publisher_ids.sort_unstable();
        publisher_ids.dedup();

        let mut best_bid = BestBidOffer::default();
        let mut best_offer = BestBidOffer::default();

        for publisher_id in publisher_ids {
            let key = BookKey {
                publisher_id,
                instrument_id,
            };
            let (bid, offer) = self.books[&key].bbo();

            if let Some(price) = bid.price {
                if best_bid.price.map_or(true, |best| price > best) {
                    best_bid = bid;
                }
            }
            if let Some(price) = offer.price {
                if best_offer.price.map_or(true, |best| price < best) {
                    best_offer = offer;
                }
            }
        }

        (best_bid, best_offer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Flags, MboRecord};

    fn mbo(
        action: char,
        side: char,
        order_id: u64,
        price: i64,
        size: u32,
        publisher_id: u16,
        flags: Flags,
    ) -> Record {
        Record::Mbo(MboRecord {
            action,
            side,
            order_id,
            price,
            size,
            publisher_id,
            instrument_id: 7,
            ts_event: order_id,
            ts_recv: order_id,
            flags,
        })
    }

    #[test]
    fn lazy_creates_full_book_on_first_add() {
        let mut market = Market::new();
        market
            .apply(mbo('A', 'B', 1, 100, 5, 1, Flags::F_LAST))
            .unwrap();

        let book = market.get_order_book(1, 7);
        assert!(matches!(book, Book::Full(_)));
    }

    #[test]
    fn lazy_creates_top_of_book_when_flagged() {
        let mut market = Market::new();
        market
            .apply(mbo('A', 'B', 0, 100, 5, 1, Flags::F_TOB | Flags::F_LAST))
            .unwrap();

        let book = market.get_order_book(1, 7);
        assert!(matches!(book, Book::TopOfBook(_)));
    }

    #[test]
    fn unknown_pair_returns_fresh_book() {
        let market = Market::new();
        let book = market.get_order_book(9, 7);
        assert!(matches!(book, Book::Full(_)));
        assert_eq!(book.update_count(), 0);
    }

    #[test]
    fn consolidated_bbo_takes_best_across_publishers() {
        let mut market = Market::new();
        market
            .apply(mbo('A', 'B', 1, 100, 5, 1, Flags::F_LAST))
            .unwrap();
        market
            .apply(mbo('A', 'B', 2, 101, 3, 2, Flags::F_LAST))
            .unwrap();
        market
            .apply(mbo('A', 'A', 3, 105, 4, 1, Flags::F_LAST))
            .unwrap();
        market
            .apply(mbo('A', 'A', 4, 104, 2, 2, Flags::F_LAST))
            .unwrap();

        let (bid, offer) = market.bbo(7, None);
        assert_eq!(bid.price, Some(101.0));
        assert_eq!(offer.price, Some(104.0));
    }

    #[test]
    fn single_publisher_bbo_delegates_to_its_own_book() {
        let mut market = Market::new();
        market
            .apply(mbo('A', 'B', 1, 100, 5, 1, Flags::F_LAST))
            .unwrap();
        market
            .apply(mbo('A', 'B', 2, 101, 3, 2, Flags::F_LAST))
            .unwrap();

        let (bid, _) = market.bbo(7, Some(1));
        assert_eq!(bid.price, Some(100.0));
        assert_eq!(bid.size, 5);
    }

    #[test]
    fn tie_keeps_the_lower_publisher_id() {
        let mut market = Market::new();
        market
            .apply(mbo('A', 'B', 1, 100, 5, 2, Flags::F_LAST))
            .unwrap();
        market
            .apply(mbo('A', 'B', 2, 100, 9, 1, Flags::F_LAST))
            .unwrap();

        let (bid, _) = market.bbo(7, None);
        assert_eq!(bid.size, 9);
    }

    #[test]
    fn is_ready_tracks_the_last_flag() {
        let mut market = Market::new();
        market
            .apply(mbo('A', 'B', 1, 100, 5, 1, Flags::empty()))
            .unwrap();
        assert!(!market.is_ready());

        market
            .apply(mbo('A', 'B', 2, 101, 5, 1, Flags::F_LAST))
            .unwrap();
        assert!(market.is_ready());
    }

    #[test]
    fn symbol_mapping_updates_symbology() {
        let mut market = Market::new();
        market
            .apply(Record::SymbolMapping(SymbolMapping {
                instrument_id: 7,
                stype_out_symbol: "AAPL".into(),
            }))
            .unwrap();

        assert_eq!(market.symbol_for(7), Some("AAPL"));
    }

    #[test]
    fn bbo_on_untracked_instrument_is_safe_and_empty() {
        let market = Market::new();
        let (bid, offer) = market.bbo(999, None);
        assert_eq!(bid, BestBidOffer::default());
        assert_eq!(offer, BestBidOffer::default());

        let (bid, offer) = market.bbo(999, Some(1));
        assert_eq!(bid, BestBidOffer::default());
        assert_eq!(offer, BestBidOffer::default());
    }
}
