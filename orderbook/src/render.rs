//! Human-readable book dump: offers (high to low) stacked above bids (high
//! to low), each line "price x depth", preceded by a two-line header. Not
//! part of the engine's core contract; kept separate so it can change shape
//! without touching book state logic.

use chrono::{DateTime, FixedOffset, Utc};

use crate::book::OrderBook;
use crate::top_of_book::TopOfBookBook;

/// Fixed US/Eastern offset used for the header timestamp: -5h, no DST table.
const EASTERN_OFFSET_SECONDS: i32 = -5 * 3600;

fn header(instrument_label: &str, publisher_label: &str, ts_last_update: u64) -> String {
    let secs = (ts_last_update / 1_000_000_000) as i64;
    let nanos = (ts_last_update % 1_000_000_000) as u32;
    let utc = DateTime::<Utc>::from_timestamp(secs, nanos)
        .unwrap_or_else(|| DateTime::<Utc>::from_timestamp(0, 0).expect("epoch is representable"));
    let eastern_offset = FixedOffset::east_opt(EASTERN_OFFSET_SECONDS).expect("valid fixed offset");
    let eastern = utc.with_timezone(&eastern_offset);

    format!(
        "{instrument_label} @ {publisher_label}\nlast update: {} UTC / {} EST\n",
        utc.format("%Y-%m-%d %H:%M:%S%.9f"),
        eastern.format("%Y-%m-%d %H:%M:%S%.9f"),
    )
}

/// Renders a full-depth book: every resting price level on each side.
pub fn render_book(book: &OrderBook, instrument_label: &str, publisher_label: &str) -> String {
    let mut out = header(instrument_label, publisher_label, book.ts_last_update);

    for (price, _count, depth) in book.offers_asc().rev() {
        out.push_str(&format!("{:>12.4} x {}\n", price as f64 / 1e9, depth));
    }
    out.push_str("------------\n");
    for (price, _count, depth) in book.bids_desc() {
        out.push_str(&format!("{:>12.4} x {}\n", price as f64 / 1e9, depth));
    }

    out
}

/// Renders a top-of-book book: the single resting quote on each side, if any.
pub fn render_tob(book: &TopOfBookBook, instrument_label: &str, publisher_label: &str) -> String {
    let mut out = header(instrument_label, publisher_label, book.ts_last_update);
    let (bid, offer) = crate::book::BookLike::bbo(book);

    match offer.price {
        Some(price) => out.push_str(&format!("{price:>12.4} x {}\n", offer.size)),
        None => out.push_str("           - x 0\n"),
    }
    out.push_str("------------\n");
    match bid.price {
        Some(price) => out.push_str(&format!("{price:>12.4} x {}\n", bid.size)),
        None => out.push_str("           - x 0\n"),
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::BookLike;
    use crate::types::{Action, Flags, Message, Price, RawSide};

    #[test]
    fn render_book_lists_offers_above_bids() {
        let mut book = OrderBook::new(7, 1);
        book.apply(&Message {
            action: Action::Add,
            side: RawSide::Bid,
            order_id: 1,
            price: Price(100_000_000_000),
            size: 5,
            publisher_id: 1,
            instrument_id: 7,
            ts_event: 1,
            ts_recv: 1,
            flags: Flags::F_LAST,
        })
        .unwrap();
        book.apply(&Message {
            action: Action::Add,
            side: RawSide::Ask,
            order_id: 2,
            price: Price(101_000_000_000),
            size: 3,
            publisher_id: 1,
            instrument_id: 7,
            ts_event: 2,
            ts_recv: 2,
            flags: Flags::F_LAST,
        })
        .unwrap();

        let rendered = render_book(&book, "AAPL", "XNAS");
        let offer_line = rendered.lines().position(|l| l.contains("101.0000")).unwrap();
        let bid_line = rendered.lines().position(|l| l.contains("100.0000")).unwrap();
        assert!(offer_line < bid_line);
    }

    #[test]
    fn render_tob_shows_dash_for_empty_side() {
        let book = TopOfBookBook::new(7, 1);
        let rendered = render_tob(&book, "AAPL", "XNAS");
        assert_eq!(rendered.lines().filter(|l| l.contains("- x 0")).count(), 2);
    }
}
