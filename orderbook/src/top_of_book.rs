//! Top-of-book (BBO-only) book: a direct feed of best bid/offer updates,
//! where each `Add` replaces the resting quote on its side outright instead
//! of joining a priority queue.

use crate::book::BookLike;
use crate::error::{EngineError, Result};
use crate::types::{Action, BestBidOffer, Flags, Message, Side};

/// One side's resting top-of-book quote, or none if the side is flat.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Quote {
    price: Option<i64>,
    size: u64,
}

/// Top-of-book book for one (publisher, instrument) pair.
#[derive(Clone, Debug)]
pub struct TopOfBookBook {
    pub instrument_id: u32,
    pub publisher_id: u16,
    bid: Quote,
    offer: Quote,
    pub ts_last_update: u64,
    pub update_count: u64,
}

impl TopOfBookBook {
    pub fn new(instrument_id: u32, publisher_id: u16) -> Self {
        Self {
            instrument_id,
            publisher_id,
            bid: Quote::default(),
            offer: Quote::default(),
            ts_last_update: 0,
            update_count: 0,
        }
    }

    fn clear(&mut self) {
        self.bid = Quote::default();
        self.offer = Quote::default();
    }

    fn add(&mut self, msg: &Message) -> Result<()> {
        if !msg.flags.contains(Flags::F_TOB) {
            return Err(EngineError::FlagMisuse(
                "top-of-book add is missing the F_TOB flag".into(),
            ));
        }
        let side = msg.side.to_side()?;
        let quote = Quote {
            price: if msg.price.is_undef() { None } else { Some(msg.price.0) },
            size: u64::from(msg.size),
        };
        match side {
            Side::Bid => self.bid = quote,
            Side::Ask => self.offer = quote,
        }

        // Mid-pair: the partner record for the other side hasn't landed yet,
        // so that side is stale until it does. Wipe it rather than serve it.
        if !msg.flags.contains(Flags::F_LAST) {
            match side {
                Side::Bid => self.offer = Quote::default(),
                Side::Ask => self.bid = Quote::default(),
            }
        }
        Ok(())
    }
}

impl BookLike for TopOfBookBook {
    fn apply(&mut self, msg: &Message) -> Result<()> {
        match msg.action {
            Action::Trade | Action::None => {}
            Action::Clear => self.clear(),
            Action::Add => self.add(msg)?,
            other => {
                return Err(EngineError::InvalidAction(other.as_char()));
            }
        }

        self.ts_last_update = msg.ts_recv;
        self.update_count += 1;
        Ok(())
    }

    fn bbo(&self) -> (BestBidOffer, BestBidOffer) {
        let bid = BestBidOffer {
            price: self.bid.price.map(|p| p as f64 / 1e9),
            size: self.bid.size,
        };
        let offer = BestBidOffer {
            price: self.offer.price.map(|p| p as f64 / 1e9),
            size: self.offer.size,
        };
        (bid, offer)
    }

    fn ts_last_update(&self) -> u64 {
        self.ts_last_update
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Price, RawSide};

    fn tob_add(side: RawSide, price: i64, size: u32, ts: u64) -> Message {
        Message {
            action: Action::Add,
            side,
            order_id: 0,
            price: Price(price),
            size,
            publisher_id: 1,
            instrument_id: 1,
            ts_event: ts,
            ts_recv: ts,
            flags: Flags::F_TOB | Flags::F_LAST,
        }
    }

    #[test]
    fn add_replaces_resting_quote_outright() {
        let mut book = TopOfBookBook::new(1, 1);
        book.apply(&tob_add(RawSide::Bid, 100, 5, 1)).unwrap();
        book.apply(&tob_add(RawSide::Bid, 101, 9, 2)).unwrap();

        let (bid, _) = book.bbo();
        assert_eq!(bid.price, Some(101.0));
        assert_eq!(bid.size, 9);
    }

    #[test]
    fn add_without_tob_flag_errors() {
        let mut book = TopOfBookBook::new(1, 1);
        let mut msg = tob_add(RawSide::Bid, 100, 5, 1);
        msg.flags = Flags::F_LAST;

        let err = book.apply(&msg).unwrap_err();
        assert!(matches!(err, EngineError::FlagMisuse(_)));
    }

    #[test]
    fn cancel_or_modify_is_rejected() {
        let mut book = TopOfBookBook::new(1, 1);
        let msg = Message {
            action: Action::Cancel,
            ..tob_add(RawSide::Bid, 100, 5, 1)
        };
        let err = book.apply(&msg).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAction('C')));
    }

    #[test]
    fn fill_action_is_rejected() {
        let mut book = TopOfBookBook::new(1, 1);
        let msg = Message {
            action: Action::Fill,
            ..tob_add(RawSide::Bid, 100, 5, 1)
        };
        let err = book.apply(&msg).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAction('F')));
    }

    #[test]
    fn clear_flattens_both_sides() {
        let mut book = TopOfBookBook::new(1, 1);
        book.apply(&tob_add(RawSide::Bid, 100, 5, 1)).unwrap();
        book.apply(&tob_add(RawSide::Ask, 101, 5, 2)).unwrap();

        let clear = Message {
            action: Action::Clear,
            side: RawSide::None,
            ..tob_add(RawSide::Bid, 100, 5, 3)
        };
        book.apply(&clear).unwrap();

        let (bid, offer) = book.bbo();
        assert_eq!(bid.price, None);
        assert_eq!(offer.price, None);
    }

    #[test]
    fn non_final_record_wipes_the_other_side_pending_its_partner() {
        let mut book = TopOfBookBook::new(1, 1);
        // A prior pair has already populated both sides.
        book.apply(&tob_add(RawSide::Bid, 100, 5, 1)).unwrap();
        let mut first_leg = tob_add(RawSide::Ask, 101, 5, 2);
        first_leg.flags = Flags::F_TOB;
        book.apply(&first_leg).unwrap();

        let mut record1 = tob_add(RawSide::Bid, 50_000_000_000, 200, 3);
        record1.flags = Flags::F_TOB;
        book.apply(&record1).unwrap();

        let (bid, offer) = book.bbo();
        assert_eq!(bid.price, Some(50.0));
        assert_eq!(bid.size, 200);
        assert_eq!(offer.price, None, "offer should be wiped pending its partner record");

        let mut record2 = tob_add(RawSide::Ask, 50_050_000_000, 300, 4);
        record2.flags = Flags::F_TOB | Flags::F_LAST;
        book.apply(&record2).unwrap();

        let (bid, offer) = book.bbo();
        assert_eq!(bid.price, Some(50.0));
        assert_eq!(bid.size, 200);
        assert_eq!(offer.price, Some(50.05));
        assert_eq!(offer.size, 300);
    }

    #[test]
    fn trade_is_a_no_op() {
        let mut book = TopOfBookBook::new(1, 1);
        book.apply(&tob_add(RawSide::Bid, 100, 5, 1)).unwrap();

        let trade = Message {
            action: Action::Trade,
            ..tob_add(RawSide::Bid, 999, 999, 2)
        };
        book.apply(&trade).unwrap();

        let (bid, _) = book.bbo();
        assert_eq!(bid.price, Some(100.0));
    }
}
