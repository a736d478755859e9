//! Full-depth (L3) order book: one resting-order queue per price, on each
//! side, with O(1) lookup from order id to its node.

use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::arena::{NodeArena, NodeHandle, OrderNode};
use crate::error::{EngineError, Result};
use crate::price_level::PriceLevelQueue;
use crate::top_of_book::TopOfBookBook;
use crate::types::{Action, BestBidOffer, Flags, Message, Side};

/// Behaviour shared by [`OrderBook`] and `TopOfBookBook`, so `Market` can
/// hold either behind one enum without duplicating its routing logic.
pub trait BookLike {
    fn apply(&mut self, msg: &Message) -> Result<()>;
    fn bbo(&self) -> (BestBidOffer, BestBidOffer);
    fn ts_last_update(&self) -> u64;
}

/// Full-depth order book for one (publisher, instrument) pair.
#[derive(Clone, Debug)]
pub struct OrderBook {
    pub instrument_id: u32,
    pub publisher_id: u16,
    arena: NodeArena,
    /// Low to high; the last entry is the best bid.
    bids: BTreeMap<i64, PriceLevelQueue>,
    /// Low to high; the first entry is the best offer.
    offers: BTreeMap<i64, PriceLevelQueue>,
    orders: HashMap<u64, NodeHandle>,
    pub ts_last_update: u64,
    pub update_count: u64,
}

impl OrderBook {
    pub fn new(instrument_id: u32, publisher_id: u16) -> Self {
        Self {
            instrument_id,
            publisher_id,
            arena: NodeArena::new(),
            bids: BTreeMap::new(),
            offers: BTreeMap::new(),
            orders: HashMap::new(),
            ts_last_update: 0,
            update_count: 0,
        }
    }

    pub fn num_orders(&self) -> usize {
        self.orders.len()
    }

    /// Bids from best (highest) to worst, for display.
    pub fn bids_desc(&self) -> impl DoubleEndedIterator<Item = (i64, u32, u64)> + '_ {
        self.bids.iter().rev().map(|(px, l)| (*px, l.num_orders(), l.depth()))
    }

    /// Offers from best (lowest) to worst, for display.
    pub fn offers_asc(&self) -> impl DoubleEndedIterator<Item = (i64, u32, u64)> + '_ {
        self.offers.iter().map(|(px, l)| (*px, l.num_orders(), l.depth()))
    }

    fn side_levels_mut(&mut self, side: Side) -> &mut BTreeMap<i64, PriceLevelQueue> {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.offers,
        }
    }

    fn clear(&mut self) {
        self.bids.clear();
        self.offers.clear();
        self.orders.clear();
        self.arena = NodeArena::new();
    }

    fn add(&mut self, msg: &Message) -> Result<()> {
        if self.orders.contains_key(&msg.order_id) {
            return Err(EngineError::DuplicateOrder(msg.order_id));
        }
        if msg.price.is_undef() {
            return Err(EngineError::InvariantViolation(format!(
                "add for order {} carries UNDEF_PRICE",
                msg.order_id
            )));
        }
        let side = msg.side.to_side()?;

        let node = OrderNode {
            order_id: msg.order_id,
            price: msg.price,
            size: msg.size,
            side,
            publisher_id: msg.publisher_id,
            instrument_id: msg.instrument_id,
            ts_recv: msg.ts_recv,
            prev: None,
            next: None,
        };

        let level = self
            .side_levels_mut(side)
            .entry(msg.price.0)
            .or_insert_with(PriceLevelQueue::new);
        let handle = level.append(&mut self.arena, node);
        self.orders.insert(msg.order_id, handle);

        tracing::debug!(
            order_id = msg.order_id,
            price = msg.price.0,
            size = msg.size,
            side = ?side,
            "order added"
        );
        Ok(())
    }

    fn cancel(&mut self, msg: &Message) -> Result<()> {
        let handle = *self
            .orders
            .get(&msg.order_id)
            .ok_or(EngineError::UnknownOrder(msg.order_id))?;
        let (side, price) = {
            let node = self.arena.get(handle);
            (node.side, node.price)
        };

        let levels = self.side_levels_mut(side);
        let level = levels
            .get_mut(&price.0)
            .expect("indexed order must have a price level");
        let consumed = level.remove(&mut self.arena, handle, msg.size)?;

        if consumed {
            self.orders.remove(&msg.order_id);
            if level.is_empty() {
                levels.remove(&price.0);
            }
            tracing::debug!(order_id = msg.order_id, "order fully cancelled");
        } else {
            self.arena.get_mut(handle).ts_recv = msg.ts_recv;
            tracing::debug!(order_id = msg.order_id, remaining = msg.size, "order partially cancelled");
        }
        Ok(())
    }

    fn modify(&mut self, msg: &Message) -> Result<()> {
        let handle = *self
            .orders
            .get(&msg.order_id)
            .ok_or(EngineError::UnknownOrder(msg.order_id))?;
        let (node_side, node_price, node_size) = {
            let node = self.arena.get(handle);
            (node.side, node.price, node.size)
        };
        let msg_side = msg.side.to_side()?;
        if msg_side != node_side {
            return Err(EngineError::InvariantViolation(format!(
                "modify cannot move order {} to a different side",
                msg.order_id
            )));
        }

        if msg.price != node_price || msg.size > node_size {
            // Price change or size increase: priority lost, cancel and replace.
            let full_cancel = Message {
                size: node_size,
                ..msg.clone()
            };
            self.cancel(&full_cancel)?;
            let replacement = Message {
                action: Action::Add,
                ..msg.clone()
            };
            self.add(&replacement)?;
        } else if msg.size < node_size {
            let levels = self.side_levels_mut(node_side);
            let level = levels
                .get_mut(&node_price.0)
                .expect("indexed order must have a price level");
            level.remove(&mut self.arena, handle, node_size - msg.size)?;
            self.arena.get_mut(handle).ts_recv = msg.ts_recv;
        } else {
            // Same price, same size: no share movement, time stamp bump only.
            self.arena.get_mut(handle).ts_recv = msg.ts_recv;
        }
        Ok(())
    }
}

impl BookLike for OrderBook {
    #[tracing::instrument(skip(self, msg), fields(order_id = msg.order_id, action = ?msg.action))]
    fn apply(&mut self, msg: &Message) -> Result<()> {
        if msg.flags.contains(Flags::F_TOB) {
            return Err(EngineError::FlagMisuse(
                "full-depth book received a message flagged F_TOB".into(),
            ));
        }

        match msg.action {
            Action::Trade | Action::Fill | Action::None => {}
            Action::Clear => self.clear(),
            Action::Add => self.add(msg)?,
            Action::Cancel => self.cancel(msg)?,
            Action::Modify => self.modify(msg)?,
        }

        self.ts_last_update = msg.ts_recv;
        self.update_count += 1;
        Ok(())
    }

    fn bbo(&self) -> (BestBidOffer, BestBidOffer) {
        let best_bid = self
            .bids
            .iter()
            .next_back()
            .map(|(px, level)| BestBidOffer {
                price: crate::types::Price(*px).to_decimal(),
                size: level.depth(),
            })
            .unwrap_or_default();

        let best_offer = self
            .offers
            .iter()
            .next()
            .map(|(px, level)| BestBidOffer {
                price: crate::types::Price(*px).to_decimal(),
                size: level.depth(),
            })
            .unwrap_or_default();

        (best_bid, best_offer)
    }

    fn ts_last_update(&self) -> u64 {
        self.ts_last_update
    }
}

/// Either book variant a `Market` entry can hold, chosen on the first `Add`
/// for that (publisher, instrument) pair by whether it carries `F_TOB`.
#[derive(Clone, Debug)]
pub enum Book {
    Full(OrderBook),
    TopOfBook(TopOfBookBook),
}

impl Book {
    pub fn instrument_id(&self) -> u32 {
        match self {
            Book::Full(b) => b.instrument_id,
            Book::TopOfBook(b) => b.instrument_id,
        }
    }

    pub fn publisher_id(&self) -> u16 {
        match self {
            Book::Full(b) => b.publisher_id,
            Book::TopOfBook(b) => b.publisher_id,
        }
    }

    pub fn update_count(&self) -> u64 {
        match self {
            Book::Full(b) => b.update_count,
            Book::TopOfBook(b) => b.update_count,
        }
    }

    /// Borrows the full-depth book, if this entry is one.
    pub fn as_full(&self) -> Option<&OrderBook> {
        match self {
            Book::Full(b) => Some(b),
            Book::TopOfBook(_) => None,
        }
    }

    /// Borrows the top-of-book book, if this entry is one.
    pub fn as_top_of_book(&self) -> Option<&TopOfBookBook> {
        match self {
            Book::Full(_) => None,
            Book::TopOfBook(b) => Some(b),
        }
    }
}

impl BookLike for Book {
    fn apply(&mut self, msg: &Message) -> Result<()> {
        match self {
            Book::Full(b) => b.apply(msg),
            Book::TopOfBook(b) => b.apply(msg),
        }
    }

    fn bbo(&self) -> (BestBidOffer, BestBidOffer) {
        match self {
            Book::Full(b) => b.bbo(),
            Book::TopOfBook(b) => b.bbo(),
        }
    }

    fn ts_last_update(&self) -> u64 {
        match self {
            Book::Full(b) => b.ts_last_update(),
            Book::TopOfBook(b) => b.ts_last_update(),
        }
    }
}
