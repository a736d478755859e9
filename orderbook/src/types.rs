//! Wire-adjacent types: the decoded record shapes the engine accepts, and
//! the normalized `Message` the book state machine actually operates on.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Sentinel raw price meaning "no price" (the Databento convention).
pub const UNDEF_PRICE: i64 = i64::MAX;

bitflags::bitflags! {
    /// Only two bits of the wire flags byte matter to this engine.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Flags: u8 {
        /// Record belongs to a top-of-book feed.
        const F_TOB = 0b0100_0000;
        /// Final record of a logical batch; drives `Market::is_ready`.
        const F_LAST = 0b1000_0000;
    }
}

/// A price, kept as the raw fixed-point integer (scale 1e9) that arrives on
/// the wire. Comparisons and map keys use this integer directly; the
/// rescale to a decimal happens only when a price is handed to a caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Price(pub i64);

impl Price {
    /// The `UNDEF_PRICE` sentinel, round-tripped unchanged.
    pub const UNDEF: Price = Price(UNDEF_PRICE);

    /// Wraps a raw fixed-point price as read off the wire.
    pub fn from_raw(raw: i64) -> Self {
        Price(raw)
    }

    /// True when this price is the `UNDEF_PRICE` sentinel.
    pub fn is_undef(self) -> bool {
        self.0 == UNDEF_PRICE
    }

    /// Rescales to a decimal price, or `None` for `UNDEF_PRICE`.
    pub fn to_decimal(self) -> Option<f64> {
        if self.is_undef() {
            None
        } else {
            Some(self.0 as f64 / 1e9)
        }
    }
}

/// The side a resting order sits on. Unlike [`RawSide`], this has no `None`
/// variant: every node in a book has a concrete side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Bid,
    Ask,
}

/// The side alphabet as it appears on the wire: `{A, B, N}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawSide {
    Bid,
    Ask,
    None,
}

impl RawSide {
    /// Parses the wire side character.
    pub fn from_char(c: char) -> Result<Self> {
        match c {
            'B' => Ok(RawSide::Bid),
            'A' => Ok(RawSide::Ask),
            'N' => Ok(RawSide::None),
            other => Err(EngineError::InvalidSide(other)),
        }
    }

    /// Narrows to a concrete [`Side`], failing on `RawSide::None`.
    pub fn to_side(self) -> Result<Side> {
        match self {
            RawSide::Bid => Ok(Side::Bid),
            RawSide::Ask => Ok(Side::Ask),
            RawSide::None => Err(EngineError::InvalidSide('N')),
        }
    }

    pub fn as_char(self) -> char {
        match self {
            RawSide::Bid => 'B',
            RawSide::Ask => 'A',
            RawSide::None => 'N',
        }
    }
}

/// The action alphabet: `{A, C, M, R, T, F, N}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Add,
    Cancel,
    Modify,
    Clear,
    Trade,
    Fill,
    None,
}

impl Action {
    /// Parses the wire action character.
    pub fn from_char(c: char) -> Result<Self> {
        match c {
            'A' => Ok(Action::Add),
            'C' => Ok(Action::Cancel),
            'M' => Ok(Action::Modify),
            'R' => Ok(Action::Clear),
            'T' => Ok(Action::Trade),
            'F' => Ok(Action::Fill),
            'N' => Ok(Action::None),
            other => Err(EngineError::InvalidAction(other)),
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Action::Add => 'A',
            Action::Cancel => 'C',
            Action::Modify => 'M',
            Action::Clear => 'R',
            Action::Trade => 'T',
            Action::Fill => 'F',
            Action::None => 'N',
        }
    }
}

/// A decoded, validated MBO message, ready for `Market`/`OrderBook::apply`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub action: Action,
    pub side: RawSide,
    pub order_id: u64,
    pub price: Price,
    pub size: u32,
    pub publisher_id: u16,
    pub instrument_id: u32,
    pub ts_event: u64,
    pub ts_recv: u64,
    pub flags: Flags,
}

/// Raw MBO record as handed to the engine by the (external) decoder: action
/// and side are still wire characters, price is still a raw fixed-point
/// integer.
#[derive(Clone, Debug, PartialEq)]
pub struct MboRecord {
    pub action: char,
    pub side: char,
    pub order_id: u64,
    pub price: i64,
    pub size: u32,
    pub publisher_id: u16,
    pub instrument_id: u32,
    pub ts_event: u64,
    pub ts_recv: u64,
    pub flags: Flags,
}

impl TryFrom<MboRecord> for Message {
    type Error = EngineError;

    fn try_from(r: MboRecord) -> Result<Self> {
        Ok(Message {
            action: Action::from_char(r.action)?,
            side: RawSide::from_char(r.side)?,
            order_id: r.order_id,
            price: Price::from_raw(r.price),
            size: r.size,
            publisher_id: r.publisher_id,
            instrument_id: r.instrument_id,
            ts_event: r.ts_event,
            ts_recv: r.ts_recv,
            flags: r.flags,
        })
    }
}

/// Instrument id to output symbol mapping. Updates `Market::symbology` only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolMapping {
    pub instrument_id: u32,
    pub stype_out_symbol: String,
}

/// Opaque heartbeat/system record; `Market::apply` ignores it.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SystemRecord {
    pub note: String,
}

/// The three record shapes `Market::apply` accepts.
#[derive(Clone, Debug, PartialEq)]
pub enum Record {
    SymbolMapping(SymbolMapping),
    Mbo(MboRecord),
    System(SystemRecord),
}

/// Best bid or offer at an instant: an optional decimal price and the
/// aggregate depth at that price (zero when the side is empty).
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct BestBidOffer {
    pub price: Option<f64>,
    pub size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_rescales_except_undef() {
        assert_eq!(Price::from_raw(100_000_000_000).to_decimal(), Some(100.0));
        assert_eq!(Price::UNDEF.to_decimal(), None);
        assert!(Price::UNDEF.is_undef());
    }

    #[test]
    fn action_round_trips_through_char() {
        for c in ['A', 'C', 'M', 'R', 'T', 'F', 'N'] {
            assert_eq!(Action::from_char(c).unwrap().as_char(), c);
        }
        assert!(matches!(Action::from_char('X'), Err(EngineError::InvalidAction('X'))));
    }

    #[test]
    fn raw_side_narrows_to_side() {
        assert_eq!(RawSide::Bid.to_side().unwrap(), Side::Bid);
        assert_eq!(RawSide::Ask.to_side().unwrap(), Side::Ask);
        assert!(RawSide::None.to_side().is_err());
    }

    #[test]
    fn flags_bits_match_wire_values() {
        assert_eq!(Flags::F_TOB.bits(), 64);
        assert_eq!(Flags::F_LAST.bits(), 128);
    }
}
