//! Scripted demo: feeds a handful of MBO records through a `Market` and
//! prints the rendered book/BBO after each scenario.

use orderbook::types::{Flags, MboRecord, Record, SymbolMapping};
use orderbook::{render, Market};

fn mbo(
    action: char,
    side: char,
    order_id: u64,
    price: i64,
    size: u32,
    publisher_id: u16,
    instrument_id: u32,
    ts: u64,
    flags: Flags,
) -> Record {
    Record::Mbo(MboRecord {
        action,
        side,
        order_id,
        price,
        size,
        publisher_id,
        instrument_id,
        ts_event: ts,
        ts_recv: ts,
        flags,
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    println!("=== MBO Engine Demo ===");

    let mut market = Market::new();
    market.apply(Record::SymbolMapping(SymbolMapping {
        instrument_id: 1,
        stype_out_symbol: "AAPL".into(),
    }))?;

    println!("\n-- Add + BBO --");
    market.apply(mbo('A', 'B', 1, 100_000_000_000, 5, 1, 1, 1, Flags::F_LAST))?;
    print_book(&market, 1, "NASDAQ");

    println!("\n-- Stacked priority at one price --");
    market.apply(mbo('A', 'B', 2, 100_000_000_000, 3, 1, 1, 2, Flags::F_LAST))?;
    market.apply(mbo('A', 'B', 3, 100_000_000_000, 7, 1, 1, 3, Flags::F_LAST))?;
    print_book(&market, 1, "NASDAQ");

    println!("\n-- Partial cancel --");
    market.apply(mbo('C', 'N', 1, 0, 2, 1, 1, 4, Flags::F_LAST))?;
    print_book(&market, 1, "NASDAQ");

    println!("\n-- Modify price loses priority --");
    market.apply(mbo('M', 'B', 2, 99_990_000_000, 3, 1, 1, 5, Flags::F_LAST))?;
    print_book(&market, 1, "NASDAQ");

    println!("\n-- Consolidated BBO across exchanges --");
    market.apply(mbo('A', 'B', 100, 100_050_000_000, 4, 2, 1, 6, Flags::F_LAST))?;
    market.apply(mbo('A', 'A', 101, 100_200_000_000, 3, 2, 1, 7, Flags::F_LAST))?;
    market.apply(mbo('A', 'A', 102, 100_100_000_000, 8, 1, 1, 8, Flags::F_LAST))?;
    let (bid, offer) = market.bbo(1, None);
    println!(
        "consolidated bbo: bid={:?} offer={:?} is_ready={}",
        bid,
        offer,
        market.is_ready()
    );

    println!("\n-- Clear --");
    market.apply(mbo('R', 'N', 0, 0, 0, 1, 1, 9, Flags::F_LAST))?;
    print_book(&market, 1, "NASDAQ");

    println!("\n-- TopOfBook pairing --");
    market.apply(mbo('A', 'B', 0, 50_000_000_000, 200, 3, 2, 10, Flags::F_TOB))?;
    println!("after first leg, is_ready={}", market.is_ready());
    market.apply(mbo(
        'A',
        'A',
        0,
        50_050_000_000,
        300,
        3,
        2,
        11,
        Flags::F_TOB | Flags::F_LAST,
    ))?;
    println!("after second leg, is_ready={}", market.is_ready());
    let book = market.get_order_book(3, 2);
    if let Some(tob) = book.as_top_of_book() {
        print!("{}", render::render_tob(tob, "MSFT", "CBOE"));
    }

    Ok(())
}

fn print_book(market: &Market, instrument_id: u32, publisher_label: &str) {
    let book = market.get_order_book(1, instrument_id);
    if let Some(full) = book.as_full() {
        print!("{}", render::render_book(full, "AAPL", publisher_label));
    }
}
