use std::collections::BTreeMap;
use std::io::Write;

use ahash::AHashMap;
use itch::ItchEvent;

use crate::writer::{OutputError, RowWriter};

const HOURS_PER_DAY: usize = 24;

/// Per-security running sums, one slot per hour of day. Volume and dollar
/// volume move in lockstep: every trade increments both, every break
/// decrements both.
#[derive(Clone, Copy, Debug, Default)]
struct HourBuckets {
    volume: [u64; HOURS_PER_DAY],
    /// Accumulated in wire units: price (1/10000 dollar) times shares.
    dollar_volume: [u64; HOURS_PER_DAY],
}

/// What a break needs to reverse a prior trade: the security, the fill
/// terms, and the hour the trade was booked into (not the break's hour).
#[derive(Clone, Copy, Debug)]
struct TradeFill {
    stock_id: u16,
    price: u32,
    shares: u64,
    hour: u8,
}

/// Counters for conditions that are handled silently per event.
#[derive(Clone, Copy, Debug, Default)]
pub struct EngineStats {
    pub events: u64,
    pub trades: u64,
    pub rows_emitted: u64,
    /// Executions referencing an order id with no recorded price (applied
    /// with price 0).
    pub unknown_order_refs: u64,
    /// Breaks whose match number was never seen (no-ops).
    pub unknown_breaks: u64,
    /// Non-printable `C` executions (excluded from VWAP).
    pub nonprintable_skips: u64,
}

/// Streaming hourly-VWAP aggregator.
///
/// Consumes [`ItchEvent`]s strictly in feed order. Rows for an hour are
/// emitted the first time an event from a later hour arrives, which leaves
/// a one-hour grace window for trade breaks; remaining hours are flushed by
/// [`VwapEngine::finish`] at end of stream.
pub struct VwapEngine {
    /// Ordered so emission walks securities in ascending id.
    symbols: BTreeMap<u16, String>,
    /// Resting price per live order id, fed by adds and replaces.
    order_price: AHashMap<u64, u32>,
    buckets: AHashMap<u16, HourBuckets>,
    match_index: AHashMap<u64, TradeFill>,
    /// Next unemitted hour; only ever advances.
    current_hour: u8,
    stats: EngineStats,
}

impl Default for VwapEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl VwapEngine {
    pub fn new() -> Self {
        Self {
            symbols: BTreeMap::new(),
            order_price: AHashMap::new(),
            buckets: AHashMap::new(),
            match_index: AHashMap::new(),
            current_hour: 0,
            stats: EngineStats::default(),
        }
    }

    #[inline]
    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    #[inline]
    pub fn current_hour(&self) -> u8 {
        self.current_hour
    }

    /// Apply one event, emitting VWAP rows first if it opens a later hour.
    pub fn apply<W: Write>(&mut self, event: ItchEvent, out: &mut RowWriter<W>) -> Result<(), OutputError> {
        self.stats.events += 1;
        let msg_hour = event.hour();
        while self.current_hour < msg_hour {
            self.emit_hour(self.current_hour, out)?;
            self.current_hour += 1;
        }

        match event {
            ItchEvent::StockDirectory { stock_id, symbol, .. } => {
                self.symbols.insert(stock_id, symbol);
                self.buckets.insert(stock_id, HourBuckets::default());
            }
            ItchEvent::AddOrder { order_id, price, .. }
            | ItchEvent::AddOrderAttributed { order_id, price, .. } => {
                // ids may be reused after deletes; last write wins
                self.order_price.insert(order_id, price);
            }
            ItchEvent::OrderReplace { orig_order_id, new_order_id, price, .. } => {
                self.order_price.remove(&orig_order_id);
                self.order_price.insert(new_order_id, price);
            }
            ItchEvent::OrderExecuted { stock_id, order_id, executed_shares, match_number, .. } => {
                let price = match self.order_price.get(&order_id) {
                    Some(p) => *p,
                    None => {
                        self.stats.unknown_order_refs += 1;
                        0
                    }
                };
                self.book_trade(stock_id, price, u64::from(executed_shares), match_number, msg_hour);
            }
            ItchEvent::OrderExecutedWithPrice {
                stock_id, executed_shares, match_number, printable, exec_price, ..
            } => {
                if printable == b'N' {
                    self.stats.nonprintable_skips += 1;
                } else {
                    self.book_trade(stock_id, exec_price, u64::from(executed_shares), match_number, msg_hour);
                }
            }
            ItchEvent::NonCrossTrade { stock_id, shares, price, match_number, .. } => {
                self.book_trade(stock_id, price, u64::from(shares), match_number, msg_hour);
            }
            ItchEvent::CrossTrade { stock_id, shares, cross_price, match_number, .. } => {
                self.book_trade(stock_id, cross_price, shares, match_number, msg_hour);
            }
            ItchEvent::BrokenTrade { match_number, .. } => {
                let Some(fill) = self.match_index.get(&match_number).copied() else {
                    self.stats.unknown_breaks += 1;
                    return Ok(());
                };
                // reverse into the hour the trade was booked into, which may
                // already be behind the watermark
                if let Some(b) = self.buckets.get_mut(&fill.stock_id) {
                    let h = fill.hour as usize;
                    b.volume[h] -= fill.shares;
                    b.dollar_volume[h] -= u64::from(fill.price) * fill.shares;
                }
            }
        }
        Ok(())
    }

    /// Emit every hour not yet flushed. Call once the stream is exhausted.
    pub fn finish<W: Write>(&mut self, out: &mut RowWriter<W>) -> Result<(), OutputError> {
        while (self.current_hour as usize) < HOURS_PER_DAY {
            self.emit_hour(self.current_hour, out)?;
            self.current_hour += 1;
        }
        Ok(())
    }

    fn book_trade(&mut self, stock_id: u16, price: u32, shares: u64, match_number: u64, hour: u8) {
        let h = hour as usize;
        if h >= HOURS_PER_DAY {
            // timestamp past end of day; such an event moves the watermark only
            return;
        }
        let b = self.buckets.entry(stock_id).or_default();
        b.volume[h] += shares;
        b.dollar_volume[h] += u64::from(price) * shares;
        self.match_index
            .insert(match_number, TradeFill { stock_id, price, shares, hour });
        self.stats.trades += 1;
    }

    fn emit_hour<W: Write>(&mut self, hour: u8, out: &mut RowWriter<W>) -> Result<(), OutputError> {
        let h = hour as usize;
        for (&stock_id, symbol) in &self.symbols {
            let Some(b) = self.buckets.get(&stock_id) else { continue };
            let volume = b.volume[h];
            if volume == 0 {
                continue;
            }
            let vwap = b.dollar_volume[h] as f64 / 10_000.0 / volume as f64;
            out.row(symbol, stock_id, hour, vwap)?;
            self.stats.rows_emitted += 1;
        }
        tracing::info!(hour, "hour complete");
        Ok(())
    }
}
