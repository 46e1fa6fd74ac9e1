/// Nanoseconds per hour-of-day bucket.
pub const NS_PER_HOUR: u64 = 3_600_000_000_000;

/// A decoded ITCH 5.0 message relevant to trade aggregation.
///
/// One variant per wire tag. Every variant carries the security id from the
/// stock-locate field and the feed timestamp (nanoseconds after midnight
/// Eastern). Prices are unsigned fixed-point with four implied decimals, as
/// on the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItchEvent {
    /// `R` – Stock Directory: registers a security for the session.
    StockDirectory {
        stock_id: u16,
        timestamp_ns: u64,
        symbol: String,
    },
    /// `A` – Add Order (no attribution).
    AddOrder {
        stock_id: u16,
        timestamp_ns: u64,
        order_id: u64,
        shares: u32,
        price: u32,
    },
    /// `F` – Add Order with MPID attribution (attribution ignored).
    AddOrderAttributed {
        stock_id: u16,
        timestamp_ns: u64,
        order_id: u64,
        shares: u32,
        price: u32,
    },
    /// `E` – Order Executed: trade at the resting order's price.
    OrderExecuted {
        stock_id: u16,
        timestamp_ns: u64,
        order_id: u64,
        executed_shares: u32,
        match_number: u64,
    },
    /// `C` – Order Executed With Price: trade at an explicit price,
    /// counted only when printable.
    OrderExecutedWithPrice {
        stock_id: u16,
        timestamp_ns: u64,
        order_id: u64,
        executed_shares: u32,
        match_number: u64,
        printable: u8,
        exec_price: u32,
    },
    /// `U` – Order Replace: new id and price supersede the original order.
    OrderReplace {
        stock_id: u16,
        timestamp_ns: u64,
        orig_order_id: u64,
        new_order_id: u64,
        shares: u32,
        price: u32,
    },
    /// `P` – Trade (non-cross): carries its own price and size.
    NonCrossTrade {
        stock_id: u16,
        timestamp_ns: u64,
        order_id: u64,
        shares: u32,
        price: u32,
        match_number: u64,
    },
    /// `Q` – Cross Trade: auction print, aggregate size is 64-bit.
    CrossTrade {
        stock_id: u16,
        timestamp_ns: u64,
        shares: u64,
        cross_price: u32,
        match_number: u64,
    },
    /// `B` – Broken Trade: retroactively cancels a prior match.
    BrokenTrade {
        stock_id: u16,
        timestamp_ns: u64,
        match_number: u64,
    },
}

impl ItchEvent {
    /// The wire tag this event was decoded from.
    #[inline]
    pub fn tag(&self) -> u8 {
        match self {
            ItchEvent::StockDirectory { .. } => b'R',
            ItchEvent::AddOrder { .. } => b'A',
            ItchEvent::AddOrderAttributed { .. } => b'F',
            ItchEvent::OrderExecuted { .. } => b'E',
            ItchEvent::OrderExecutedWithPrice { .. } => b'C',
            ItchEvent::OrderReplace { .. } => b'U',
            ItchEvent::NonCrossTrade { .. } => b'P',
            ItchEvent::CrossTrade { .. } => b'Q',
            ItchEvent::BrokenTrade { .. } => b'B',
        }
    }

    #[inline]
    pub fn stock_id(&self) -> u16 {
        match self {
            ItchEvent::StockDirectory { stock_id, .. }
            | ItchEvent::AddOrder { stock_id, .. }
            | ItchEvent::AddOrderAttributed { stock_id, .. }
            | ItchEvent::OrderExecuted { stock_id, .. }
            | ItchEvent::OrderExecutedWithPrice { stock_id, .. }
            | ItchEvent::OrderReplace { stock_id, .. }
            | ItchEvent::NonCrossTrade { stock_id, .. }
            | ItchEvent::CrossTrade { stock_id, .. }
            | ItchEvent::BrokenTrade { stock_id, .. } => *stock_id,
        }
    }

    #[inline]
    pub fn timestamp_ns(&self) -> u64 {
        match self {
            ItchEvent::StockDirectory { timestamp_ns, .. }
            | ItchEvent::AddOrder { timestamp_ns, .. }
            | ItchEvent::AddOrderAttributed { timestamp_ns, .. }
            | ItchEvent::OrderExecuted { timestamp_ns, .. }
            | ItchEvent::OrderExecutedWithPrice { timestamp_ns, .. }
            | ItchEvent::OrderReplace { timestamp_ns, .. }
            | ItchEvent::NonCrossTrade { timestamp_ns, .. }
            | ItchEvent::CrossTrade { timestamp_ns, .. }
            | ItchEvent::BrokenTrade { timestamp_ns, .. } => *timestamp_ns,
        }
    }

    /// Hour-of-day bucket for this event (floor division), saturated at 24
    /// so a corrupt timestamp can never index past the per-day buckets.
    #[inline]
    pub fn hour(&self) -> u8 {
        (self.timestamp_ns() / NS_PER_HOUR).min(24) as u8
    }
}

/// Fixed body size (bytes after the 1-byte tag) for every known ITCH 5.0
/// tag. `None` means the tag is unknown and the feed cannot be re-framed.
///
/// The first group is decoded into [`ItchEvent`]s; the second group is
/// recognized only so the decoder can skip over it.
#[inline]
pub fn body_size(tag: u8) -> Option<usize> {
    Some(match tag {
        b'R' => 38, // Stock Directory
        b'A' => 35, // Add Order
        b'F' => 39, // Add Order w/ MPID
        b'E' => 30, // Order Executed
        b'C' => 35, // Order Executed w/ Price
        b'U' => 34, // Order Replace
        b'P' => 43, // Trade (non-cross)
        b'Q' => 39, // Cross Trade
        b'B' => 18, // Broken Trade

        b'S' => 11, // System Event
        b'H' => 24, // Stock Trading Action
        b'Y' => 19, // Reg SHO Restriction
        b'L' => 25, // Market Participant Position
        b'V' => 34, // MWCB Decline Level
        b'W' => 11, // MWCB Status
        b'K' => 27, // IPO Quoting Period Update
        b'J' => 34, // LULD Auction Collar
        b'h' => 20, // Operational Halt
        b'X' => 22, // Order Cancel
        b'D' => 18, // Order Delete
        b'I' => 49, // Net Order Imbalance Indicator
        b'N' => 19, // Retail Price Improvement Indicator
        b'O' => 47, // Direct Listing w/ Capital Raise
        _ => return None,
    })
}
