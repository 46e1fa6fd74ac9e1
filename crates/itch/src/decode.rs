use thiserror::Error;

use crate::messages::{body_size, ItchEvent};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("truncated record at offset {offset}: tag '{tag}' needs {needed} more bytes, {available} remain")]
    TruncatedRecord {
        offset: usize,
        tag: char,
        needed: usize,
        available: usize,
    },
    #[error("unknown message tag 0x{tag:02x} at offset {offset}; cannot re-frame the feed")]
    UnknownTag { tag: u8, offset: usize },
}

/// Sequential decoder over a contiguous ITCH 5.0 byte view.
///
/// Records are framed only by their 1-byte tag and the fixed body size from
/// [`body_size`]. The decoder materializes the trade-relevant messages and
/// silently steps over the rest; it never copies payload bytes it does not
/// keep. All multi-byte integers on the wire are big-endian.
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Byte offset of the next unread record.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Decode forward to the next trade-relevant event.
    ///
    /// Returns `Ok(None)` once the view is exhausted on a record boundary.
    /// A tag with no known size, or a record extending past the end of the
    /// view, is unrecoverable: no further framing is possible.
    pub fn next_event(&mut self) -> Result<Option<ItchEvent>, DecodeError> {
        loop {
            if self.pos >= self.buf.len() {
                return Ok(None);
            }
            let offset = self.pos;
            let tag = self.buf[offset];
            let body = body_size(tag).ok_or(DecodeError::UnknownTag { tag, offset })?;
            let needed = 1 + body;
            let available = self.buf.len() - offset;
            if available < needed {
                return Err(DecodeError::TruncatedRecord {
                    offset,
                    tag: tag as char,
                    needed,
                    available,
                });
            }

            let record = &self.buf[offset + 1..offset + needed];
            self.pos += needed;

            if let Some(event) = decode_record(tag, record) {
                return Ok(Some(event));
            }
            // recognized but irrelevant tag: keep walking
        }
    }
}

// ---------- field extraction ----------

/// Cursor over one record body. Bounds are guaranteed by the size check in
/// `next_event`, so reads index the slice directly.
struct Fields<'a> {
    body: &'a [u8],
    off: usize,
}

impl<'a> Fields<'a> {
    #[inline]
    fn new(body: &'a [u8]) -> Self {
        Self { body, off: 0 }
    }

    #[inline]
    fn skip(&mut self, n: usize) {
        self.off += n;
    }

    #[inline]
    fn u16(&mut self) -> u16 {
        let mut raw = [0u8; 2];
        raw.copy_from_slice(&self.body[self.off..self.off + 2]);
        self.off += 2;
        u16::from_be_bytes(raw)
    }

    #[inline]
    fn u32(&mut self) -> u32 {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.body[self.off..self.off + 4]);
        self.off += 4;
        u32::from_be_bytes(raw)
    }

    #[inline]
    fn u64(&mut self) -> u64 {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&self.body[self.off..self.off + 8]);
        self.off += 8;
        u64::from_be_bytes(raw)
    }

    #[inline]
    fn byte(&mut self) -> u8 {
        let v = self.body[self.off];
        self.off += 1;
        v
    }

    /// 6-byte big-endian timestamp, right-aligned into a u64.
    #[inline]
    fn timestamp(&mut self) -> u64 {
        let mut v = 0u64;
        for &b in &self.body[self.off..self.off + 6] {
            v = (v << 8) | u64::from(b);
        }
        self.off += 6;
        v
    }

    /// 8-byte ASCII symbol, trailing spaces and NULs stripped. Interior
    /// whitespace is preserved.
    fn symbol(&mut self) -> String {
        let raw = &self.body[self.off..self.off + 8];
        self.off += 8;
        let end = raw
            .iter()
            .rposition(|&c| c != b' ' && c != 0)
            .map_or(0, |i| i + 1);
        String::from_utf8_lossy(&raw[..end]).into_owned()
    }
}

/// Decode one record body (bytes after the tag) into an event, or `None`
/// for tags the pipeline only skips.
fn decode_record(tag: u8, record: &[u8]) -> Option<ItchEvent> {
    let mut f = Fields::new(record);
    // common header: stock locate, tracking number (skipped), timestamp
    let stock_id = f.u16();
    f.skip(2);
    let timestamp_ns = f.timestamp();

    let event = match tag {
        b'R' => ItchEvent::StockDirectory {
            stock_id,
            timestamp_ns,
            symbol: f.symbol(),
        },
        b'A' | b'F' => {
            let order_id = f.u64();
            f.skip(1); // side
            let shares = f.u32();
            f.skip(8); // symbol; stock_id already captured
            let price = f.u32();
            if tag == b'A' {
                ItchEvent::AddOrder { stock_id, timestamp_ns, order_id, shares, price }
            } else {
                ItchEvent::AddOrderAttributed { stock_id, timestamp_ns, order_id, shares, price }
            }
        }
        b'E' => ItchEvent::OrderExecuted {
            stock_id,
            timestamp_ns,
            order_id: f.u64(),
            executed_shares: f.u32(),
            match_number: f.u64(),
        },
        b'C' => ItchEvent::OrderExecutedWithPrice {
            stock_id,
            timestamp_ns,
            order_id: f.u64(),
            executed_shares: f.u32(),
            match_number: f.u64(),
            printable: f.byte(),
            exec_price: f.u32(),
        },
        b'U' => ItchEvent::OrderReplace {
            stock_id,
            timestamp_ns,
            orig_order_id: f.u64(),
            new_order_id: f.u64(),
            shares: f.u32(),
            price: f.u32(),
        },
        b'P' => {
            let order_id = f.u64();
            f.skip(1); // side
            let shares = f.u32();
            f.skip(8); // symbol
            let price = f.u32();
            let match_number = f.u64();
            ItchEvent::NonCrossTrade { stock_id, timestamp_ns, order_id, shares, price, match_number }
        }
        b'Q' => {
            let shares = f.u64();
            f.skip(8); // symbol
            let cross_price = f.u32();
            let match_number = f.u64();
            ItchEvent::CrossTrade { stock_id, timestamp_ns, shares, cross_price, match_number }
        }
        b'B' => ItchEvent::BrokenTrade {
            stock_id,
            timestamp_ns,
            match_number: f.u64(),
        },
        _ => return None,
    };
    Some(event)
}
