//! Drives synthetic feed bytes through decoder, queue, and engine on real
//! threads, the same shape the binary wires up.

use std::thread;

use itch::{body_size, DecodeError, Decoder, EventQueue, ItchEvent, NS_PER_HOUR};
use vwap::{RowWriter, VwapEngine};

/// One wire record: tag, stock locate, tracking, 6-byte timestamp, payload,
/// zero-padded to the tag's fixed size.
fn record(tag: u8, stock_id: u16, ts: u64, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    out.extend_from_slice(&stock_id.to_be_bytes());
    out.extend_from_slice(&[0, 0]);
    out.extend_from_slice(&ts.to_be_bytes()[2..]);
    out.extend_from_slice(payload);
    out.resize(1 + body_size(tag).unwrap(), 0);
    out
}

fn add_order(stock_id: u16, ts: u64, order_id: u64, shares: u32, price: u32) -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(&order_id.to_be_bytes());
    p.push(b'B');
    p.extend_from_slice(&shares.to_be_bytes());
    p.extend_from_slice(b"        ");
    p.extend_from_slice(&price.to_be_bytes());
    record(b'A', stock_id, ts, &p)
}

fn executed(stock_id: u16, ts: u64, order_id: u64, shares: u32, match_number: u64) -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(&order_id.to_be_bytes());
    p.extend_from_slice(&shares.to_be_bytes());
    p.extend_from_slice(&match_number.to_be_bytes());
    record(b'E', stock_id, ts, &p)
}

fn cross(stock_id: u16, ts: u64, shares: u64, price: u32, match_number: u64) -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(&shares.to_be_bytes());
    p.extend_from_slice(b"        ");
    p.extend_from_slice(&price.to_be_bytes());
    p.extend_from_slice(&match_number.to_be_bytes());
    record(b'Q', stock_id, ts, &p)
}

fn trade(stock_id: u16, ts: u64, shares: u32, price: u32, match_number: u64) -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(&0u64.to_be_bytes());
    p.push(b'B');
    p.extend_from_slice(&shares.to_be_bytes());
    p.extend_from_slice(b"        ");
    p.extend_from_slice(&price.to_be_bytes());
    p.extend_from_slice(&match_number.to_be_bytes());
    record(b'P', stock_id, ts, &p)
}

fn broken(stock_id: u16, ts: u64, match_number: u64) -> Vec<u8> {
    record(b'B', stock_id, ts, &match_number.to_be_bytes())
}

/// Decode `feed` on one thread, aggregate on another, capacity chosen small
/// enough that the producer has to block. Returns (csv, decode result).
fn run(feed: &[u8], capacity: usize) -> (String, Result<(), DecodeError>) {
    let queue = EventQueue::<ItchEvent>::bounded(capacity);
    let mut buf = Vec::new();
    let mut out = RowWriter::new(&mut buf);

    let decoded = thread::scope(|s| {
        let producer = s.spawn(|| {
            let mut decoder = Decoder::new(feed);
            let result = loop {
                match decoder.next_event() {
                    Ok(Some(ev)) => queue.push(ev),
                    Ok(None) => break Ok(()),
                    Err(e) => break Err(e),
                }
            };
            queue.finish();
            result
        });

        // consume on this thread; the producer runs in parallel
        let mut engine = VwapEngine::new();
        while let Some(ev) = queue.pop() {
            engine.apply(ev, &mut out).unwrap();
        }
        engine.finish(&mut out).unwrap();
        producer.join().unwrap()
    });

    out.flush().unwrap();
    drop(out);
    (String::from_utf8(buf).unwrap(), decoded)
}

fn half_past(hour: u64) -> u64 {
    hour * NS_PER_HOUR + NS_PER_HOUR / 2
}

#[test]
fn full_pipeline_produces_the_report() {
    let mut feed = Vec::new();
    feed.extend(record(b'S', 0, 0, &[b'O'])); // system event, skipped
    feed.extend(record(b'R', 1, 0, b"AAA     "));
    feed.extend(record(b'R', 2, 0, b"BBB     "));
    feed.extend(add_order(1, half_past(9), 10, 500, 100_000));
    feed.extend(executed(1, half_past(9), 10, 500, 1));
    feed.extend(cross(2, half_past(9), 1_000, 250_000, 2));
    // hour 10 trade flushes hour 9, then gets broken in the grace window
    feed.extend(trade(1, 10 * NS_PER_HOUR + 15 * 60 * 1_000_000_000, 100, 200_000, 3));
    feed.extend(broken(1, 10 * NS_PER_HOUR + 20 * 60 * 1_000_000_000, 3));

    let (csv, decoded) = run(&feed, 4);
    decoded.unwrap();
    assert_eq!(csv, "AAA,1,9,10.0000\nBBB,2,9,25.0000\n");
}

#[test]
fn truncated_feed_keeps_partial_output() {
    let mut feed = Vec::new();
    feed.extend(record(b'R', 1, 0, b"AAA     "));
    feed.extend(add_order(1, half_past(9), 10, 500, 100_000));
    feed.extend(executed(1, half_past(9), 10, 500, 1));
    let mut cut = trade(1, half_past(10), 100, 200_000, 2);
    cut.truncate(cut.len() - 5);
    feed.extend(cut);

    let (csv, decoded) = run(&feed, 4);
    assert!(matches!(decoded, Err(DecodeError::TruncatedRecord { .. })));
    // everything decoded before the damage still reaches the report
    assert_eq!(csv, "AAA,1,9,10.0000\n");
}

#[test]
fn queue_backpressure_preserves_feed_order() {
    // many more events than the queue can hold at once
    let mut feed = Vec::new();
    feed.extend(record(b'R', 1, 0, b"AAA     "));
    for i in 0..500u64 {
        feed.extend(trade(1, half_past(9), 10, 100_000 + (i as u32) * 10_000, i));
    }

    let (csv, decoded) = run(&feed, 2);
    decoded.unwrap();
    let dollar: u64 = (0..500u64).map(|i| (100_000 + i * 10_000) * 10).sum();
    let vwap = dollar as f64 / 10_000.0 / 5_000.0;
    assert_eq!(csv, format!("AAA,1,9,{vwap:.4}\n"));
}
