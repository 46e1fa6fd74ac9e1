use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::thread;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use memmap2::Mmap;
use tracing::info;

use itch::{Decoder, EventQueue, ItchEvent};
use vwap::{EngineStats, RowWriter, VwapEngine};

const DEFAULT_FEED: &str = "01302019.NASDAQ_ITCH50";
const PROGRESS_EVERY: usize = 100 << 20; // 100 MiB

#[derive(Parser, Debug)]
#[command(
    name = "itch-vwap",
    version,
    about = "Hourly VWAP per security from a NASDAQ TotalView-ITCH 5.0 capture"
)]
struct Cli {
    /// Path to the ITCH 5.0 capture (length-stripped binary).
    #[arg(default_value = DEFAULT_FEED)]
    feed: PathBuf,

    /// Where to write the CSV report.
    #[arg(long, default_value = "output.csv")]
    out: PathBuf,

    /// Hand-off queue capacity, in events.
    #[arg(long, default_value_t = 65_536)]
    queue_capacity: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let file = File::open(&cli.feed).with_context(|| format!("open feed {:?}", cli.feed))?;
    let mmap = unsafe { Mmap::map(&file) }.with_context(|| format!("map feed {:?}", cli.feed))?;
    info!(feed = ?cli.feed, bytes = mmap.len(), "feed mapped");

    let sink = File::create(&cli.out).with_context(|| format!("create output {:?}", cli.out))?;
    let mut out = RowWriter::new(BufWriter::new(sink));
    out.header()?;

    let queue = EventQueue::bounded(cli.queue_capacity);
    let stats = run_pipeline(&mmap, &queue, &mut out)?;
    out.flush()?;

    info!(
        events = stats.events,
        trades = stats.trades,
        rows = stats.rows_emitted,
        unknown_order_refs = stats.unknown_order_refs,
        unknown_breaks = stats.unknown_breaks,
        nonprintable_skips = stats.nonprintable_skips,
        out = ?cli.out,
        "vwap report written"
    );
    Ok(())
}

/// Decode on one thread, aggregate on another, meet at the queue.
///
/// The producer always finishes the queue, even on a decode failure, so the
/// consumer drains whatever was handed off and the partial report survives.
fn run_pipeline<W: Write + Send>(
    feed: &[u8],
    queue: &EventQueue<ItchEvent>,
    out: &mut RowWriter<W>,
) -> Result<EngineStats> {
    thread::scope(|s| {
        let producer = s.spawn(|| {
            let mut decoder = Decoder::new(feed);
            let mut next_mark = PROGRESS_EVERY;
            let result = loop {
                match decoder.next_event() {
                    Ok(Some(event)) => {
                        queue.push(event);
                        if decoder.position() >= next_mark {
                            info!(mib_parsed = decoder.position() >> 20, "parsing feed");
                            next_mark += PROGRESS_EVERY;
                        }
                    }
                    Ok(None) => break Ok(()),
                    Err(e) => break Err(e),
                }
            };
            queue.finish();
            info!(bytes = decoder.position(), "finished reading feed");
            result
        });

        let consumer = s.spawn(move || {
            let mut engine = VwapEngine::new();
            let result = (|| {
                while let Some(event) = queue.pop() {
                    engine.apply(event, out)?;
                }
                engine.finish(out)
            })();
            if result.is_err() {
                // stop blocking a producer that is still pushing
                queue.finish();
            }
            result.map(|()| engine.stats())
        });

        let decoded = producer
            .join()
            .map_err(|_| anyhow!("decoder thread panicked"))?;
        let stats = consumer
            .join()
            .map_err(|_| anyhow!("aggregator thread panicked"))?;

        decoded.context("feed decode failed")?;
        Ok(stats?)
    })
}
