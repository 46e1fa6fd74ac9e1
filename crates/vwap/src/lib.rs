//! Hourly volume-weighted average price over a decoded ITCH event stream.
//!
//! [`engine::VwapEngine`] consumes events in feed order, maintains the
//! per-order and per-(security, hour) state, and emits one CSV row per
//! security per traded hour through [`writer::RowWriter`].

pub mod engine;
pub mod writer;

pub use engine::{EngineStats, VwapEngine};
pub use writer::{OutputError, RowWriter};
