//! NASDAQ TotalView-ITCH 5.0 feed handling.
//!
//! Three pieces, each self-contained:
//! - [`messages`] – the typed event model for the trade-relevant message
//!   tags plus the wire-size table for every known tag.
//! - [`decode`] – a zero-copy sequential decoder over a mapped byte view.
//! - [`queue`] – the bounded blocking FIFO that hands decoded events from
//!   the reader thread to the processing thread.

pub mod decode;
pub mod messages;
pub mod queue;

pub use decode::{DecodeError, Decoder};
pub use messages::{body_size, ItchEvent, NS_PER_HOUR};
pub use queue::EventQueue;
