//! Synchronous packet-switching stream fabric.
//!
//! Flow-controlled stream links, width conversion, elastic buffering and
//! pipeline composition for frame-oriented datapaths. Everything advances by
//! explicit `step` calls, one tick at a time, so a whole fabric runs as a
//! deterministic single-threaded loop.

#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![deny(rust_2018_idioms)]
#![deny(unused_extern_crates)]
#![deny(unreachable_pub)]
#![deny(rustdoc::broken_intra_doc_links)]

mod converter;
mod error;
mod fifo;
mod link;
mod pipeline;
mod queue;
mod segment;

#[cfg(test)]
pub(crate) mod testutil;

pub use converter::{Downsizer, Upsizer};
pub use error::ConfigError;
pub use fifo::StreamFifo;
pub use link::{Link, Port};
pub use pipeline::{Chain, Stage, StageExt};
pub use queue::{RxQueue, TxQueue};
pub use segment::{check_width, segments_of, Keep, Segment, MAX_WORD_BYTES};
