//! Ethernet MAC switching fabric.
//!
//! Frame-atomic TX arbitration between a control-plane and a data-plane
//! producer over one shared PHY link, filtering RX fan-out of the inbound
//! stream to both consumers, and the packetization/crossbar plumbing in
//! between. Built on the [`framelink`] stream fabric; everything advances by
//! explicit `step` calls in a single-threaded loop.

#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![deny(rust_2018_idioms)]
#![deny(unused_extern_crates)]
#![deny(unreachable_pub)]
#![deny(rustdoc::broken_intra_doc_links)]

mod addr;
mod arbiter;
mod crossbar;
mod header;
mod mac;
mod packet;

pub use addr::{EtherType, MacAddr};
pub use arbiter::{RxFanout, TxArbiter};
pub use crossbar::{Crossbar, PortHandle, ProtoPort};
pub use header::{EthHeader, Header, MAX_HEADER_BYTES};
pub use mac::{MacConfig, MacCore, CPU_WORD};
pub use packet::{Depacketizer, PacketLink, Packetizer};
