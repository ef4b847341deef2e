//! Full MAC assembly.
//!
//! Wires the control-plane queues and their width-conversion chains, the
//! data-plane packetizer/depacketizer and crossbar, and the MAC arbiter into
//! one step-driven datapath above the PHY-facing port. The control plane runs
//! at the fixed CPU word width; the PHY side runs at `W`.

use framelink::{
    Chain, ConfigError, Downsizer, Link, Port, RxQueue, Stage, StageExt, StreamFifo, TxQueue,
    Upsizer,
};
use static_assertions::const_assert;

use crate::addr::{EtherType, MacAddr};
use crate::arbiter::{RxFanout, TxArbiter};
use crate::crossbar::{Crossbar, PortHandle, ProtoPort};
use crate::header::EthHeader;
use crate::packet::{Depacketizer, PacketLink, Packetizer};

/// CPU-side word width of the control-plane queues, in bytes.
pub const CPU_WORD: usize = 4;

const_assert!(CPU_WORD <= framelink::MAX_WORD_BYTES);

/// Construction parameters. Immutable once the core is built.
#[derive(Debug, Clone)]
pub struct MacConfig {
    /// Hardware address used by the RX filter.
    pub hw_addr: MacAddr,
    /// Control-plane queue depth, in frames.
    pub queue_depth: usize,
    /// Elastic FIFO depth, in segments.
    pub fifo_depth: usize,
}

impl MacConfig {
    /// Defaults mirroring the usual two-slot control queues.
    pub fn new(hw_addr: MacAddr) -> Self {
        MacConfig { hw_addr, queue_depth: 2, fifo_depth: 4 }
    }
}

/// The MAC switching fabric between the PHY-facing port and its two clients:
/// the CPU frame queues (control plane) and the protocol crossbar (data
/// plane).
#[derive(Debug)]
pub struct MacCore<const W: usize> {
    // Control plane.
    tx_queue: TxQueue<CPU_WORD>,
    rx_queue: RxQueue<CPU_WORD>,
    ctl_tx_chain: Chain<Downsizer<CPU_WORD, W>, StreamFifo<W>, W>,
    ctl_rx_chain: Chain<StreamFifo<W>, Upsizer<W, CPU_WORD>, W>,
    // Data plane.
    crossbar: Crossbar<W>,
    packetizer: Packetizer<EthHeader, W>,
    depacketizer: Depacketizer<EthHeader, W>,
    cpu_packetizer: Packetizer<EthHeader, W>,
    data_tx_fifo: StreamFifo<W>,
    // Arbitration.
    tx_arbiter: TxArbiter<W>,
    rx_fanout: RxFanout<W>,
    // Interconnect.
    ctl_tx_raw: Link<CPU_WORD>,
    ctl_tx: Link<W>,
    master_tx: PacketLink<EthHeader, W>,
    data_tx_raw: Link<W>,
    data_tx: Link<W>,
    rx_parsed: PacketLink<EthHeader, W>,
    rx_data: PacketLink<EthHeader, W>,
    rx_ctl: PacketLink<EthHeader, W>,
    rx_ctl_raw: Link<W>,
    rx_ctl_cpu: Link<CPU_WORD>,
}

impl<const W: usize> MacCore<W> {
    /// Builds the fabric. Fails fast on a bad configuration; in particular
    /// the PHY width `W` must divide the CPU word width.
    pub fn new(config: MacConfig) -> Result<Self, ConfigError> {
        Ok(MacCore {
            tx_queue: TxQueue::new(config.queue_depth)?,
            rx_queue: RxQueue::new(config.queue_depth)?,
            ctl_tx_chain: Downsizer::<CPU_WORD, W>::new()?
                .chain(StreamFifo::new(config.fifo_depth)?),
            ctl_rx_chain: StreamFifo::new(config.fifo_depth)?
                .chain(Upsizer::<W, CPU_WORD>::new()?),
            crossbar: Crossbar::new()?,
            packetizer: Packetizer::new()?,
            depacketizer: Depacketizer::new()?,
            cpu_packetizer: Packetizer::new()?,
            data_tx_fifo: StreamFifo::new(config.fifo_depth)?,
            tx_arbiter: TxArbiter::new(),
            rx_fanout: RxFanout::new(config.hw_addr),
            ctl_tx_raw: Link::new(),
            ctl_tx: Link::new(),
            master_tx: PacketLink::new(),
            data_tx_raw: Link::new(),
            data_tx: Link::new(),
            rx_parsed: PacketLink::new(),
            rx_data: PacketLink::new(),
            rx_ctl: PacketLink::new(),
            rx_ctl_raw: Link::new(),
            rx_ctl_cpu: Link::new(),
        })
    }

    /// The configured hardware address.
    pub fn hw_addr(&self) -> MacAddr { self.rx_fanout.hw_addr() }

    /// Registers a protocol port on the crossbar.
    pub fn add_port(
        &mut self, ethertype: EtherType, depth: usize,
    ) -> Result<PortHandle, ConfigError> {
        self.crossbar.add_port(ethertype, depth)
    }

    /// The protocol port behind `handle`.
    pub fn port(&self, handle: PortHandle) -> &ProtoPort { self.crossbar.port(handle) }

    /// The protocol port behind `handle`, mutably.
    pub fn port_mut(&mut self, handle: PortHandle) -> &mut ProtoPort {
        self.crossbar.port_mut(handle)
    }

    /// Enqueues a raw frame on the control-plane TX queue. Refused when the
    /// queue is full.
    pub fn try_send_frame(&mut self, frame: &[u8]) -> bool { self.tx_queue.try_push(frame) }

    /// Takes the oldest raw frame from the control-plane RX queue.
    pub fn pop_frame(&mut self) -> Option<Vec<u8>> { self.rx_queue.pop_frame() }

    /// Advances the whole fabric one tick against the PHY-facing port.
    pub fn step(&mut self, phy: &mut Port<W>) {
        // TX path, producers before consumers.
        self.tx_queue.step(&mut self.ctl_tx_raw);
        self.ctl_tx_chain.step(&mut self.ctl_tx_raw, &mut self.ctl_tx);
        self.crossbar.step(&mut self.master_tx, &mut self.rx_data);
        self.packetizer.step(&mut self.master_tx, &mut self.data_tx_raw);
        self.data_tx_fifo.step(&mut self.data_tx_raw, &mut self.data_tx);
        self.tx_arbiter.step(&mut self.ctl_tx, &mut self.data_tx, &mut phy.sink);

        // RX path.
        self.depacketizer.step(&mut phy.source, &mut self.rx_parsed);
        self.rx_fanout.step(&mut self.rx_parsed, &mut self.rx_data, &mut self.rx_ctl);
        self.cpu_packetizer.step(&mut self.rx_ctl, &mut self.rx_ctl_raw);
        self.ctl_rx_chain.step(&mut self.rx_ctl_raw, &mut self.rx_ctl_cpu);
        self.rx_queue.step(&mut self.rx_ctl_cpu);
    }
}
