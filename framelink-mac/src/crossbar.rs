//! Protocol crossbar: N protocol ports muxed onto one MAC-side port.
//!
//! Upper-layer protocol handlers (ARP, IP, ...) each register a port keyed by
//! an EtherType at construction time. Egress frames are arbitrated round-robin
//! and serialized frame-atomically onto the master port; ingress frames are
//! dispatched to the one port whose discriminant matches, and discarded when
//! none does.

use std::collections::VecDeque;
use std::mem;

use framelink::{check_width, segments_of, ConfigError, Segment};

use crate::addr::{EtherType, MacAddr};
use crate::header::EthHeader;
use crate::packet::PacketLink;

/// Handle of a registered protocol port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortHandle(usize);

/// One registered protocol port: bounded whole-frame queues facing the
/// protocol handler.
#[derive(Debug)]
pub struct ProtoPort {
    ethertype: EtherType,
    depth: usize,
    tx: VecDeque<(EthHeader, Vec<u8>)>,
    rx: VecDeque<(EthHeader, Vec<u8>)>,
}

impl ProtoPort {
    /// The discriminant this port registered.
    pub fn ethertype(&self) -> EtherType { self.ethertype }

    /// Enqueues an outbound frame. Refused (returning `false`) when the
    /// queue is full. The registered discriminant is authoritative: the
    /// header's EtherType is overwritten with it. An empty payload is
    /// illegal.
    pub fn try_push(&mut self, dst: MacAddr, src: MacAddr, payload: &[u8]) -> bool {
        assert!(!payload.is_empty(), "a frame has at least one segment");
        if self.tx.len() == self.depth {
            return false;
        }
        let header = EthHeader { dst, src, ethertype: self.ethertype };
        self.tx.push_back((header, payload.to_vec()));
        true
    }

    /// Takes the oldest received frame, if any.
    pub fn pop(&mut self) -> Option<(EthHeader, Vec<u8>)> { self.rx.pop_front() }

    /// Number of received frames waiting to be popped.
    pub fn rx_len(&self) -> usize { self.rx.len() }
}

#[derive(Debug)]
enum EgressState<const W: usize> {
    Idle,
    Serving { segs: VecDeque<Segment<W>> },
}

#[derive(Debug)]
enum IngressState {
    Idle,
    Forward { port: usize, header: EthHeader, bytes: Vec<u8> },
    Discard,
}

/// N-port mux/demux between protocol handlers and the MAC datapath.
#[derive(Debug)]
pub struct Crossbar<const W: usize> {
    ports: Vec<ProtoPort>,
    next: usize,
    egress: EgressState<W>,
    ingress: IngressState,
}

impl<const W: usize> Crossbar<W> {
    /// An empty crossbar.
    pub fn new() -> Result<Self, ConfigError> {
        check_width(W)?;
        Ok(Crossbar {
            ports: Vec::new(),
            next: 0,
            egress: EgressState::Idle,
            ingress: IngressState::Idle,
        })
    }

    /// Registers a protocol port for `ethertype` with frame queues of the
    /// given depth. Registering a discriminant twice fails fast.
    pub fn add_port(
        &mut self, ethertype: EtherType, depth: usize,
    ) -> Result<PortHandle, ConfigError> {
        if depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        if self.ports.iter().any(|p| p.ethertype == ethertype) {
            return Err(ConfigError::DuplicateRoute(ethertype.0));
        }
        self.ports.push(ProtoPort {
            ethertype,
            depth,
            tx: VecDeque::new(),
            rx: VecDeque::new(),
        });
        Ok(PortHandle(self.ports.len() - 1))
    }

    /// The port behind `handle`.
    pub fn port(&self, handle: PortHandle) -> &ProtoPort { &self.ports[handle.0] }

    /// The port behind `handle`, mutably.
    pub fn port_mut(&mut self, handle: PortHandle) -> &mut ProtoPort { &mut self.ports[handle.0] }

    /// Advances one tick: egress arbitration toward `master_source`, ingress
    /// dispatch from `master_sink`.
    pub fn step(
        &mut self, master_source: &mut PacketLink<EthHeader, W>,
        master_sink: &mut PacketLink<EthHeader, W>,
    ) {
        self.step_egress(master_source);
        self.step_ingress(master_sink);
    }

    fn step_egress(&mut self, master: &mut PacketLink<EthHeader, W>) {
        if let EgressState::Idle = self.egress {
            let n = self.ports.len();
            let mut granted = None;
            for k in 0..n {
                let i = (self.next + k) % n;
                if let Some(frame) = self.ports[i].tx.pop_front() {
                    granted = Some((i, frame));
                    break;
                }
            }
            let Some((i, (header, payload))) = granted else { return };
            log::trace!("crossbar: egress grant to port {i} ({})", header.ethertype);
            // Advance the scan origin past the winner so a busy port cannot
            // starve the others.
            self.next = (i + 1) % n;
            master.start_frame(header);
            self.egress = EgressState::Serving { segs: segments_of::<W>(&payload).into() };
        }

        if let EgressState::Serving { segs } = &mut self.egress {
            if let Some(&seg) = segs.front() {
                if master.link.try_send(seg) {
                    segs.pop_front();
                }
            }
            if segs.is_empty() {
                self.egress = EgressState::Idle;
            }
        }
    }

    fn step_ingress(&mut self, master: &mut PacketLink<EthHeader, W>) {
        if let IngressState::Idle = self.ingress {
            if let Some(header) = master.take_header() {
                match self.ports.iter().position(|p| p.ethertype == header.ethertype) {
                    Some(port) => {
                        self.ingress = IngressState::Forward { port, header, bytes: Vec::new() };
                    }
                    None => {
                        log::trace!(
                            "crossbar: no route for {}, discarding frame",
                            header.ethertype
                        );
                        self.ingress = IngressState::Discard;
                    }
                }
            }
        }

        match &mut self.ingress {
            IngressState::Idle => {}
            IngressState::Forward { port, header, bytes } => {
                let p = &mut self.ports[*port];
                // A full destination queue stalls the frame, never drops it.
                if p.rx.len() == p.depth {
                    return;
                }
                if let Some(seg) = master.link.try_receive() {
                    bytes.extend_from_slice(seg.bytes());
                    if seg.last {
                        p.rx.push_back((*header, mem::take(bytes)));
                        self.ingress = IngressState::Idle;
                    }
                }
            }
            IngressState::Discard => {
                if let Some(seg) = master.link.try_receive() {
                    if seg.last {
                        self.ingress = IngressState::Idle;
                    }
                }
            }
        }
    }
}
