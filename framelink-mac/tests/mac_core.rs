//! End-to-end exercises of the assembled MAC fabric.

use std::collections::VecDeque;

use framelink::{segments_of, Port, Segment};
use framelink_mac::{EthHeader, EtherType, Header, MacAddr, MacConfig, MacCore};

const NODE: MacAddr = MacAddr([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
const PEER: MacAddr = MacAddr([0x02, 0x00, 0x00, 0x00, 0x00, 0x02]);

/// Plays the link framer: feeds queued inbound segments into the PHY source
/// and reassembles outbound frames from the PHY sink.
struct PhyHarness<const W: usize> {
    port: Port<W>,
    inbound: VecDeque<Segment<W>>,
    outbound: Vec<Vec<u8>>,
    partial: Vec<u8>,
}

impl<const W: usize> PhyHarness<W> {
    fn new() -> Self {
        PhyHarness {
            port: Port::new(),
            inbound: VecDeque::new(),
            outbound: Vec::new(),
            partial: Vec::new(),
        }
    }

    fn queue_frame(&mut self, bytes: &[u8]) {
        self.inbound.extend(segments_of::<W>(bytes));
    }

    fn run(&mut self, mac: &mut MacCore<W>, steps: usize) {
        for _ in 0..steps {
            if let Some(&seg) = self.inbound.front() {
                if self.port.source.try_send(seg) {
                    self.inbound.pop_front();
                }
            }
            mac.step(&mut self.port);
            if let Some(seg) = self.port.sink.try_receive() {
                self.partial.extend_from_slice(seg.bytes());
                if seg.last {
                    self.outbound.push(std::mem::take(&mut self.partial));
                }
            }
        }
    }
}

fn wire_frame(header: EthHeader, payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0u8; EthHeader::BYTES];
    header.write(&mut bytes);
    bytes.extend_from_slice(payload);
    bytes
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn data_plane_frame_crosses_the_wire_and_back() {
    init_logging();
    let mut mac = MacCore::<4>::new(MacConfig::new(NODE)).unwrap();
    let ipv4 = mac.add_port(EtherType::IPV4, 4).unwrap();
    let mut phy = PhyHarness::<4>::new();

    // 50 payload bytes + 14 header bytes: a minimum-sized 64-byte Ethernet
    // frame, addressed to this very node.
    let payload: Vec<u8> = (0u8..50).collect();
    assert!(mac.port_mut(ipv4).try_push(NODE, NODE, &payload));
    phy.run(&mut mac, 200);

    assert_eq!(phy.outbound.len(), 1);
    let wire = &phy.outbound[0];
    assert_eq!(wire.len(), 64);
    let header = EthHeader::parse(&wire[..14]);
    assert_eq!(header, EthHeader { dst: NODE, src: NODE, ethertype: EtherType::IPV4 });
    assert_eq!(&wire[14..], &payload[..]);

    // A matching reply comes back: delivered to the data plane only, even
    // though the CPU never drains its RX queue.
    let reply_payload: Vec<u8> = (100u8..150).collect();
    let reply = wire_frame(
        EthHeader { dst: NODE, src: PEER, ethertype: EtherType::IPV4 },
        &reply_payload,
    );
    phy.queue_frame(&reply);
    phy.run(&mut mac, 200);

    let (header, payload) = mac.port_mut(ipv4).pop().expect("reply not delivered");
    assert_eq!(header.src, PEER);
    assert_eq!(payload, reply_payload);
    assert_eq!(mac.pop_frame(), None);
}

#[test]
fn control_plane_frame_survives_width_conversion() {
    init_logging();
    // W = 2 exercises the 4-to-2 downsize on TX and the 2-to-4 upsize on RX.
    let mut mac = MacCore::<2>::new(MacConfig::new(NODE)).unwrap();
    let mut phy = PhyHarness::<2>::new();

    // 21 bytes: not a multiple of either word width.
    let frame = wire_frame(
        EthHeader { dst: PEER, src: NODE, ethertype: EtherType::ARP },
        &[1, 2, 3, 4, 5, 6, 7],
    );
    assert_eq!(frame.len(), 21);
    assert!(mac.try_send_frame(&frame));
    phy.run(&mut mac, 200);

    assert_eq!(phy.outbound, vec![frame]);
}

#[test]
fn inbound_broadcast_reaches_both_consumers() {
    init_logging();
    let mut mac = MacCore::<4>::new(MacConfig::new(NODE)).unwrap();
    let arp = mac.add_port(EtherType::ARP, 4).unwrap();
    let mut phy = PhyHarness::<4>::new();

    let frame = wire_frame(
        EthHeader { dst: MacAddr::BROADCAST, src: PEER, ethertype: EtherType::ARP },
        &[0x42; 28],
    );
    phy.queue_frame(&frame);
    phy.run(&mut mac, 300);

    // Data plane: routed to the ARP port by the crossbar.
    let (header, payload) = mac.port_mut(arp).pop().expect("broadcast not routed");
    assert_eq!(header.dst, MacAddr::BROADCAST);
    assert_eq!(payload, vec![0x42; 28]);
    // Control plane: the CPU sees the whole raw frame.
    assert_eq!(mac.pop_frame(), Some(frame));
}

#[test]
fn unroutable_inbound_frame_still_reaches_the_cpu() {
    init_logging();
    let mut mac = MacCore::<4>::new(MacConfig::new(NODE)).unwrap();
    let arp = mac.add_port(EtherType::ARP, 4).unwrap();
    let mut phy = PhyHarness::<4>::new();

    let frame = wire_frame(
        EthHeader { dst: PEER, src: PEER, ethertype: EtherType(0x1234) },
        &[9, 9, 9],
    );
    phy.queue_frame(&frame);
    phy.run(&mut mac, 300);

    // The crossbar discards it; the promiscuous control path keeps it.
    assert_eq!(mac.port_mut(arp).pop(), None);
    assert_eq!(mac.pop_frame(), Some(frame));
}

#[test]
fn contending_producers_never_interleave_on_the_wire() {
    init_logging();
    let mut mac = MacCore::<4>::new(MacConfig::new(NODE)).unwrap();
    let ipv4 = mac.add_port(EtherType::IPV4, 4).unwrap();
    let mut phy = PhyHarness::<4>::new();

    let control_frame = wire_frame(
        EthHeader { dst: PEER, src: NODE, ethertype: EtherType::ARP },
        &[0xc0; 19],
    );
    assert!(mac.try_send_frame(&control_frame));
    let data_payload = [0xd0; 33];
    assert!(mac.port_mut(ipv4).try_push(PEER, NODE, &data_payload));

    phy.run(&mut mac, 400);

    assert_eq!(phy.outbound.len(), 2);
    for wire in &phy.outbound {
        let header = EthHeader::parse(&wire[..14]);
        match header.ethertype {
            EtherType::ARP => assert_eq!(wire, &control_frame),
            EtherType::IPV4 => assert_eq!(&wire[14..], &data_payload[..]),
            other => panic!("unexpected ethertype {other} on the wire"),
        }
    }
}

#[test]
fn matched_frames_flow_while_the_cpu_queue_is_full() {
    init_logging();
    let mut config = MacConfig::new(NODE);
    config.queue_depth = 1;
    let mut mac = MacCore::<4>::new(config).unwrap();
    let ipv4 = mac.add_port(EtherType::IPV4, 8).unwrap();
    let mut phy = PhyHarness::<4>::new();

    // A non-matching frame fills the one-slot CPU RX queue; nobody pops it.
    let filler = wire_frame(
        EthHeader { dst: PEER, src: PEER, ethertype: EtherType::IPV4 },
        &[0x11; 8],
    );
    phy.queue_frame(&filler);
    phy.run(&mut mac, 300);

    // Matching frames keep flowing to the data plane regardless.
    for i in 0..2u8 {
        let frame = wire_frame(
            EthHeader { dst: NODE, src: PEER, ethertype: EtherType::IPV4 },
            &[i; 16],
        );
        phy.queue_frame(&frame);
    }
    phy.run(&mut mac, 400);
    assert_eq!(mac.port_mut(ipv4).rx_len(), 3);

    // A long non-matching frame now wedges in the stalled control path; the
    // matching frame behind it waits at the shared link, as specified: no
    // timeout, no drop.
    let wedge = wire_frame(
        EthHeader { dst: PEER, src: PEER, ethertype: EtherType::IPV4 },
        &[0x22; 100],
    );
    phy.queue_frame(&wedge);
    let trailing = wire_frame(
        EthHeader { dst: NODE, src: PEER, ethertype: EtherType::IPV4 },
        &[0x33; 8],
    );
    phy.queue_frame(&trailing);
    phy.run(&mut mac, 500);
    assert_eq!(mac.port_mut(ipv4).rx_len(), 3);
    assert!(!phy.inbound.is_empty(), "the stalled frame must not be consumed");

    // Popping the CPU queue un-wedges everything.
    assert_eq!(mac.pop_frame(), Some(filler));
    phy.run(&mut mac, 1_000);
    assert_eq!(mac.pop_frame(), Some(wedge));
    assert_eq!(mac.port_mut(ipv4).rx_len(), 5);
}
