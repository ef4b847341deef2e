//! MAC arbiter: frame-atomic TX priority mux and filtering RX fan-out.
//!
//! This is the choke point of the whole fabric. On TX it serializes the
//! control-plane and data-plane producers onto the one PHY link without ever
//! splitting a frame; on RX it fans the single inbound stream out to both
//! consumers under the hardware-address filter, coupling their readiness only
//! as much as the filter requires.

use framelink::Link;

use crate::addr::MacAddr;
use crate::header::EthHeader;
use crate::packet::PacketLink;

/// TX grant state. Owned by one arbiter instance; reset at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxState {
    Idle,
    ServingControl,
    ServingData,
}

/// Frame-atomic priority arbiter for the shared TX link.
///
/// The control-plane port has strict priority, taken at frame boundaries
/// only: a data-plane frame in flight is never interrupted. While a grant is
/// held, the losing port's segment simply stays pending on its own link.
#[derive(Debug)]
pub struct TxArbiter<const W: usize> {
    state: TxState,
}

impl<const W: usize> TxArbiter<W> {
    /// An arbiter in the idle state.
    pub fn new() -> Self { TxArbiter { state: TxState::Idle } }

    /// Advances one tick, forwarding at most one segment of the granted
    /// frame from `control` or `data` onto `phy`.
    pub fn step(&mut self, control: &mut Link<W>, data: &mut Link<W>, phy: &mut Link<W>) {
        if self.state == TxState::Idle {
            // Control is checked first: strict priority at frame boundaries.
            if control.valid() {
                self.state = TxState::ServingControl;
                log::trace!("tx arbiter: grant control plane");
            } else if data.valid() {
                self.state = TxState::ServingData;
                log::trace!("tx arbiter: grant data plane");
            }
        }
        let upstream = match self.state {
            TxState::Idle => return,
            TxState::ServingControl => control,
            TxState::ServingData => data,
        };
        if !phy.ready() {
            return;
        }
        if let Some(seg) = upstream.try_receive() {
            let sent = phy.try_send(seg);
            debug_assert!(sent);
            if seg.last {
                self.state = TxState::Idle;
            }
        }
    }
}

impl<const W: usize> Default for TxArbiter<W> {
    fn default() -> Self { Self::new() }
}

/// Filtering RX fan-out with conditional backpressure.
///
/// Every inbound frame goes to the data-plane consumer; frames whose
/// destination differs from the node's hardware address additionally go to
/// the control-plane consumer. The match is latched once per frame, from the
/// header, and held for the rest of that frame; the pull decision itself is
/// combinational, recomputed from current readiness every step:
///
/// `pull = inbound.valid && data.ready && (control.ready || matched)`
///
/// so a matched frame is never stalled by — and never delivered to — the
/// control-plane consumer.
#[derive(Debug)]
pub struct RxFanout<const W: usize> {
    hw_addr: MacAddr,
    matched: Option<bool>,
}

impl<const W: usize> RxFanout<W> {
    /// A fan-out filtering on `hw_addr`.
    pub fn new(hw_addr: MacAddr) -> Self { RxFanout { hw_addr, matched: None } }

    /// The configured hardware address.
    pub fn hw_addr(&self) -> MacAddr { self.hw_addr }

    /// Advances one tick, pulling at most one segment from `inbound` and
    /// delivering it to `data` and (conditionally) `control`.
    pub fn step(
        &mut self, inbound: &mut PacketLink<EthHeader, W>,
        data: &mut PacketLink<EthHeader, W>, control: &mut PacketLink<EthHeader, W>,
    ) {
        // Latch the match once per frame, as soon as the header is available.
        if self.matched.is_none() {
            if let Some(header) = inbound.take_header() {
                let matched = header.dst == self.hw_addr;
                log::trace!("rx fanout: frame for {} (matched: {matched})", header.dst);
                data.start_frame(header);
                if !matched {
                    control.start_frame(header);
                }
                self.matched = Some(matched);
            }
        }
        let Some(matched) = self.matched else { return };

        let pull = data.link.ready() && (control.link.ready() || matched);
        if !pull {
            return;
        }
        if let Some(seg) = inbound.link.try_receive() {
            let sent = data.link.try_send(seg);
            debug_assert!(sent);
            if !matched {
                let sent = control.link.try_send(seg);
                debug_assert!(sent);
            }
            if seg.last {
                self.matched = None;
            }
        }
    }
}
