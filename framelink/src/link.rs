//! Point-to-point flow-controlled stream links.

use crate::segment::Segment;

/// A flow-controlled stream link between one producer and one consumer.
///
/// The link is a single-entry slot that doubles as the handshake: `ready` is
/// slot vacancy, `valid` is slot occupancy, and a transfer is a [`try_send`]
/// that lands in the vacancy observed in the same step. A refused send leaves
/// the segment with the producer, which must present the identical segment
/// again on a later step.
///
/// [`try_send`]: Link::try_send
#[derive(Debug, Default)]
pub struct Link<const W: usize> {
    slot: Option<Segment<W>>,
}

impl<const W: usize> Link<W> {
    /// An empty link.
    pub fn new() -> Self { Link { slot: None } }

    /// Consumer-side readiness: whether a send would be accepted this step.
    pub fn ready(&self) -> bool { self.slot.is_none() }

    /// Producer-side validity: whether a segment is pending.
    pub fn valid(&self) -> bool { self.slot.is_some() }

    /// The pending segment, without consuming it.
    pub fn peek(&self) -> Option<&Segment<W>> { self.slot.as_ref() }

    /// Offers a segment. Accepted (and latched exactly once) iff the link is
    /// ready; otherwise the producer keeps the segment.
    pub fn try_send(&mut self, segment: Segment<W>) -> bool {
        if self.slot.is_some() {
            return false;
        }
        self.slot = Some(segment);
        true
    }

    /// Takes the pending segment, if any, making the link ready again.
    pub fn try_receive(&mut self) -> Option<Segment<W>> { self.slot.take() }
}

/// A directed bundle of two links: a `source` that emits frames and a `sink`
/// that accepts them. Two ports of equal width are connected by feeding one's
/// source into the other's sink.
#[derive(Debug, Default)]
pub struct Port<const W: usize> {
    /// Emits frames toward the peer.
    pub source: Link<W>,
    /// Accepts frames from the peer.
    pub sink: Link<W>,
}

impl<const W: usize> Port<W> {
    /// A port with both links empty.
    pub fn new() -> Self { Port::default() }
}
