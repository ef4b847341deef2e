//! Packetizer / depacketizer: typed headers on raw byte streams.

use std::collections::VecDeque;
use std::marker::PhantomData;

use arrayvec::ArrayVec;
use framelink::{check_width, ConfigError, Keep, Link, Segment};

use crate::header::{Header, MAX_HEADER_BYTES};

/// A stream link paired with a typed-header side channel.
///
/// The producer announces each frame by pushing its header no later than the
/// frame's first payload segment; the consumer pops headers in frame order as
/// it begins each frame. The payload stream itself obeys the ordinary
/// [`Link`] handshake.
#[derive(Debug)]
pub struct PacketLink<H: Header, const W: usize> {
    headers: VecDeque<H>,
    /// Payload stream of the announced frames.
    pub link: Link<W>,
}

impl<H: Header, const W: usize> PacketLink<H, W> {
    /// An empty packet link.
    pub fn new() -> Self {
        PacketLink { headers: VecDeque::new(), link: Link::new() }
    }

    /// Announces the next frame's header.
    pub fn start_frame(&mut self, header: H) { self.headers.push_back(header); }

    /// The oldest announced header, without consuming it.
    pub fn peek_header(&self) -> Option<&H> { self.headers.front() }

    /// Takes the oldest announced header.
    pub fn take_header(&mut self) -> Option<H> { self.headers.pop_front() }
}

impl<H: Header, const W: usize> Default for PacketLink<H, W> {
    fn default() -> Self { Self::new() }
}

/// Serializes `(header, payload)` frames into a raw byte stream.
///
/// Header and payload bytes are restitched into `W`-byte words with no
/// alignment requirement between the header length and `W`; `last` and the
/// byte-enable mask land on the frame's final output word.
#[derive(Debug)]
pub struct Packetizer<H: Header, const W: usize> {
    staging: VecDeque<u8>,
    in_frame: bool,
    flushing: bool,
    _header: PhantomData<H>,
}

impl<H: Header, const W: usize> Packetizer<H, W> {
    /// A packetizer for `H`-headed frames at word width `W`.
    pub fn new() -> Result<Self, ConfigError> {
        check_width(W)?;
        if H::BYTES > MAX_HEADER_BYTES {
            return Err(ConfigError::HeaderTooLarge(H::BYTES));
        }
        Ok(Packetizer {
            staging: VecDeque::new(),
            in_frame: false,
            flushing: false,
            _header: PhantomData,
        })
    }

    /// Advances one tick.
    pub fn step(&mut self, sink: &mut PacketLink<H, W>, source: &mut Link<W>) {
        // A new frame's header is staged only once the previous frame has
        // fully drained.
        if !self.in_frame && !self.flushing {
            if let Some(header) = sink.take_header() {
                let mut buf = [0u8; MAX_HEADER_BYTES];
                header.write(&mut buf[..H::BYTES]);
                self.staging.extend(&buf[..H::BYTES]);
                self.in_frame = true;
            }
        }

        // Stage at most one payload word, keeping the buffer shallow so that
        // downstream backpressure reaches the producer.
        if self.in_frame && self.staging.len() < 2 * W {
            if let Some(seg) = sink.link.try_receive() {
                self.staging.extend(seg.bytes());
                if seg.last {
                    self.in_frame = false;
                    self.flushing = true;
                }
            }
        }

        // Emit at most one word.
        let emit = self.staging.len() >= W || (self.flushing && !self.staging.is_empty());
        if emit && source.ready() {
            let n = self.staging.len().min(W);
            let mut data = [0u8; W];
            for (slot, b) in data.iter_mut().zip(self.staging.drain(..n)) {
                *slot = b;
            }
            let out = if self.flushing && self.staging.is_empty() {
                self.flushing = false;
                Segment::last_word(data, Keep::prefix(n))
            } else {
                Segment::word(data)
            };
            let sent = source.try_send(out);
            debug_assert!(sent);
        }
    }
}

/// Splits the leading header off a raw byte stream.
///
/// The header is published on the side channel as soon as it is complete and
/// the frame is known to carry payload, while the payload is still flowing.
/// Frames too short to carry the header plus at least one payload byte are
/// dropped silently: link integrity is the framer's concern, not ours.
#[derive(Debug)]
pub struct Depacketizer<H: Header, const W: usize> {
    hdr: ArrayVec<u8, MAX_HEADER_BYTES>,
    published: bool,
    staging: VecDeque<u8>,
    seen_last: bool,
    _header: PhantomData<H>,
}

impl<H: Header, const W: usize> Depacketizer<H, W> {
    /// A depacketizer for `H`-headed frames at word width `W`.
    pub fn new() -> Result<Self, ConfigError> {
        check_width(W)?;
        if H::BYTES > MAX_HEADER_BYTES {
            return Err(ConfigError::HeaderTooLarge(H::BYTES));
        }
        Ok(Depacketizer {
            hdr: ArrayVec::new(),
            published: false,
            staging: VecDeque::new(),
            seen_last: false,
            _header: PhantomData,
        })
    }

    fn reset(&mut self) {
        self.hdr.clear();
        self.published = false;
        self.staging.clear();
        self.seen_last = false;
    }

    /// Advances one tick.
    pub fn step(&mut self, sink: &mut Link<W>, source: &mut PacketLink<H, W>) {
        // Ingest at most one word. The next frame's words stay on the link
        // until the current frame has drained.
        if !self.seen_last && self.staging.len() < 2 * W {
            if let Some(seg) = sink.try_receive() {
                for &b in seg.bytes() {
                    if self.hdr.len() < H::BYTES {
                        self.hdr.push(b);
                    } else {
                        self.staging.push_back(b);
                    }
                }
                if seg.last {
                    if self.hdr.len() < H::BYTES || (self.staging.is_empty() && !self.published) {
                        log::trace!("depacketizer: dropping runt frame");
                        self.reset();
                        return;
                    }
                    self.seen_last = true;
                }
            }
        }

        // Publish the header once complete and the frame is known to carry
        // payload.
        if !self.published && self.hdr.len() == H::BYTES && !self.staging.is_empty() {
            source.start_frame(H::parse(&self.hdr));
            self.published = true;
        }

        // Forward at most one payload word.
        let emit = self.published
            && (self.staging.len() >= W || (self.seen_last && !self.staging.is_empty()));
        if emit && source.link.ready() {
            let n = self.staging.len().min(W);
            let mut data = [0u8; W];
            for (slot, b) in data.iter_mut().zip(self.staging.drain(..n)) {
                *slot = b;
            }
            let out = if self.seen_last && self.staging.is_empty() {
                self.reset();
                Segment::last_word(data, Keep::prefix(n))
            } else {
                Segment::word(data)
            };
            let sent = source.link.try_send(out);
            debug_assert!(sent);
        }
    }
}
