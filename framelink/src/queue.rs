//! Frame queues: the control-plane's CPU-visible interface.
//!
//! A [`TxQueue`] holds whole outbound frames and serializes them onto a link
//! one segment per step; an [`RxQueue`] reassembles inbound segments into
//! whole frames. Both are bounded in frames and exert backpressure through
//! the ordinary handshake once full.

use std::collections::VecDeque;
use std::mem;

use crate::error::ConfigError;
use crate::link::Link;
use crate::segment::{check_width, segments_of, Segment};

/// Bounded queue of outbound frames.
#[derive(Debug)]
pub struct TxQueue<const W: usize> {
    depth: usize,
    frames: VecDeque<VecDeque<Segment<W>>>,
}

impl<const W: usize> TxQueue<W> {
    /// A queue holding up to `depth` frames. Zero depth fails fast.
    pub fn new(depth: usize) -> Result<Self, ConfigError> {
        check_width(W)?;
        if depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        Ok(TxQueue { depth, frames: VecDeque::new() })
    }

    /// Enqueues a frame's bytes. Refused (returning `false`) when the queue
    /// is full. An empty frame is illegal.
    pub fn try_push(&mut self, frame: &[u8]) -> bool {
        assert!(!frame.is_empty(), "a frame has at least one segment");
        if self.frames.len() == self.depth {
            return false;
        }
        self.frames.push_back(segments_of::<W>(frame).into());
        true
    }

    /// Number of queued frames, including the one partially sent.
    pub fn len(&self) -> usize { self.frames.len() }

    /// Whether no frame is queued.
    pub fn is_empty(&self) -> bool { self.frames.is_empty() }

    /// Offers the next pending segment to `source`.
    pub fn step(&mut self, source: &mut Link<W>) {
        let Some(frame) = self.frames.front_mut() else { return };
        let Some(&seg) = frame.front() else { return };
        if source.try_send(seg) {
            frame.pop_front();
            if frame.is_empty() {
                self.frames.pop_front();
            }
        }
    }
}

/// Bounded queue of reassembled inbound frames.
#[derive(Debug)]
pub struct RxQueue<const W: usize> {
    depth: usize,
    frames: VecDeque<Vec<u8>>,
    partial: Vec<u8>,
}

impl<const W: usize> RxQueue<W> {
    /// A queue holding up to `depth` complete frames. Zero depth fails fast.
    pub fn new(depth: usize) -> Result<Self, ConfigError> {
        check_width(W)?;
        if depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        Ok(RxQueue { depth, frames: VecDeque::new(), partial: Vec::new() })
    }

    /// Takes the oldest complete frame, if any.
    pub fn pop_frame(&mut self) -> Option<Vec<u8>> { self.frames.pop_front() }

    /// Number of complete frames held.
    pub fn len(&self) -> usize { self.frames.len() }

    /// Whether no complete frame is held.
    pub fn is_empty(&self) -> bool { self.frames.is_empty() }

    /// Pulls at most one segment from `sink`. Once `depth` complete frames
    /// are held the queue stops pulling, stalling the upstream producer.
    pub fn step(&mut self, sink: &mut Link<W>) {
        if self.frames.len() == self.depth {
            return;
        }
        if let Some(seg) = sink.try_receive() {
            self.partial.extend_from_slice(seg.bytes());
            if seg.last {
                log::trace!("rx queue: completed a {}-byte frame", self.partial.len());
                self.frames.push_back(mem::take(&mut self.partial));
            }
        }
    }
}
