//! Bounded elastic FIFO stage.

use std::collections::VecDeque;

use crate::error::ConfigError;
use crate::link::Link;
use crate::pipeline::Stage;
use crate::segment::{check_width, Segment};

/// A bounded FIFO of segments.
///
/// Absorbs short bursts between stages that advance at different rates and
/// propagates backpressure once full. Segments pass through in the same step
/// when the buffer is empty.
#[derive(Debug)]
pub struct StreamFifo<const W: usize> {
    depth: usize,
    buf: VecDeque<Segment<W>>,
}

impl<const W: usize> StreamFifo<W> {
    /// A FIFO holding up to `depth` segments. Zero depth fails fast.
    pub fn new(depth: usize) -> Result<Self, ConfigError> {
        check_width(W)?;
        if depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        Ok(StreamFifo { depth, buf: VecDeque::with_capacity(depth) })
    }

    /// Number of buffered segments.
    pub fn len(&self) -> usize { self.buf.len() }

    /// Whether the buffer holds no segment.
    pub fn is_empty(&self) -> bool { self.buf.is_empty() }
}

impl<const W: usize> Stage<W, W> for StreamFifo<W> {
    fn step(&mut self, sink: &mut Link<W>, source: &mut Link<W>) {
        if self.buf.len() < self.depth {
            if let Some(seg) = sink.try_receive() {
                self.buf.push_back(seg);
            }
        }
        if let Some(&seg) = self.buf.front() {
            if source.try_send(seg) {
                self.buf.pop_front();
            }
        }
    }
}
