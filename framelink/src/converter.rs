//! Stream width conversion.
//!
//! Both converters preserve byte order and total byte count; `last` and the
//! byte-enable mask move to whichever word actually terminates the frame on
//! the output side.

use arrayvec::ArrayVec;

use crate::error::ConfigError;
use crate::link::Link;
use crate::pipeline::Stage;
use crate::segment::{check_width, Keep, Segment, MAX_WORD_BYTES};

/// Splits a wide stream into a narrow one.
///
/// A wide word is emitted as `len / WOUT` narrow words (rounding up on the
/// frame's final word); words carrying no valid byte are never emitted.
#[derive(Debug)]
pub struct Downsizer<const WIN: usize, const WOUT: usize> {
    current: Option<Segment<WIN>>,
    offset: usize,
}

impl<const WIN: usize, const WOUT: usize> Downsizer<WIN, WOUT> {
    /// Fails fast unless `WIN` is a non-zero multiple of `WOUT`.
    pub fn new() -> Result<Self, ConfigError> {
        check_width(WIN)?;
        check_width(WOUT)?;
        if WIN % WOUT != 0 {
            return Err(ConfigError::NotDivisible { wide: WIN, narrow: WOUT });
        }
        Ok(Downsizer { current: None, offset: 0 })
    }
}

impl<const WIN: usize, const WOUT: usize> Stage<WIN, WOUT> for Downsizer<WIN, WOUT> {
    fn step(&mut self, sink: &mut Link<WIN>, source: &mut Link<WOUT>) {
        if self.current.is_none() {
            self.current = sink.try_receive();
            self.offset = 0;
        }
        let Some(seg) = self.current else { return };
        if !source.ready() {
            return;
        }

        let valid = seg.len();
        let n = (valid - self.offset).min(WOUT);
        let mut data = [0u8; WOUT];
        data[..n].copy_from_slice(&seg.data[self.offset..self.offset + n]);

        let final_chunk = self.offset + n == valid;
        let out = if final_chunk && seg.last {
            Segment::last_word(data, Keep::prefix(n))
        } else {
            Segment::word(data)
        };
        let sent = source.try_send(out);
        debug_assert!(sent);

        if final_chunk {
            self.current = None;
        } else {
            self.offset += WOUT;
        }
    }
}

/// Accumulates a narrow stream into a wide one, buffering internally.
///
/// Output validity is asserted only once a full wide word is assembled or a
/// `last` forces an early flush with a partial byte-enable mask. Output
/// backpressure stalls accumulation without disturbing the buffered bytes.
#[derive(Debug)]
pub struct Upsizer<const WIN: usize, const WOUT: usize> {
    acc: ArrayVec<u8, MAX_WORD_BYTES>,
    acc_last: bool,
    pending: Option<Segment<WOUT>>,
}

impl<const WIN: usize, const WOUT: usize> Upsizer<WIN, WOUT> {
    /// Fails fast unless `WOUT` is a non-zero multiple of `WIN`.
    pub fn new() -> Result<Self, ConfigError> {
        check_width(WIN)?;
        check_width(WOUT)?;
        if WOUT % WIN != 0 {
            return Err(ConfigError::NotDivisible { wide: WOUT, narrow: WIN });
        }
        Ok(Upsizer { acc: ArrayVec::new(), acc_last: false, pending: None })
    }
}

impl<const WIN: usize, const WOUT: usize> Stage<WIN, WOUT> for Upsizer<WIN, WOUT> {
    fn step(&mut self, sink: &mut Link<WIN>, source: &mut Link<WOUT>) {
        if let Some(seg) = self.pending {
            if source.try_send(seg) {
                self.pending = None;
            } else {
                return;
            }
        }

        // Accumulate one narrow word. The flush below keeps the buffer short
        // of a full wide word whenever more input is still expected.
        if !self.acc_last && self.acc.len() < WOUT {
            if let Some(seg) = sink.try_receive() {
                self.acc
                    .try_extend_from_slice(seg.bytes())
                    .expect("accumulator capacity checked at construction");
                if seg.last {
                    self.acc_last = true;
                }
            }
        }

        if self.acc.len() == WOUT || (self.acc_last && !self.acc.is_empty()) {
            let n = self.acc.len();
            let mut data = [0u8; WOUT];
            data[..n].copy_from_slice(&self.acc);
            let out = if self.acc_last {
                Segment::last_word(data, Keep::prefix(n))
            } else {
                Segment::word(data)
            };
            self.acc.clear();
            self.acc_last = false;
            if !source.try_send(out) {
                self.pending = Some(out);
            }
        }
    }
}
