//! Shared drivers for stage unit tests.

use crate::link::Link;
use crate::pipeline::Stage;
use crate::segment::Segment;

/// Pushes `input` through `stage` until quiescent and returns the output.
pub(crate) fn run_stage<const WIN: usize, const WOUT: usize, S: Stage<WIN, WOUT>>(
    stage: &mut S, input: &[Segment<WIN>],
) -> Vec<Segment<WOUT>> {
    run_stage_throttled(stage, input, 1)
}

/// Like [`run_stage`], draining the output only every `period` steps to
/// exercise backpressure.
pub(crate) fn run_stage_throttled<const WIN: usize, const WOUT: usize, S: Stage<WIN, WOUT>>(
    stage: &mut S, input: &[Segment<WIN>], period: usize,
) -> Vec<Segment<WOUT>> {
    let mut sink = Link::new();
    let mut source = Link::new();
    let mut out = Vec::new();
    let mut pending = input.iter().copied();
    let mut offered = pending.next();
    for tick in 0..10_000 {
        if let Some(seg) = offered {
            if sink.try_send(seg) {
                offered = pending.next();
            }
        }
        stage.step(&mut sink, &mut source);
        if tick % period == 0 {
            if let Some(seg) = source.try_receive() {
                out.push(seg);
            }
        }
    }
    assert!(offered.is_none(), "stage failed to drain its input");
    out
}

/// Concatenates the payload bytes of a segment sequence.
pub(crate) fn frame_bytes<const W: usize>(segments: &[Segment<W>]) -> Vec<u8> {
    segments.iter().flat_map(|s| s.bytes().to_vec()).collect()
}
