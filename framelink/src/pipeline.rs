//! Stage trait and pipeline composition.

use crate::link::Link;

/// One synchronous stage of a stream pipeline.
///
/// A stage advances one evaluation step per call: it pulls at most one segment
/// from `sink` and pushes at most one to `source`, holding any in-flight state
/// internally across stalls.
pub trait Stage<const WIN: usize, const WOUT: usize> {
    /// Advances the stage by one tick.
    fn step(&mut self, sink: &mut Link<WIN>, source: &mut Link<WOUT>);
}

/// Two stages wired in order through an intermediate link.
///
/// Composition is pure wiring: the only state added is the one-slot link
/// between the stages. A chain is itself a stage, so pipelines of any length
/// are built by nesting.
#[derive(Debug)]
pub struct Chain<A, B, const WMID: usize> {
    first: A,
    mid: Link<WMID>,
    second: B,
}

impl<A, B, const WMID: usize> Chain<A, B, WMID> {
    /// Wires `first`'s source to `second`'s sink.
    pub fn new(first: A, second: B) -> Self {
        Chain { first, mid: Link::new(), second }
    }
}

impl<A, B, const WIN: usize, const WMID: usize, const WOUT: usize> Stage<WIN, WOUT>
    for Chain<A, B, WMID>
where
    A: Stage<WIN, WMID>,
    B: Stage<WMID, WOUT>,
{
    fn step(&mut self, sink: &mut Link<WIN>, source: &mut Link<WOUT>) {
        self.first.step(sink, &mut self.mid);
        self.second.step(&mut self.mid, source);
    }
}

/// Composition helpers for stages.
pub trait StageExt<const WIN: usize, const WOUT: usize>: Stage<WIN, WOUT> + Sized {
    /// Appends `next` after this stage.
    fn chain<B, const WNEXT: usize>(self, next: B) -> Chain<Self, B, WOUT>
    where B: Stage<WOUT, WNEXT> {
        Chain::new(self, next)
    }
}

impl<T, const WIN: usize, const WOUT: usize> StageExt<WIN, WOUT> for T where T: Stage<WIN, WOUT> {}
