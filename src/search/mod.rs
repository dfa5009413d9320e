//! Move searchers: the family of functions the driver calls as `BestMove` to
//! extend or close a sequential edge-exchange chain.
//!
//! Every searcher shares the same shape the reference functions do - given
//! the anchor `t1`, the chain's current tail `t2`, and the accumulated gain
//! `g0`, find a feasible `(t3, t4)` (`t4 = predecessor(t3)` for some
//! candidate `t3` of `t2`), apply the corresponding `Swap1`, and report
//! whether closing the tour right there (`t4` back to `t1`) already improves
//! it. A `None` result means no feasible continuation exists and the caller
//! must restore the trial.

pub mod breadth;
pub mod kopt;
pub mod sw2opt;

use crate::engine::Engine;
use crate::Scalar;

/// The outcome of one searcher call: a swap was applied, the chain's new
/// tail is `t4`, and `gain > 0` means closing here already improves the tour.
#[derive(Debug, Clone, Copy)]
pub struct SearchResult {
    pub t4: usize,
    pub g0: Scalar,
    pub gain: Scalar,
}

/// Implemented by every `BestMove` variant (`BestkOptMove`, the sampled
/// `Best2OptMoveSW`/`Best2OptMoveSWBest`, and the breadth-first tree search).
pub trait MoveSearcher {
    fn search(&mut self, engine: &mut Engine, t1: usize, t2: usize, g0: Scalar) -> Option<SearchResult>;
}
