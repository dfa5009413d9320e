//! The swap primitive's undo bookkeeping and the `StoreTour`/`RestoreTour`
//! trial machinery built on top of [`crate::tour::Tour::flip_at`].
//!
//! `Tour::flip_at` itself realises one `Swap1`; this module is the part of
//! the spec that makes trial moves safely reversible: a stack of applied
//! swaps (self-inverse up to argument transposition) plus, for a whole
//! trial, a snapshot of every node's pre-trial neighbours so a failed chain
//! can be rolled back in one step instead of replaying swaps one at a time
//! when that's cheaper.

use crate::tour::Tour;

/// One applied `flip_at(t1, t2, t3, t4)` call, recorded so it can be undone.
///
/// Per the design, undoing a swap is realised by the same primitive with its
/// arguments transposed: since the flip established `successor(t1) == t3` and
/// `successor(t2) == t4`, replaying `flip_at(t1, t3, t2, t4)` restores the
/// original edges `(t1,t2)` and `(t3,t4)`.
#[derive(Debug, Clone, Copy)]
pub struct SwapRecord {
    pub t1: usize,
    pub t2: usize,
    pub t3: usize,
    pub t4: usize,
}

impl SwapRecord {
    fn undo_args(&self) -> (usize, usize, usize, usize) {
        (self.t1, self.t3, self.t2, self.t4)
    }
}

/// The stack of swaps applied so far in the current trial, plus the running
/// count (`Swaps` in the design) used by searchers to cap chain depth.
#[derive(Debug, Default)]
pub struct SwapStack {
    stack: Vec<SwapRecord>,
}

impl SwapStack {
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    pub fn push(&mut self, rec: SwapRecord) {
        self.stack.push(rec);
    }

    pub fn swaps(&self) -> usize {
        self.stack.len()
    }

    /// Applied swaps, most recent first, without consuming the stack - used to
    /// replay the hash-toggling side effect of an undo before actually
    /// popping and flipping.
    pub fn swaps_rev(&self) -> impl Iterator<Item = SwapRecord> + '_ {
        self.stack.iter().rev().copied()
    }

    /// Pops and returns the most recently applied swap, if any.
    pub fn pop_last(&mut self) -> Option<SwapRecord> {
        self.stack.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Undoes every swap on the stack, most recent first, and empties it.
    pub fn restore(&mut self, tour: &mut impl Tour) {
        while let Some(rec) = self.stack.pop() {
            let (t1, t2, t3, t4) = rec.undo_args();
            tour.flip_at(t1, t2, t3, t4);
        }
    }

    /// Commits the trial: the chain of swaps is kept, the undo stack is
    /// simply cleared since there is nothing left to roll back to.
    pub fn clear(&mut self) {
        self.stack.clear();
    }
}

/// Snapshot of each node's tour neighbours at the start of a trial
/// (`OldPred`/`OldSuc` in the design), used both for rollback bookkeeping and
/// by the excluded-edge set to recognise "the edge just removed".
#[derive(Debug)]
pub struct TrialSnapshot {
    old_pred: Vec<usize>,
    old_suc: Vec<usize>,
}

impl TrialSnapshot {
    pub fn capture(tour: &impl Tour) -> Self {
        let n = tour.len();
        let mut old_pred = vec![0; n];
        let mut old_suc = vec![0; n];
        for id in 0..n {
            old_pred[id] = tour.predecessor(&id).unwrap_or(id);
            old_suc[id] = tour.successor(&id).unwrap_or(id);
        }
        Self { old_pred, old_suc }
    }

    pub fn old_pred(&self, id: usize) -> usize {
        self.old_pred[id]
    }

    pub fn old_suc(&self, id: usize) -> usize {
        self.old_suc[id]
    }

    /// Re-synchronises the snapshot with `tour`'s current edges at exactly
    /// the nodes touched since the snapshot was taken (`StoreTour`'s
    /// `Suc -> OldSuc`, `Pred -> OldPred` copy, restricted to the endpoints a
    /// committed trial actually changed).
    pub fn resync(&mut self, tour: &impl Tour, touched: impl IntoIterator<Item = usize>) {
        for id in touched {
            self.old_pred[id] = tour.predecessor(&id).unwrap_or(id);
            self.old_suc[id] = tour.successor(&id).unwrap_or(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tour::array::Array;
    use crate::tour::{Tour, TourOrder};
    use crate::Repo;

    fn repo(n: usize) -> Repo {
        let mut b = crate::RepoBuilder::new(crate::WeightKind::Euc2d).capacity(n);
        for i in 0..n {
            b.add(i as f64, i as f64, 0.);
        }
        b.build().unwrap()
    }

    #[test]
    fn test_swap_undo_restores_tour() {
        let repo = repo(10);
        let mut tour = Array::new(&repo);
        tour.apply(&TourOrder::with_nat_ord(10));

        let mut stack = SwapStack::new();
        stack.push(SwapRecord {
            t1: 3,
            t2: 4,
            t3: 8,
            t4: 9,
        });
        tour.flip_at(3, 4, 8, 9);
        assert_ne!(tour.successor(&3), Some(4));

        stack.restore(&mut tour);
        assert_eq!(tour.successor(&3), Some(4));
        assert_eq!(tour.successor(&8), Some(9));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_snapshot_matches_tour() {
        let repo = repo(5);
        let mut tour = Array::new(&repo);
        tour.apply(&TourOrder::with_nat_ord(5));
        let snap = TrialSnapshot::capture(&tour);
        for id in 0..5 {
            assert_eq!(snap.old_suc(id), tour.successor(&id).unwrap());
            assert_eq!(snap.old_pred(id), tour.predecessor(&id).unwrap());
        }
    }
}
