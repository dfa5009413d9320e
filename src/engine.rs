//! The engine context: everything a trial needs bundled into one struct
//! instead of threaded through as ~30 separate globals.
//!
//! A searcher or the driver borrows an `&mut Engine` and has direct access to
//! the tour, the candidate lists, and every piece of per-trial bookkeeping
//! (active queue, excluded-edge flags, swap stack, visited-tour hash table).
//! Splitting these into one struct rather than passing them individually
//! keeps `BestkOptMove`/`Best2OptMoveSW`/`SwNeighborhoodBreadth` signatures
//! down to `(&mut Engine, t1, t2) -> Option<Scalar>`.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::candidate::CandidateLists;
use crate::excluded::ExcludedEdges;
use crate::hash::{HashTable, ZobristTable};
use crate::queue::ActiveQueue;
use crate::repo::Repo;
use crate::swap::{SwapRecord, SwapStack, TrialSnapshot};
use crate::tour::{Tour, TourImpltor};
use crate::{Params, Scalar};

/// The mutable state a whole run shares: tour, candidates, and the per-trial
/// bookkeeping subsystems, plus the run's RNG stream.
///
/// The visited-tour hash table and its Zobrist randoms are borrowed rather
/// than owned: per spec §5 they're process-wide state that outlives any
/// single run, so [`crate::driver::Solver`] builds them once and lends them
/// to each run's `Engine` in turn - a hash recorded by run `k` is still there
/// for run `k+1`'s "already seen" check.
pub struct Engine<'a> {
    repo: &'a Repo,
    tour: TourImpltor<'a>,
    candidates: CandidateLists,
    queue: ActiveQueue,
    hash_table: &'a mut HashTable,
    zobrist: &'a ZobristTable,
    excluded: ExcludedEdges,
    swaps: SwapStack,
    snapshot: TrialSnapshot,
    rng: StdRng,
    params: Params,
    current_hash: u64,
}

impl<'a> Engine<'a> {
    pub fn new(
        repo: &'a Repo,
        tour: TourImpltor<'a>,
        candidates: CandidateLists,
        params: Params,
        seed: u64,
        zobrist: &'a ZobristTable,
        hash_table: &'a mut HashTable,
    ) -> Self {
        let n = repo.len();
        let current_hash = zobrist.hash_tour(n, |id| tour.successor(&id).unwrap_or(id));
        Self {
            repo,
            snapshot: TrialSnapshot::capture(&tour),
            tour,
            candidates,
            queue: ActiveQueue::new(n),
            hash_table,
            zobrist,
            excluded: ExcludedEdges::new(n),
            swaps: SwapStack::new(),
            rng: StdRng::seed_from_u64(seed),
            params,
            current_hash,
        }
    }

    pub fn repo(&self) -> &Repo {
        self.repo
    }

    pub fn tour(&self) -> &TourImpltor<'a> {
        &self.tour
    }

    pub fn tour_mut(&mut self) -> &mut TourImpltor<'a> {
        &mut self.tour
    }

    pub fn candidates(&self) -> &CandidateLists {
        &self.candidates
    }

    pub fn queue(&mut self) -> &mut ActiveQueue {
        &mut self.queue
    }

    pub fn excluded(&mut self) -> &mut ExcludedEdges {
        &mut self.excluded
    }

    pub fn excluded_ref(&self) -> &ExcludedEdges {
        &self.excluded
    }

    pub fn swaps(&mut self) -> &mut SwapStack {
        &mut self.swaps
    }

    pub fn snapshot(&self) -> &TrialSnapshot {
        &self.snapshot
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn n(&self) -> usize {
        self.repo.len()
    }

    /// `true` iff the current tour's hash has been seen before (`HasHash` in
    /// the design), used to reject a committed trial that only reproduces an
    /// already-visited tour.
    pub fn tour_already_seen(&self) -> bool {
        self.hash_table.search(self.current_hash, self.tour.total_distance())
    }

    /// Records the current tour as visited.
    pub fn record_tour(&mut self) {
        self.hash_table.insert(self.current_hash, self.tour.total_distance());
    }

    /// Applies one `Swap1`, pushing the undo record and incrementally updating
    /// the running Zobrist hash by toggling exactly the two changed edges.
    pub fn apply_swap(&mut self, t1: usize, t2: usize, t3: usize, t4: usize) {
        self.current_hash ^= self.zobrist.edge_word(t1, t2);
        self.current_hash ^= self.zobrist.edge_word(t3, t4);
        self.tour.flip_at(t1, t2, t3, t4);
        self.current_hash ^= self.zobrist.edge_word(t1, t3);
        self.current_hash ^= self.zobrist.edge_word(t2, t4);
        self.swaps.push(SwapRecord { t1, t2, t3, t4 });
    }

    /// Rolls back every swap applied since the trial started and restores the
    /// hash to match (`RestoreTour`).
    pub fn restore_trial(&mut self) {
        for rec in self.swaps.swaps_rev() {
            self.current_hash ^= self.zobrist.edge_word(rec.t1, rec.t3);
            self.current_hash ^= self.zobrist.edge_word(rec.t2, rec.t4);
            self.current_hash ^= self.zobrist.edge_word(rec.t1, rec.t2);
            self.current_hash ^= self.zobrist.edge_word(rec.t3, rec.t4);
        }
        self.swaps.restore(&mut self.tour);
    }

    /// Undoes only the most recently applied swap, leaving earlier ones in
    /// the chain intact - used by the move searchers to back out of a
    /// speculative deeper level that didn't pan out, without unwinding the
    /// whole trial.
    pub fn undo_last_swap(&mut self) {
        if let Some(rec) = self.swaps.pop_last() {
            self.current_hash ^= self.zobrist.edge_word(rec.t1, rec.t3);
            self.current_hash ^= self.zobrist.edge_word(rec.t2, rec.t4);
            self.tour.flip_at(rec.t1, rec.t3, rec.t2, rec.t4);
            self.current_hash ^= self.zobrist.edge_word(rec.t1, rec.t2);
            self.current_hash ^= self.zobrist.edge_word(rec.t3, rec.t4);
        }
    }

    /// `Exclude(ta, tb)`: marks the edge `(ta, tb)` so later levels of the
    /// same trial can't re-add it, identifying which of each endpoint's
    /// pre-trial neighbour slots the edge occupies.
    pub fn exclude_edge(&mut self, ta: usize, tb: usize) {
        if self.snapshot.old_pred(tb) == ta {
            self.excluded.exclude_old_pred(tb);
        } else if self.snapshot.old_suc(tb) == ta {
            self.excluded.exclude_old_suc(tb);
        }
        if self.snapshot.old_pred(ta) == tb {
            self.excluded.exclude_old_pred(ta);
        } else if self.snapshot.old_suc(ta) == tb {
            self.excluded.exclude_old_suc(ta);
        }
    }

    /// `Excludable(t3, t4)`: true iff the edge is not one the current trial
    /// has already excluded.
    pub fn is_excludable(&self, a: usize, b: usize) -> bool {
        !self
            .excluded
            .is_excluded(a, b, self.snapshot.old_pred(b), self.snapshot.old_suc(b))
    }

    /// Commits a trial: keeps the swap chain, clears exclusion flags and the
    /// swap stack, re-syncs the neighbour snapshot at every node touched by
    /// the chain's swaps, activates all of them so later anchors reconsider
    /// the new edges, and records the new tour as visited (`StoreTour`).
    ///
    /// Returns `true` if the committed tour's hash was already present in the
    /// table *before* this call - i.e. this commit reconverged to a tour some
    /// earlier commit (this run, or an earlier one sharing the same table)
    /// already reached. Checked before inserting, since a tour always matches
    /// its own entry once recorded.
    pub fn commit_trial(&mut self) -> bool {
        let mut touched = Vec::with_capacity(self.swaps.swaps() * 4);
        for rec in self.swaps.swaps_rev() {
            touched.push(rec.t1);
            touched.push(rec.t2);
            touched.push(rec.t3);
            touched.push(rec.t4);
        }
        self.excluded.clear();
        self.swaps.clear();
        self.queue.activate_all(touched.clone());
        self.snapshot.resync(&self.tour, touched);
        let duplicate = self.tour_already_seen();
        self.record_tour();
        duplicate
    }

    pub fn activate_endpoints(&mut self, ids: impl IntoIterator<Item = usize>) {
        self.queue.activate_all(ids);
    }
}
