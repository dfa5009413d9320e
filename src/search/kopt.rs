//! `BestkOptMove`: the sequential searcher, generalised from `Best2OptMove`
//! to look `k` candidate levels deep (`k` in `2..=5`) before settling for a
//! non-improving continuation of the chain.
//!
//! At `k = 2` this is exactly `Best2OptMove`: try every feasible candidate
//! `t3` of `t2` once, take the first one that closes the tour with positive
//! gain, otherwise keep the best `(t3, t4)` by accumulated gain and make that
//! move instead. For `k > 2`, before falling back to "best so far" at a given
//! candidate, the search speculatively applies that candidate's swap and
//! recurses one level deeper looking for a closing move; if the deeper
//! attempt doesn't pan out the speculative swap is undone and the next
//! candidate is tried.

use crate::engine::Engine;
use crate::search::{MoveSearcher, SearchResult};
use crate::Scalar;

/// Bounded sequential searcher. `k` is clamped to `2..=5` per the supported
/// move family.
#[derive(Debug, Clone, Copy)]
pub struct BestKOptMove {
    k: u8,
}

impl BestKOptMove {
    pub fn new(k: u8) -> Self {
        Self { k: k.clamp(2, 5) }
    }

    pub fn k(&self) -> u8 {
        self.k
    }
}

impl MoveSearcher for BestKOptMove {
    fn search(&mut self, engine: &mut Engine, t1: usize, t2: usize, g0: Scalar) -> Option<SearchResult> {
        best_level(engine, t1, t2, g0, self.k)
    }
}

/// One level of the recursive sequential search. `depth_left` counts down
/// from the configured `k`; at `depth_left == 2` no further recursion is
/// attempted and the function behaves exactly like `Best2OptMove`.
fn best_level(engine: &mut Engine, t1: usize, t2: usize, g0: Scalar, depth_left: u8) -> Option<SearchResult> {
    let gain_criterion = engine.params().gain_criterion_used() && !engine.repo().problem_kind().suspends_gain_criterion();
    let precision = engine.params().precision();
    let candidates: Vec<_> = engine.candidates().get(t2).iter().copied().collect();

    let pred_t2 = engine.tour().predecessor(&t2);
    let suc_t2 = engine.tour().successor(&t2);

    let mut best: Option<(usize, usize, Scalar)> = None; // (T3, T4, BestG2)

    for cand in candidates {
        let t3 = cand.to;
        if Some(t3) == pred_t2 || Some(t3) == suc_t2 {
            continue;
        }
        let g1 = g0 - cand.cost;
        if gain_criterion && g1 <= 0.0 {
            continue;
        }
        let Some(t4) = engine.tour().predecessor(&t3) else {
            continue;
        };
        if engine.repo().is_fixed_edge(t3, t4) {
            continue;
        }
        let g2 = g1 + engine.repo().cost(t3, t4);
        let closing_gain = g2 - engine.repo().cost(t4, t1);
        if !engine.repo().is_fixed_edge(t4, t1) && closing_gain > 0.0 {
            // flip_at needs a forward pair (t4 == successor(t3)) in its last
            // two args; since t4 here is t3's *predecessor*, the edge
            // (t3, t4) maps onto flip_at's third/fourth slots as (t4, t3).
            engine.apply_swap(t1, t2, t4, t3);
            return Some(SearchResult {
                t4,
                g0: g2,
                gain: closing_gain,
            });
        }

        let cheapest_from_t4 = engine
            .candidates()
            .get(t4)
            .get(0)
            .map(|c| c.cost)
            .unwrap_or(Scalar::INFINITY);
        if gain_criterion && g2 - precision < cheapest_from_t4 {
            continue;
        }
        if engine.swaps().swaps() >= engine.params().max_swaps() || !engine.is_excludable(t3, t4) {
            continue;
        }

        if depth_left > 2 {
            engine.apply_swap(t1, t2, t4, t3);
            if let Some(deeper) = best_level(engine, t1, t4, g2, depth_left - 1) {
                return Some(deeper);
            }
            engine.undo_last_swap();
        }

        match best {
            Some((_, _, best_g2)) if g2 <= best_g2 => {}
            _ => best = Some((t3, t4, g2)),
        }
    }

    let (t3, t4, best_g2) = best?;
    engine.apply_swap(t1, t2, t4, t3);
    engine.exclude_edge(t1, t2);
    engine.exclude_edge(t3, t4);
    Some(SearchResult {
        t4,
        g0: best_g2,
        gain: 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::build_nearest_neighbour;
    use crate::engine::Engine;
    use crate::hash::{HashTable, ZobristTable};
    use crate::params::Params;
    use crate::tour::{Array, Tour, TourImpltor, TourOrder};
    use crate::{RepoBuilder, WeightKind};

    /// A square with one diagonal-ish crossing so the natural 0,1,2,3 tour is
    /// suboptimal and 2-opt has an improving move available.
    fn crossed_square_repo() -> crate::Repo {
        let mut b = RepoBuilder::new(WeightKind::Euc2d).capacity(4);
        b.add(0., 0., 0.)
            .add(10., 10., 0.)
            .add(10., 0., 0.)
            .add(0., 10., 0.);
        b.build().unwrap()
    }

    #[test]
    fn test_best_2opt_move_fixes_crossed_tour() {
        let repo = crossed_square_repo();
        let mut tour = Array::new(&repo);
        tour.apply(&TourOrder::with_nat_ord(4));
        let before = tour.total_distance();

        let candidates = build_nearest_neighbour(&repo, 3);
        let zobrist = ZobristTable::new(4, 1);
        let mut hash_table = HashTable::new(1024, Params::default().precision());
        let mut engine = Engine::new(
            &repo,
            TourImpltor::Array(tour),
            candidates,
            Params::default(),
            1,
            &zobrist,
            &mut hash_table,
        );

        let t1 = 0;
        let t2 = engine.tour().successor(&t1).unwrap();
        let g0 = engine.repo().cost(t1, t2);
        let mut searcher = BestKOptMove::new(2);
        let result = searcher.search(&mut engine, t1, t2, g0);

        assert!(result.is_some());
        let result = result.unwrap();
        assert!(result.gain > 0.0, "the crossed tour has an improving 2-opt move");
        assert!(engine.tour().total_distance() < before);
    }

    #[test]
    fn test_no_move_on_already_optimal_triangle() {
        let mut b = RepoBuilder::new(WeightKind::Euc2d).capacity(3);
        b.add(0., 0., 0.).add(1., 0., 0.).add(0., 1., 0.);
        let repo = b.build().unwrap();
        let mut tour = Array::new(&repo);
        tour.apply(&TourOrder::with_nat_ord(3));

        let candidates = build_nearest_neighbour(&repo, 2);
        let zobrist = ZobristTable::new(3, 1);
        let mut hash_table = HashTable::new(1024, Params::default().precision());
        let mut engine = Engine::new(
            &repo,
            TourImpltor::Array(tour),
            candidates,
            Params::default(),
            1,
            &zobrist,
            &mut hash_table,
        );
        let t1 = 0;
        let t2 = engine.tour().successor(&t1).unwrap();
        let g0 = engine.repo().cost(t1, t2);
        let mut searcher = BestKOptMove::new(2);
        // Every 3-node tour is already optimal; no improving move exists, and
        // with GainCriterionUsed any non-improving candidate is rejected too.
        let result = searcher.search(&mut engine, t1, t2, g0);
        assert!(result.is_none() || result.unwrap().gain <= 0.0);
    }
}
