//! The sampled 2-opt searchers: `Best2OptMoveSW` draws only `Lambda`
//! candidates (instead of all of them) per level, and `Best2OptMoveSWBest`
//! additionally keeps searching past the first improving candidate to apply
//! the best *improving* one found among the sample rather than the first.
//!
//! Sampling order is governed by `SamplingBiasUsed`: deterministic
//! (candidate-list order), uniform random, or geometrically biased toward
//! the front of the remaining pool. Candidates are drawn without replacement
//! by swapping a chosen index to the end of a scratch permutation
//! (`ShiftToEnd` in the design) rather than removing from the middle of a
//! vector.

use rand::Rng;

use crate::engine::Engine;
use crate::params::SamplingBias;
use crate::search::{MoveSearcher, SearchResult};
use crate::Scalar;

/// Draws `lambda` candidate indices out of `count` without replacement,
/// honouring `bias`. Returns the drawn index into the *original* candidate
/// order each time (`ShiftToEnd` keeps undrawn indices contiguous at the
/// front of `pool`).
struct Sampler {
    pool: Vec<usize>,
}

impl Sampler {
    fn new(count: usize) -> Self {
        Self {
            pool: (0..count).collect(),
        }
    }

    fn remaining(&self) -> usize {
        self.pool.len()
    }

    /// Picks one index according to `bias`, removes it from the pool by
    /// swapping it to the end and truncating, and returns the original
    /// candidate-list index.
    fn draw(&mut self, bias: SamplingBias, rng: &mut impl Rng) -> usize {
        let remaining = self.pool.len();
        let pick = match bias {
            SamplingBias::Deterministic => 0,
            SamplingBias::Uniform => rng.gen_range(0..remaining),
            SamplingBias::Geometric => {
                // -log2(U) biases small indices; clamp into range.
                let u: f64 = rng.gen_range(f64::MIN_POSITIVE..1.0);
                let raw = (-u.log2()).trunc() as usize;
                raw.min(remaining - 1)
            }
        };
        self.pool.remove(pick)
    }
}

/// Shared sampled-search body: draws up to `lambda` candidates of `t2` and
/// applies `on_candidate` to each feasible one, in sampled order.
fn for_each_sampled_candidate(
    engine: &Engine,
    t2: usize,
    lambda: usize,
    bias: SamplingBias,
    rng: &mut impl Rng,
    mut on_candidate: impl FnMut(usize, Scalar),
) {
    let count = engine.candidates().get(t2).len();
    let lambda = lambda.min(count);
    let mut sampler = Sampler::new(count);
    let mut drawn = 0;
    while drawn < lambda && sampler.remaining() > 0 {
        let idx = sampler.draw(bias, rng);
        drawn += 1;
        let Some(cand) = engine.candidates().get(t2).get(idx) else {
            continue;
        };
        on_candidate(cand.to, cand.cost);
    }
}

/// `Best2OptMoveSW`: samples `Lambda` candidates, returns immediately on the
/// first feasible improving close, otherwise keeps the best non-improving
/// continuation among the sample.
#[derive(Debug, Default)]
pub struct Best2OptMoveSW;

impl MoveSearcher for Best2OptMoveSW {
    fn search(&mut self, engine: &mut Engine, t1: usize, t2: usize, g0: Scalar) -> Option<SearchResult> {
        let lambda = engine.params().lambda();
        let bias = engine.params().sampling_bias_used();
        let gain_criterion = engine.params().gain_criterion_used() && !engine.repo().problem_kind().suspends_gain_criterion();
        let precision = engine.params().precision();

        let pred_t2 = engine.tour().predecessor(&t2);
        let suc_t2 = engine.tour().successor(&t2);

        let mut improving: Option<SearchResult> = None;
        let mut best: Option<(usize, usize, Scalar)> = None;

        let candidates = {
            let mut out = Vec::new();
            let mut rng_copy = engine.rng().clone();
            for_each_sampled_candidate(engine, t2, lambda, bias, &mut rng_copy, |to, cost| {
                out.push((to, cost))
            });
            *engine.rng() = rng_copy;
            out
        };

        'outer: for (t3, cand_cost) in candidates {
            if Some(t3) == pred_t2 || Some(t3) == suc_t2 {
                continue;
            }
            let g1 = g0 - cand_cost;
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
                engine.apply_swap(t1, t2, t4, t3);
                improving = Some(SearchResult {
                    t4,
                    g0: g2,
                    gain: closing_gain,
                });
                break 'outer;
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
            match best {
                Some((_, _, best_g2)) if g2 <= best_g2 => {}
                _ => best = Some((t3, t4, g2)),
            }
        }

        if let Some(result) = improving {
            return Some(result);
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
}

/// `Best2OptMoveSWBest`: like [`Best2OptMoveSW`] but never stops early on the
/// first improving candidate - it samples the full `Lambda` draw and applies
/// whichever improving move had the largest gain (falling back to the best
/// non-improving continuation if none improved).
#[derive(Debug, Default)]
pub struct Best2OptMoveSWBest;

impl MoveSearcher for Best2OptMoveSWBest {
    fn search(&mut self, engine: &mut Engine, t1: usize, t2: usize, g0: Scalar) -> Option<SearchResult> {
        let lambda = engine.params().lambda();
        let bias = engine.params().sampling_bias_used();
        let gain_criterion = engine.params().gain_criterion_used() && !engine.repo().problem_kind().suspends_gain_criterion();
        let precision = engine.params().precision();

        let pred_t2 = engine.tour().predecessor(&t2);
        let suc_t2 = engine.tour().successor(&t2);

        let candidates = {
            let mut out = Vec::new();
            let mut rng_copy = engine.rng().clone();
            for_each_sampled_candidate(engine, t2, lambda, bias, &mut rng_copy, |to, cost| {
                out.push((to, cost))
            });
            *engine.rng() = rng_copy;
            out
        };

        let mut best_improving: Option<(usize, usize, Scalar, Scalar)> = None; // t3,t4,g2,gain
        let mut best: Option<(usize, usize, Scalar)> = None;

        for (t3, cand_cost) in candidates {
            if Some(t3) == pred_t2 || Some(t3) == suc_t2 {
                continue;
            }
            let g1 = g0 - cand_cost;
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
                let better = match best_improving {
                    Some((_, _, _, best_gain)) => closing_gain > best_gain,
                    None => true,
                };
                if better {
                    best_improving = Some((t3, t4, g2, closing_gain));
                }
                continue;
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
            match best {
                Some((_, _, best_g2)) if g2 <= best_g2 => {}
                _ => best = Some((t3, t4, g2)),
            }
        }

        if let Some((t3, t4, g2, gain)) = best_improving {
            engine.apply_swap(t1, t2, t4, t3);
            return Some(SearchResult { t4, g0: g2, gain });
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

    fn crossed_square_repo() -> crate::Repo {
        let mut b = RepoBuilder::new(WeightKind::Euc2d).capacity(4);
        b.add(0., 0., 0.)
            .add(10., 10., 0.)
            .add(10., 0., 0.)
            .add(0., 10., 0.);
        b.build().unwrap()
    }

    #[test]
    fn test_sampled_2opt_finds_improving_move_with_full_lambda() {
        let repo = crossed_square_repo();
        let mut tour = Array::new(&repo);
        tour.apply(&TourOrder::with_nat_ord(4));
        let before = tour.total_distance();

        let candidates = build_nearest_neighbour(&repo, 3);
        let params = Params::builder().lambda(3).build();
        let zobrist = ZobristTable::new(4, 1);
        let mut hash_table = HashTable::new(1024, params.precision());
        let mut engine = Engine::new(
            &repo,
            TourImpltor::Array(tour),
            candidates,
            params,
            1,
            &zobrist,
            &mut hash_table,
        );

        let t1 = 0;
        let t2 = engine.tour().successor(&t1).unwrap();
        let g0 = engine.repo().cost(t1, t2);
        let mut searcher = Best2OptMoveSW::default();
        let result = searcher.search(&mut engine, t1, t2, g0).unwrap();
        assert!(result.gain > 0.0);
        assert!(engine.tour().total_distance() < before);
    }

    #[test]
    fn test_sw_best_picks_the_larger_gain() {
        let repo = crossed_square_repo();
        let mut tour = Array::new(&repo);
        tour.apply(&TourOrder::with_nat_ord(4));

        let candidates = build_nearest_neighbour(&repo, 3);
        let params = Params::builder().lambda(3).build();
        let zobrist = ZobristTable::new(4, 1);
        let mut hash_table = HashTable::new(1024, params.precision());
        let mut engine = Engine::new(
            &repo,
            TourImpltor::Array(tour),
            candidates,
            params,
            1,
            &zobrist,
            &mut hash_table,
        );

        let t1 = 0;
        let t2 = engine.tour().successor(&t1).unwrap();
        let g0 = engine.repo().cost(t1, t2);
        let mut searcher = Best2OptMoveSWBest::default();
        let result = searcher.search(&mut engine, t1, t2, g0).unwrap();
        assert!(result.gain > 0.0);
    }
}
