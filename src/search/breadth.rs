//! `SwNeighborhoodBreadth`: a breadth-first search over the tree of candidate
//! extensions of the current chain, up to `MaxDepth` levels, returning the
//! first improving node found or (failing that) the single best node seen
//! across the whole tree.
//!
//! The reference implementation keeps the explored tree as a persistent
//! structure of linked nodes and moves between them by walking parent
//! pointers (`ReInitSwaps`/`FindPathToRoot`) so only the swaps that differ
//! between the previously active node and the next one to expand are
//! replayed. This port keeps the tree as plain `Vec<PathStep>` paths from the
//! search root and, when moving the engine's tour to a different queue
//! entry, undoes back to the root and replays that entry's whole path -
//! simpler to get right without shared mutable tree nodes, at the cost of
//! some redundant replay for deep trees. `MaxDepth` keeps that bounded.

use std::collections::VecDeque;

use crate::engine::Engine;
use crate::params::SamplingBias;
use crate::search::{MoveSearcher, SearchResult};
use crate::Scalar;

/// One level of a candidate path: the exact four arguments passed to
/// `Tour::flip_at` (anchor, previous tail, new tail, new candidate), plus the
/// accumulated gain `g0` after taking this step.
#[derive(Debug, Clone, Copy)]
struct PathStep {
    a: usize,
    b: usize,
    c: usize,
    d: usize,
    g0: Scalar,
}

#[derive(Debug, Default)]
pub struct SwNeighborhoodBreadth;

impl MoveSearcher for SwNeighborhoodBreadth {
    fn search(&mut self, engine: &mut Engine, t1: usize, t2: usize, g0: Scalar) -> Option<SearchResult> {
        let lambda = engine.params().lambda();
        let bias = engine.params().sampling_bias_used();
        let gain_criterion = engine.params().gain_criterion_used() && !engine.repo().problem_kind().suspends_gain_criterion();
        let precision = engine.params().precision();
        let max_depth = engine.params().max_depth().max(2);

        let mut queue: VecDeque<Vec<PathStep>> = VecDeque::new();
        queue.push_back(Vec::new());

        let mut current: Vec<PathStep> = Vec::new();
        let mut best: Option<Vec<PathStep>> = None;
        let mut best_gain = Scalar::MIN;
        let mut improving: Option<(Vec<PathStep>, Scalar)> = None;

        while let Some(path) = queue.pop_front() {
            apply_path(engine, &mut current, &path);
            let (tail, tail_g0) = path
                .last()
                .map(|s| (s.c, s.g0))
                .unwrap_or((t2, g0));

            if path.len() >= max_depth {
                continue;
            }

            let count = engine.candidates().get(tail).len();
            let lambda_here = lambda.min(count);
            let mut pool: Vec<usize> = (0..count).collect();
            let mut rng = engine.rng().clone();

            for drawn in 0..lambda_here {
                if pool.is_empty() {
                    break;
                }
                let pick = sample_index(bias, pool.len(), drawn, &mut rng);
                let idx = pool.remove(pick);
                let Some(cand) = engine.candidates().get(tail).get(idx) else {
                    continue;
                };
                let t3 = cand.to;
                let pred_tail = engine.tour().predecessor(&tail);
                let suc_tail = engine.tour().successor(&tail);
                if Some(t3) == pred_tail || Some(t3) == suc_tail {
                    continue;
                }
                let g1 = tail_g0 - cand.cost;
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
                let move_gain = g2 - engine.repo().cost(t4, t1);
                if engine.swaps().swaps() >= engine.params().max_swaps() || !engine.is_excludable(t3, t4) {
                    continue;
                }

                let mut child_path = path.clone();
                child_path.push(PathStep {
                    a: t1,
                    b: tail,
                    c: t4,
                    d: t3,
                    g0: g2,
                });

                if move_gain > 0.0 && !engine.repo().is_fixed_edge(t4, t1) {
                    let better = improving.as_ref().map(|(_, g)| move_gain > *g).unwrap_or(true);
                    if better {
                        improving = Some((child_path.clone(), move_gain));
                    }
                    continue;
                }

                if move_gain > best_gain {
                    best_gain = move_gain;
                    best = Some(child_path.clone());
                }
                queue.push_back(child_path);
            }
            *engine.rng() = rng;

            // A first improving move short-circuits the whole search, same
            // as the reference returning as soon as `moveGain > 0`.
            if improving.is_some() {
                break;
            }
        }

        if let Some((path, gain)) = improving {
            apply_path(engine, &mut current, &path);
            let last = path.last().unwrap();
            return Some(SearchResult {
                t4: last.c,
                g0: last.g0,
                gain,
            });
        }

        if let Some(path) = best {
            apply_path(engine, &mut current, &path);
            let last = path.last().unwrap();
            engine.exclude_edge(last.a, last.b);
            engine.exclude_edge(last.d, last.c);
            return Some(SearchResult {
                t4: last.c,
                g0: last.g0,
                gain: 0.0,
            });
        }

        undo_to_base(engine, &mut current);
        None
    }
}

fn sample_index(bias: SamplingBias, remaining: usize, level: usize, rng: &mut impl rand::Rng) -> usize {
    match bias {
        SamplingBias::Deterministic => 0,
        SamplingBias::Uniform => rng.gen_range(0..remaining),
        SamplingBias::Geometric => {
            let u: f64 = rng.gen_range(f64::MIN_POSITIVE..1.0);
            let raw = (-u.log2()).trunc() as usize;
            let _ = level;
            raw.min(remaining - 1)
        }
    }
}

fn undo_to_base(engine: &mut Engine, current: &mut Vec<PathStep>) {
    while !current.is_empty() {
        engine.undo_last_swap();
        current.pop();
    }
}

fn apply_path(engine: &mut Engine, current: &mut Vec<PathStep>, path: &[PathStep]) {
    undo_to_base(engine, current);
    for step in path {
        engine.apply_swap(step.a, step.b, step.c, step.d);
        current.push(*step);
    }
}
