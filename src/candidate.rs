//! Candidate-edge lists and the minimum-spanning-tree helper used to build them.
//!
//! The real candidate-set construction LKH relies on - α-nearness computed
//! from a minimum 1-tree - is explicitly out of scope for this engine: the
//! searchers only ever consume the ordered, capped list this module produces,
//! never how it was built. What's here is the minimal stand-in (nearest
//! neighbours plus a plain MST) needed to drive the engine end to end; a real
//! deployment swaps it for a proper α-nearness precomputation without the
//! engine noticing.

use crate::repo::Repo;
use crate::Scalar;

/// One entry of a node's candidate list: a preferred neighbour and its cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub to: usize,
    pub cost: Scalar,
}

/// A node's candidate list, ordered cost-ascending and capped at `MaxCandidates`.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    entries: Vec<Candidate>,
}

impl CandidateSet {
    pub fn new(mut entries: Vec<Candidate>, max: usize) -> Self {
        entries.sort_by(|a, b| a.cost.partial_cmp(&b.cost).unwrap());
        entries.truncate(max);
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&Candidate> {
        self.entries.get(i)
    }

    pub fn contains(&self, to: usize) -> bool {
        self.entries.iter().any(|c| c.to == to)
    }
}

/// Per-node candidate sets for an entire [`Repo`], indexed by node id.
#[derive(Debug, Default, Clone)]
pub struct CandidateLists {
    sets: Vec<CandidateSet>,
}

impl CandidateLists {
    pub fn get(&self, id: usize) -> &CandidateSet {
        &self.sets[id]
    }
}

/// Builds candidate lists from plain nearest-neighbour ranking: for each node,
/// the `max_candidates` closest other nodes by raw distance.
///
/// This is the minimal external collaborator the engine needs to run; it is
/// deliberately not the α-nearness ranking LKH itself uses.
pub fn build_nearest_neighbour(repo: &Repo, max_candidates: usize) -> CandidateLists {
    let n = repo.len();
    let mut sets = Vec::with_capacity(n);
    for a in 0..n {
        let mut entries: Vec<Candidate> = (0..n)
            .filter(|&b| b != a)
            .map(|b| Candidate {
                to: b,
                cost: repo.cost(a, b),
            })
            .collect();
        entries.sort_by(|x, y| x.cost.partial_cmp(&y.cost).unwrap());
        entries.truncate(max_candidates);
        sets.push(CandidateSet::new(entries, max_candidates));
    }
    CandidateLists { sets }
}

/// Builds a minimum spanning tree over `repo`'s distance kernel via Prim's
/// algorithm, returning the parent of each node (`None` for the root, node 0).
///
/// Grounded on the classic Prim loop (`Dad`/`Cost`/`Loc` scratch fields in the
/// node model exist for exactly this).
pub fn build_mst(repo: &Repo) -> Vec<Option<usize>> {
    let n = repo.len();
    if n == 0 {
        return Vec::new();
    }

    let mut dad: Vec<Option<usize>> = vec![None; n];
    let mut cost = vec![Scalar::INFINITY; n];
    let mut in_tree = vec![false; n];

    cost[0] = 0.;
    for _ in 0..n {
        let next = (0..n)
            .filter(|&v| !in_tree[v])
            .min_by(|&a, &b| cost[a].partial_cmp(&cost[b]).unwrap());
        let Some(u) = next else { break };
        in_tree[u] = true;

        for v in 0..n {
            if in_tree[v] || v == u {
                continue;
            }
            let d = repo.distance(u, v);
            if d < cost[v] {
                cost[v] = d;
                dad[v] = Some(u);
            }
        }
    }

    dad
}

/// A minimum-spanning-tree builder, as a trait so alternative implementations
/// (e.g. an α-nearness-producing 1-tree) can be swapped in behind the same
/// call site.
pub trait STree {
    fn build_mst(&self) -> Vec<Option<usize>>;
}

impl STree for Repo {
    fn build_mst(&self) -> Vec<Option<usize>> {
        build_mst(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::{MatrixKind, RepoBuilder, WeightKind};
    use std::collections::HashMap;

    #[test]
    fn test_build_mst() {
        // Data is taken from the Wikipedia article on minimum spanning trees.
        let costs = vec![
            vec![0., 1., 0., 4., 3., 0.],
            vec![0., 0., 4., 2., 0.],
            vec![0., 0., 4., 5.],
            vec![0., 4., 0.],
            vec![0., 7.],
            vec![0.],
        ];

        let repo = RepoBuilder::new(WeightKind::Euc2d)
            .costs(costs, MatrixKind::UpperDiagRow)
            .build()
            .unwrap();

        let dad = repo.build_mst();

        let result: HashMap<usize, Option<usize>> =
            dad.iter().enumerate().map(|(i, &p)| (i, p)).collect();

        // There are several valid MSTs for this graph; this is the one the
        // Wikipedia article shows for Prim starting at node 0.
        let expected: HashMap<usize, Option<usize>> = [
            (0, None),
            (1, Some(0)),
            (4, Some(1)),
            (3, Some(0)),
            (2, Some(4)),
            (5, Some(2)),
        ]
        .iter()
        .cloned()
        .collect();

        assert_eq!(expected, result);
    }

    #[test]
    fn test_nearest_neighbour_ordering() {
        let mut b = RepoBuilder::new(WeightKind::Euc2d).capacity(4);
        b.add(0., 0., 0.).add(1., 0., 0.).add(2., 0., 0.).add(5., 0., 0.);
        let repo = b.build().unwrap();

        let lists = build_nearest_neighbour(&repo, 2);
        let near0 = lists.get(0);
        assert_eq!(near0.len(), 2);
        assert_eq!(near0.get(0).unwrap().to, 1);
        assert_eq!(near0.get(1).unwrap().to, 2);
    }
}
