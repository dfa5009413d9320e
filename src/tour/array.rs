//! The naive array-backed tour: an O(n) `flip_at`, used as a baseline/testing
//! representation and for small instances where the segmented tour's overhead
//! isn't worth paying.

use crate::repo::Repo;
use crate::tour::{between, Tour, TourOrder};
use crate::Scalar;

#[derive(Debug)]
pub struct Array<'a> {
    repo: &'a Repo,
    /// `order[pos]` is the node id at position `pos`.
    order: Vec<usize>,
    /// `position[id]` is the inverse of `order`.
    position: Vec<usize>,
    total_dist: Scalar,
}

impl<'a> Array<'a> {
    pub fn new(repo: &'a Repo) -> Self {
        let n = repo.len();
        Self {
            repo,
            order: (0..n).collect(),
            position: (0..n).collect(),
            total_dist: 0.,
        }
    }

    fn recompute_total(&mut self) {
        let n = self.order.len();
        self.total_dist = (0..n)
            .map(|i| self.repo.distance(self.order[i], self.order[(i + 1) % n]))
            .sum();
    }
}

impl<'a> Tour for Array<'a> {
    fn len(&self) -> usize {
        self.order.len()
    }

    fn apply(&mut self, tour: &TourOrder) {
        self.order = tour.order().to_vec();
        self.position = vec![0; self.order.len()];
        for (pos, &id) in self.order.iter().enumerate() {
            self.position[id] = pos;
        }
        self.recompute_total();
    }

    fn total_distance(&self) -> Scalar {
        self.total_dist
    }

    fn get(&self, id: usize) -> Option<usize> {
        if id < self.order.len() {
            Some(id)
        } else {
            None
        }
    }

    fn predecessor(&self, node: &usize) -> Option<usize> {
        let n = self.order.len();
        let pos = *self.position.get(*node)?;
        Some(self.order[(pos + n - 1) % n])
    }

    fn successor(&self, node: &usize) -> Option<usize> {
        let n = self.order.len();
        let pos = *self.position.get(*node)?;
        Some(self.order[(pos + 1) % n])
    }

    fn between_at(&self, a: usize, b: usize, c: usize) -> bool {
        match (
            self.position.get(a),
            self.position.get(b),
            self.position.get(c),
        ) {
            (Some(&pa), Some(&pb), Some(&pc)) => between(pa, pb, pc),
            _ => false,
        }
    }

    fn distance(&self, a: usize, b: usize) -> Scalar {
        self.repo.distance(a, b)
    }

    /// Precondition (the caller normalises orientation before calling, as the
    /// move searchers do): `t2 == successor(t1)` and `t4 == successor(t3)`.
    /// Removing edges `(t1,t2)`/`(t3,t4)` and adding `(t1,t3)`/`(t2,t4)` is
    /// achieved by reversing the arc from `t2` forward to `t3` - or,
    /// equivalently and often cheaper, its complementary arc from `t4`
    /// forward to `t1`, since both leave the identical resulting cycle.
    fn flip_at(&mut self, t1: usize, t2: usize, t3: usize, t4: usize) {
        let n = self.order.len();
        let (p1, p2, p3, p4) = (
            self.position[t1],
            self.position[t2],
            self.position[t3],
            self.position[t4],
        );
        debug_assert_eq!((p1 + 1) % n, p2, "t2 must be the successor of t1");
        debug_assert_eq!((p3 + 1) % n, p4, "t4 must be the successor of t3");

        reverse_arc(&mut self.order, &mut self.position, p2, p3, n);
        self.recompute_total();
    }
}

/// Reverses the shorter of the two arcs between `start` and `end` (inclusive,
/// walking forward from `start`), since reversing either one yields the same
/// resulting cycle.
fn reverse_arc(
    order: &mut [usize],
    position: &mut [usize],
    start: usize,
    end: usize,
    n: usize,
) {
    let fwd_len = (end + n - start) % n + 1;
    let (s, e) = if fwd_len * 2 <= n {
        (start, end)
    } else {
        ((end + 1) % n, (start + n - 1) % n)
    };

    let len = (e + n - s) % n + 1;
    let mut lo = s;
    let mut hi = e;
    for _ in 0..(len / 2) {
        order.swap(lo, hi);
        position[order[lo]] = lo;
        position[order[hi]] = hi;
        lo = (lo + 1) % n;
        hi = (hi + n - 1) % n;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tour::tests::create_repo;

    #[test]
    fn test_basic_cycle() {
        let repo = create_repo(6);
        let mut tour = Array::new(&repo);
        tour.apply(&TourOrder::with_nat_ord(6));
        assert_eq!(tour.successor(&0), Some(1));
        assert_eq!(tour.predecessor(&0), Some(5));
    }
}
