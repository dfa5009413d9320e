//! Tour representation: the ring of nodes plus the `Tour` trait both concrete
//! representations ([`array::Array`] and [`tll::TwoLevelList`]) implement.
//!
//! `between`/`between_at` answer "does b lie on the a-to-c arc" in O(1)
//! (amortised, for the segmented representation) by comparing each node's
//! position key rather than walking the ring.

pub mod array;
pub mod tll;

#[cfg(test)]
pub(crate) mod tests;

pub use array::Array;
pub use tll::TwoLevelList;

use enum_dispatch::enum_dispatch;

use crate::Scalar;

/// How `other` relates to `base` in the current tour direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRel {
    Predecessor,
    Successor,
    /// `other` is neither tour-adjacent neighbour of `base`.
    None,
}

/// The tour representation both [`array::Array`] and [`tll::TwoLevelList`]
/// implement. Node identity is just the dense node id (`TourNode = usize`):
/// there is no separate handle type to keep alive or invalidate.
#[enum_dispatch]
pub trait Tour {
    /// Number of nodes in the tour.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rebuilds the tour to match `order`, recomputing cached total distance.
    fn apply(&mut self, order: &TourOrder);

    /// Sum of `distance(n, successor(n))` over all nodes, as of the last `apply`.
    fn total_distance(&self) -> Scalar;

    /// `Some(id)` iff `id` is a valid node id in this tour (trivial identity
    /// lookup; kept as a method so callers don't need to know node ids are
    /// literally the `TourNode` representation).
    fn get(&self, id: usize) -> Option<usize>;

    fn predecessor(&self, node: &usize) -> Option<usize>;

    fn successor(&self, node: &usize) -> Option<usize>;

    /// How `other` relates to `base`: predecessor, successor, or neither.
    fn relation(&self, base: &usize, other: &usize) -> NodeRel {
        match (self.predecessor(base), self.successor(base)) {
            (Some(p), _) if p == *other => NodeRel::Predecessor,
            (_, Some(s)) if s == *other => NodeRel::Successor,
            _ => NodeRel::None,
        }
    }

    /// True iff `b` lies on the `a`-to-`c` arc, following the tour's current
    /// successor direction.
    fn between_at(&self, a: usize, b: usize, c: usize) -> bool;

    /// True iff `a` and `b` are tour-adjacent (in either direction).
    fn near(&self, a: usize, b: usize) -> bool {
        self.successor(&a) == Some(b) || self.predecessor(&a) == Some(b)
    }

    /// Distance between two nodes, delegating to the underlying repo.
    fn distance(&self, a: usize, b: usize) -> Scalar;

    /// The 2-opt reconnection primitive (`Swap1` in the design): `(t1,t2)` and
    /// `(t3,t4)` must each be tour-adjacent pairs. Removes those two edges and
    /// adds `(t1,t3)` and `(t2,t4)`, reversing whichever arc between them is
    /// cheaper to reverse. This is its own inverse: re-calling with the same
    /// four ids (in the complementary order the caller used, e.g.
    /// `(t1,t3,t2,t4)`) restores the original tour.
    fn flip_at(&mut self, t1: usize, t2: usize, t3: usize, t4: usize);

    /// Node ids in current tour order, starting from node 0.
    fn itr(&self) -> TourIter<'_>
    where
        Self: Sized,
    {
        TourIter {
            tour: self,
            start: 0,
            current: Some(0),
            done: false,
        }
    }
}

pub struct TourIter<'a> {
    tour: &'a dyn Tour,
    start: usize,
    current: Option<usize>,
    done: bool,
}

impl<'a> Iterator for TourIter<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.done {
            return None;
        }
        let cur = self.current?;
        self.current = self.tour.successor(&cur);
        if self.current == Some(self.start) {
            self.done = true;
        }
        Some(cur)
    }
}

/// Either concrete tour representation, dispatched without a vtable.
#[enum_dispatch(Tour)]
pub enum TourImpltor<'a> {
    Array(array::Array<'a>),
    TwoLevelList(tll::TwoLevelList<'a>),
}

/// An explicit visiting order, as used by `Tour::apply` and test fixtures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TourOrder {
    order: Vec<usize>,
}

impl TourOrder {
    pub fn with_ord(order: Vec<usize>) -> Self {
        Self { order }
    }

    /// The identity order `0, 1, .., n - 1`.
    pub fn with_nat_ord(n: usize) -> Self {
        Self {
            order: (0..n).collect(),
        }
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Flattens a mix of ranges and reversed ranges into one `Vec<usize>`, used by
/// the `tour_order!` macro to express expected post-flip orders concisely.
pub fn combine_range<I>(pieces: Vec<I>) -> Vec<usize>
where
    I: IntoIterator<Item = usize>,
{
    pieces.into_iter().flatten().collect()
}

/// Builds a [`TourOrder`] from a comma-separated list of ranges (forward or
/// `.rev()`), e.g. `tour_order!(0..4, (4..9).rev(), 9..n)`.
#[macro_export]
macro_rules! tour_order {
    ($($piece:expr),+ $(,)?) => {
        $crate::tour::TourOrder::with_ord(
            $crate::tour::combine_range(vec![$($piece.into_iter().collect::<Vec<usize>>()),+])
        )
    };
}

/// `true` iff `b` lies strictly between `a` and `c` when walking position keys
/// forward (wrapping). Used directly by both tour representations once they've
/// reduced "is X between Y and Z" to a comparison of three orderable keys.
pub fn between<K: PartialOrd>(a: K, b: K, c: K) -> bool {
    if a < c {
        a < b && b < c
    } else {
        b > a || b < c
    }
}
