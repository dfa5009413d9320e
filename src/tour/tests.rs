use crate::repo::{Repo, RepoBuilder, WeightKind};
use crate::tour::{between, NodeRel, Tour, TourOrder};
use crate::Scalar;

pub(crate) fn create_repo(n_nodes: usize) -> Repo {
    let mut builder = RepoBuilder::new(WeightKind::Euc2d).capacity(n_nodes);
    for ii in 0..n_nodes {
        builder.add(ii as Scalar, ii as Scalar, ii as Scalar);
    }
    builder.build().unwrap()
}

pub(crate) fn test_tour_order(tour: &impl Tour, expected: &TourOrder) {
    let expected = expected.order();
    let len = expected.len();

    assert_eq!(tour.len(), len, "Test tour len");

    for ii in 0..len {
        let base = tour.get(expected[ii]);
        assert!(base.is_some());
        let base = base.unwrap();
        let pred = tour.predecessor(&base);
        let succ = tour.successor(&base);

        // If both orders are in the same direction, pred = targ1 and succ = targ2.
        // If one of them is reversed, pred = targ2 and succ = targ1.
        let targ1 = tour.get(expected[(len + ii - 1) % len]);
        let targ2 = tour.get(expected[(ii + 1) % len]);

        assert!(pred.is_some());
        assert!(
            pred == targ1 || pred == targ2,
            "Test predecessor at index = {}",
            ii
        );
        assert_eq!(NodeRel::Successor, tour.relation(&base, &pred.unwrap()));

        assert!(succ.is_some());
        assert!(
            succ == targ1 || succ == targ2,
            "Test successor at index = {}",
            ii
        );
        assert_eq!(NodeRel::Predecessor, tour.relation(&base, &succ.unwrap()));
    }
}

#[test]
fn test_between() {
    // 1 -> 2 -> 3 -> 4 -> 5
    assert!(between(1, 3, 4)); // true
    assert!(!between(1, 5, 4)); // false
    assert!(between(5, 1, 3)); // true
    assert!(!between(5, 3, 1)); // false
}

#[allow(dead_code, unused_imports)]
mod test_suite {
    use crate::tour::{tests::test_tour_order, Tour, TourOrder};
    use crate::tour_order;
    use crate::Scalar;

    pub fn apply(tour: &mut impl Tour) {
        let expected = TourOrder::with_ord(vec![3, 0, 4, 1, 6, 8, 7, 9, 5, 2]);
        tour.apply(&expected);
        test_tour_order(tour, &expected);
    }

    pub fn total_dist(tour: &mut impl Tour) {
        assert_eq!(4, tour.len());
        tour.apply(&TourOrder::with_ord(vec![0, 1, 2, 3]));
        assert_eq!(6. * (2. as Scalar).sqrt(), tour.total_distance());

        tour.apply(&TourOrder::with_ord(vec![1, 3, 0, 2]));
        assert_eq!(8. * (2. as Scalar).sqrt(), tour.total_distance());
    }

    pub fn between(tour: &mut impl Tour) {
        assert_eq!(10, tour.len());
        tour.apply(&TourOrder::with_nat_ord(10));

        //  0 -> 1 -> 2 -> 3 -> 4 -> 5 -> 6 -> 7 -> 8 -> 9

        // All vertices reside under the same segment.
        assert!(tour.between_at(0, 1, 2)); // true
        assert!(!tour.between_at(0, 2, 1)); // false
        assert!(!tour.between_at(2, 1, 0)); // false
        assert!(tour.between_at(2, 0, 1)); // true

        // All vertices reside under distinct segments.
        assert!(tour.between_at(2, 3, 7)); // true
        assert!(!tour.between_at(2, 7, 3)); // false
        assert!(!tour.between_at(7, 3, 2)); // false
        assert!(tour.between_at(7, 2, 3)); // true

        // Two out of three vertices reside under the same segment.
        assert!(tour.between_at(3, 5, 8)); // true
        assert!(!tour.between_at(3, 8, 5)); // false
        assert!(!tour.between_at(8, 5, 3)); // false
        assert!(tour.between_at(8, 3, 5)); // true

        // Reverse [3 4 5]
        assert!(tour.between_at(3, 4, 5)); // true
        assert!(!tour.between_at(5, 4, 3)); // false

        tour.flip_at(2, 3, 5, 6);

        assert!(!tour.between_at(3, 4, 5)); // false
        assert!(tour.between_at(5, 4, 3)); // true

        assert!(!tour.between_at(3, 5, 8)); // false
        assert!(tour.between_at(3, 8, 5)); // true
        assert!(tour.between_at(8, 5, 3)); // true
        assert!(!tour.between_at(8, 3, 5)); // false
    }

    pub fn flip(tour: &mut impl Tour) {
        flip_1(tour);
        flip_2(tour);
    }

    // New paths lie within the same segment or span a handful of them.
    fn flip_1(tour: &mut impl Tour) {
        let n_nodes = 100;
        assert_eq!(n_nodes, tour.len());
        tour.apply(&tour_order!(0..n_nodes));

        tour.flip_at(3, 4, 8, 9);
        test_tour_order(tour, &tour_order!(0..4, (4..9).rev(), 9..n_nodes));

        tour.flip_at(3, 8, 4, 9);
        test_tour_order(tour, &TourOrder::with_nat_ord(n_nodes));

        // Reverses an entire segment's worth of nodes.
        tour.flip_at(9, 10, 19, 20);
        test_tour_order(tour, &tour_order!(0..10, (10..20).rev(), 20..n_nodes));

        tour.flip_at(10, 20, 9, 19);
        test_tour_order(tour, &TourOrder::with_nat_ord(n_nodes));
    }

    // New paths consist of a run of several consecutive segments.
    fn flip_2(tour: &mut impl Tour) {
        let n_nodes = 100;
        assert_eq!(n_nodes, tour.len());
        tour.apply(&TourOrder::with_nat_ord(n_nodes));

        tour.flip_at(9, 10, 39, 40);
        test_tour_order(tour, &tour_order!(0..10, (10..40).rev(), 40..n_nodes));

        tour.flip_at(10, 40, 9, 39);
        test_tour_order(tour, &TourOrder::with_nat_ord(n_nodes));
    }
}

#[allow(dead_code, unused_imports)]
mod tests_array {
    use super::*;
    use crate::tour::Array;

    #[test]
    fn test_apply() {
        let repo = create_repo(10);
        let mut tour = Array::new(&repo);
        test_suite::apply(&mut tour);
    }

    #[test]
    fn test_total_dist() {
        let repo = create_repo(4);
        let mut tour = Array::new(&repo);
        test_suite::total_dist(&mut tour);
    }

    #[test]
    fn test_between() {
        let repo = create_repo(10);
        let mut tour = Array::new(&repo);
        test_suite::between(&mut tour);
    }

    #[test]
    fn test_flip_cases() {
        let repo = create_repo(100);
        let mut tour = Array::new(&repo);
        test_suite::flip(&mut tour);
    }
}

#[allow(dead_code, unused_imports)]
mod test_tll {
    use super::*;
    use crate::tour::TwoLevelList;

    #[test]
    fn test_apply() {
        let repo = create_repo(10);
        let mut tour = TwoLevelList::new(&repo, 4);
        test_suite::apply(&mut tour);
    }

    #[test]
    fn test_total_dist() {
        let repo = create_repo(4);
        let mut tour = TwoLevelList::new(&repo, 3);
        test_suite::total_dist(&mut tour);
    }

    #[test]
    fn test_between() {
        let repo = create_repo(10);
        let mut tour = TwoLevelList::new(&repo, 3);
        test_suite::between(&mut tour);
    }

    #[test]
    fn test_flip_cases() {
        let repo = create_repo(100);
        let mut tour = TwoLevelList::new(&repo, 10);
        test_suite::flip(&mut tour);
    }
}
