//! Property tests for the interval tree
//!
//! Random interval sets are checked against a brute-force overlap scan.

use cue_core::timing::{IntervalNode, IntervalTree, Leaf};
use proptest::prelude::*;

#[derive(Debug, Clone, PartialEq)]
struct Interval {
    id: usize,
    low: f64,
    high: f64,
}

impl IntervalNode for Interval {
    fn low(&self) -> f64 {
        self.low
    }

    fn high(&self) -> f64 {
        self.high
    }
}

fn bounds() -> impl Strategy<Value = (f64, f64)> {
    (0u32..5_000, prop_oneof![9 => (0u32..2_000).prop_map(f64::from), 1 => Just(f64::INFINITY)])
        .prop_map(|(low, length)| (f64::from(low), f64::from(low) + length))
}

fn intervals() -> impl Strategy<Value = Vec<Interval>> {
    prop::collection::vec(bounds(), 0..64).prop_map(|bounds| {
        bounds
            .into_iter()
            .enumerate()
            .map(|(id, (low, high))| Interval { id, low, high })
            .collect()
    })
}

fn build(items: &[Interval]) -> IntervalTree<Interval> {
    items.iter().cloned().collect()
}

fn sorted_ids(items: Vec<&Interval>) -> Vec<usize> {
    let mut ids: Vec<_> = items.into_iter().map(|item| item.id).collect();
    ids.sort_unstable();
    ids
}

fn brute_force(items: &[Interval], low: f64, high: f64) -> Vec<usize> {
    items
        .iter()
        .filter(|item| item.low <= high && item.high >= low)
        .map(|item| item.id)
        .collect()
}

/// Largest `high` below `leaf`, recomputed from scratch
fn subtree_max(leaf: &Leaf<Interval>) -> f64 {
    let mut max = f64::NEG_INFINITY;
    let mut stack = vec![leaf];
    while let Some(leaf) = stack.pop() {
        max = max.max(leaf.high());
        stack.extend(leaf.left());
        stack.extend(leaf.right());
    }
    max
}

proptest! {
    #[test]
    fn point_queries_match_brute_force(items in intervals(), point in 0u32..8_000) {
        let point = f64::from(point);
        let tree = build(&items);
        prop_assert_eq!(sorted_ids(tree.query(point)), brute_force(&items, point, point));
    }

    #[test]
    fn range_queries_match_brute_force(items in intervals(), low in 0u32..8_000, width in 0u32..1_000) {
        let (low, high) = (f64::from(low), f64::from(low + width));
        let tree = build(&items);
        prop_assert_eq!(sorted_ids(tree.query((low, high))), brute_force(&items, low, high));
    }

    #[test]
    fn every_leaf_caches_its_subtree_max(items in intervals()) {
        let tree = build(&items);
        let mut stack: Vec<_> = tree.root().into_iter().collect();
        while let Some(leaf) = stack.pop() {
            prop_assert_eq!(leaf.max(), subtree_max(leaf));
            stack.extend(leaf.left());
            stack.extend(leaf.right());
        }
    }

    #[test]
    fn results_come_in_ascending_start_order(items in intervals(), point in 0u32..8_000) {
        let tree = build(&items);
        let starts: Vec<_> = tree.query(f64::from(point)).iter().map(|item| item.low).collect();
        prop_assert!(starts.windows(2).all(|pair| pair[0] <= pair[1]));

        let all: Vec<_> = tree.get_all().iter().map(|item| item.low).collect();
        prop_assert!(all.windows(2).all(|pair| pair[0] <= pair[1]));
        prop_assert_eq!(all.len(), items.len());
    }

    #[test]
    fn queries_are_repeatable(items in intervals(), point in 0u32..8_000) {
        let tree = build(&items);
        let point = f64::from(point);
        prop_assert_eq!(tree.query(point), tree.query(point));
        prop_assert_eq!(tree.query(point), tree.query((point, point)));
    }
}
