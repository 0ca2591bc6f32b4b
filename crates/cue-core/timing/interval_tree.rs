//! Augmented interval tree for active-cue lookup
//!
//! An unbalanced binary search tree keyed by interval start. Every leaf
//! keeps `max`, the largest end in its subtree, so whole left subtrees that
//! end before the query can be skipped. The tree is built once per parse
//! and only grows; caption tracks are small enough that the worst case
//! (insertion in ascending order yields a list) is acceptable.
//!
//! Traversals use an explicit stack, so a list-shaped tree cannot overflow
//! the call stack.
//!
//! # Query semantics
//!
//! Queries are inclusive on both ends: an interval `[low, high]` is reported
//! for the query `[qlow, qhigh]` when `low <= qhigh && high >= qlow`. A point
//! query `p` is the range `[p, p]`. Results come in-order (left subtree,
//! node, right subtree), which is ascending `low`; equal starts are routed
//! left, so among ties the later insertion comes first.
//!
//! ```rust
//! use cue_core::timing::{IntervalNode, IntervalTree};
//!
//! struct Span(f64, f64);
//! impl IntervalNode for Span {
//!     fn low(&self) -> f64 { self.0 }
//!     fn high(&self) -> f64 { self.1 }
//! }
//!
//! let mut tree = IntervalTree::new();
//! tree.insert(Span(0.0, 1000.0));
//! tree.insert(Span(500.0, 1500.0));
//! assert_eq!(tree.query(750.0).len(), 2);
//! assert_eq!(tree.query((1200.0, 2000.0)).len(), 1);
//! ```

use core::ops::RangeInclusive;
use std::sync::Arc;

/// Anything with a closed time interval
pub trait IntervalNode {
    /// Interval start
    fn low(&self) -> f64;
    /// Interval end, possibly infinite
    fn high(&self) -> f64;
}

impl<T: IntervalNode + ?Sized> IntervalNode for Arc<T> {
    fn low(&self) -> f64 {
        (**self).low()
    }

    fn high(&self) -> f64 {
        (**self).high()
    }
}

/// Inclusive query range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryRange {
    /// Range start
    pub low: f64,
    /// Range end
    pub high: f64,
}

impl From<f64> for QueryRange {
    fn from(point: f64) -> Self {
        Self { low: point, high: point }
    }
}

impl From<(f64, f64)> for QueryRange {
    fn from((low, high): (f64, f64)) -> Self {
        Self { low, high }
    }
}

impl From<RangeInclusive<f64>> for QueryRange {
    fn from(range: RangeInclusive<f64>) -> Self {
        Self {
            low: *range.start(),
            high: *range.end(),
        }
    }
}

/// Tree leaf wrapping one item
#[derive(Debug, Clone)]
pub struct Leaf<T> {
    item: T,
    low: f64,
    high: f64,
    max: f64,
    left: Option<Box<Leaf<T>>>,
    right: Option<Box<Leaf<T>>>,
}

impl<T> Leaf<T> {
    /// Wrapped item
    #[must_use]
    pub const fn item(&self) -> &T {
        &self.item
    }

    /// Interval start captured at insertion
    #[must_use]
    pub const fn low(&self) -> f64 {
        self.low
    }

    /// Interval end captured at insertion
    #[must_use]
    pub const fn high(&self) -> f64 {
        self.high
    }

    /// Largest `high` in this subtree
    #[must_use]
    pub const fn max(&self) -> f64 {
        self.max
    }

    /// Subtree of intervals starting at or before this one
    #[must_use]
    pub fn left(&self) -> Option<&Self> {
        self.left.as_deref()
    }

    /// Subtree of intervals starting after this one
    #[must_use]
    pub fn right(&self) -> Option<&Self> {
        self.right.as_deref()
    }
}

/// Insert-only augmented interval tree
#[derive(Debug, Clone)]
pub struct IntervalTree<T> {
    root: Option<Box<Leaf<T>>>,
    len: usize,
}

impl<T> Default for IntervalTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IntervalTree<T> {
    /// Create an empty tree
    #[must_use]
    pub const fn new() -> Self {
        Self { root: None, len: 0 }
    }

    /// Root leaf, for structural inspection
    #[must_use]
    pub fn root(&self) -> Option<&Leaf<T>> {
        self.root.as_deref()
    }

    /// Number of items
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Check if the tree is empty
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Items overlapping `range`, in-order
    #[must_use]
    pub fn query(&self, range: impl Into<QueryRange>) -> Vec<&T> {
        let QueryRange { low, high } = range.into();
        let mut found = Vec::new();
        let mut stack: Vec<&Leaf<T>> = Vec::new();
        let mut current = self.root.as_deref();

        loop {
            while let Some(leaf) = current {
                stack.push(leaf);
                current = leaf.left.as_deref().filter(|left| left.max >= low);
            }
            let Some(leaf) = stack.pop() else {
                break;
            };
            if leaf.low <= high && leaf.high >= low {
                found.push(&leaf.item);
            }
            current = leaf.right.as_deref();
        }

        found
    }

    /// Every item in ascending `low` order
    #[must_use]
    pub fn get_all(&self) -> Vec<&T> {
        let mut all = Vec::with_capacity(self.len);
        let mut stack: Vec<&Leaf<T>> = Vec::new();
        let mut current = self.root.as_deref();

        loop {
            while let Some(leaf) = current {
                stack.push(leaf);
                current = leaf.left.as_deref();
            }
            let Some(leaf) = stack.pop() else {
                break;
            };
            all.push(&leaf.item);
            current = leaf.right.as_deref();
        }

        all
    }
}

impl<T: IntervalNode> IntervalTree<T> {
    /// Insert an item
    ///
    /// Equal starts go left. Every leaf on the path has its `max` raised to
    /// the new interval's end.
    pub fn insert(&mut self, item: T) {
        let low = item.low();
        let high = item.high();
        let mut slot = &mut self.root;

        while let Some(leaf) = slot {
            leaf.max = leaf.max.max(high);
            slot = if low <= leaf.low {
                &mut leaf.left
            } else {
                &mut leaf.right
            };
        }

        *slot = Some(Box::new(Leaf {
            item,
            low,
            high,
            max: high,
            left: None,
            right: None,
        }));
        self.len += 1;
    }
}

impl<T> Drop for IntervalTree<T> {
    // Unlink leaves one at a time so dropping a list-shaped tree is not recursive
    fn drop(&mut self) {
        let mut pending: Vec<Box<Leaf<T>>> = self.root.take().into_iter().collect();
        while let Some(mut leaf) = pending.pop() {
            pending.extend(leaf.left.take());
            pending.extend(leaf.right.take());
        }
    }
}

impl<T: IntervalNode> Extend<T> for IntervalTree<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.insert(item);
        }
    }
}

impl<T: IntervalNode> FromIterator<T> for IntervalTree<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}
