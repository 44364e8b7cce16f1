// This file is part of LensKit.
// Copyright (C) 2018-2023 Boise State University.
// Copyright (C) 2023-2025 Drexel University.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Top-N selection of scored items.
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ordered_float::NotNan;

/// Accumulate the `limit` best-scoring items.
///
/// Items are ranked by descending score, with ties broken by ascending item
/// code, so the result does not depend on insertion order.  NaN scores are
/// never selected.
#[derive(Clone, Debug)]
pub struct TopN {
    limit: usize,
    heap: BinaryHeap<ScoredEntry>,
}

/// Entries in the selection heap.
#[derive(Debug, Clone, Copy)]
struct ScoredEntry {
    score: NotNan<f32>,
    item: u32,
}

impl TopN {
    pub fn new(limit: usize) -> Self {
        TopN {
            limit,
            heap: BinaryHeap::with_capacity(limit + 1),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Offer an item to the accumulator.
    pub fn add(&mut self, item: u32, score: f32) {
        if self.limit == 0 {
            return;
        }
        let score = match NotNan::new(score) {
            Ok(s) => s,
            Err(_) => return,
        };
        let entry = ScoredEntry { score, item };
        if self.heap.len() < self.limit {
            self.heap.push(entry);
        } else if let Some(worst) = self.heap.peek() {
            if entry < *worst {
                self.heap.pop();
                self.heap.push(entry);
            }
        }
    }

    /// Extract the selected items, best first.
    pub fn into_sorted_vec(self) -> Vec<(u32, f32)> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|e| (e.item, e.score.into_inner()))
            .collect()
    }
}

/// Select the `n` best-scoring items from an iterator of (item, score) pairs.
pub fn top_n<I>(scores: I, n: usize) -> Vec<(u32, f32)>
where
    I: IntoIterator<Item = (u32, f32)>,
{
    let mut acc = TopN::new(n);
    for (i, s) in scores {
        acc.add(i, s);
    }
    acc.into_sorted_vec()
}

impl PartialEq for ScoredEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScoredEntry {}

impl PartialOrd for ScoredEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // "greater" means worse, so the heap top is the weakest kept entry
        other
            .score
            .cmp(&self.score)
            .then_with(|| self.item.cmp(&other.item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_n_order() {
        let scores = vec![(0, 0.5), (1, 2.0), (2, -1.0), (3, 1.0)];
        assert_eq!(top_n(scores, 3), vec![(1, 2.0), (3, 1.0), (0, 0.5)]);
    }

    #[test]
    fn test_top_n_short() {
        let scores = vec![(4, 0.5), (2, 2.0)];
        assert_eq!(top_n(scores, 10), vec![(2, 2.0), (4, 0.5)]);
        assert!(top_n(vec![(1, 1.0)], 0).is_empty());
    }

    #[test]
    fn test_ties_by_code() {
        let fwd = vec![(5, 1.0), (3, 1.0), (9, 1.0), (1, 0.5)];
        let mut rev = fwd.clone();
        rev.reverse();
        let expected = vec![(3, 1.0), (5, 1.0)];
        assert_eq!(top_n(fwd, 2), expected);
        assert_eq!(top_n(rev, 2), expected);
    }

    #[test]
    fn test_nan_ignored() {
        let scores = vec![(0, f32::NAN), (1, 0.1)];
        assert_eq!(top_n(scores, 2), vec![(1, 0.1)]);
    }
}
