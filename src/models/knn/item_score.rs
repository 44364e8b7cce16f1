// This file is part of LensKit.
// Copyright (C) 2018-2023 Boise State University.
// Copyright (C) 2023-2025 Drexel University.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

use crate::sorting::top_n;
use crate::sparse::CSRMatrix;

/// Score candidate items for a user from item-item similarities.
///
/// `ref_items` (sorted) and `ref_weights` are the user's interaction row.
/// Each candidate `j` scores `Σ w(i) · S[i, j]` over the user's items `i`.
/// The user's own items are never returned.
pub(super) fn score_items(
    sims: &CSRMatrix,
    ref_items: &[i32],
    ref_weights: &[f32],
    n: usize,
) -> Vec<(u32, f32)> {
    assert_eq!(ref_items.len(), ref_weights.len());
    let mut scores = vec![0.0f32; sims.n_cols];
    let mut touched = vec![false; sims.n_cols];
    let mut used = Vec::new();

    for (i, w) in ref_items.iter().zip(ref_weights) {
        let i = *i as usize;
        for (j, s) in sims.row_cols(i).iter().zip(sims.row_vals(i)) {
            let j = *j as usize;
            if !touched[j] {
                touched[j] = true;
                used.push(j);
            }
            scores[j] += w * s;
        }
    }

    let candidates = used
        .into_iter()
        .filter(|j| ref_items.binary_search(&(*j as i32)).is_err())
        .map(|j| (j as u32, scores[j]));
    top_n(candidates, n)
}
