// This file is part of LensKit.
// Copyright (C) 2018-2023 Boise State University.
// Copyright (C) 2023-2025 Drexel University.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

use log::*;
use rayon::prelude::*;

use crate::progress::ProgressHandle;
use crate::sorting::TopN;
use crate::sparse::CSRMatrix;

/// Reusable per-thread buffers for similarity rows.
struct RowScratch {
    dots: Vec<f32>,
    seen: Vec<bool>,
    used: Vec<usize>,
}

impl RowScratch {
    fn new(n: usize) -> RowScratch {
        RowScratch {
            dots: vec![0.0; n],
            seen: vec![false; n],
            used: Vec::new(),
        }
    }

    fn reset(&mut self) {
        for i in self.used.drain(..) {
            self.dots[i] = 0.0;
            self.seen[i] = false;
        }
    }
}

/// Compute item-item similarities as dot products of the rows of `iu_mat`.
///
/// Each row of the result keeps the `neighbors` most similar items (the item
/// itself included), stored in column order.
pub(super) fn compute_similarities(iu_mat: &CSRMatrix, neighbors: usize) -> CSRMatrix {
    let ni = iu_mat.n_rows;
    let ui_mat = iu_mat.transpose();

    debug!("computing similarity rows for {} items", ni);
    let progress = ProgressHandle::new("similarity rows", ni);
    let rows: Vec<Vec<(i32, f32)>> = (0..ni)
        .into_par_iter()
        .map_init(
            || RowScratch::new(ni),
            |scratch, row| {
                let sims = sim_row(row, iu_mat, &ui_mat, neighbors, scratch);
                progress.tick();
                sims
            },
        )
        .collect();
    progress.finish();

    let sims = CSRMatrix::from_rows(ni, rows);
    debug!("kept {} similarities", sims.nnz());
    sims
}

fn sim_row(
    row: usize,
    iu_mat: &CSRMatrix,
    ui_mat: &CSRMatrix,
    neighbors: usize,
    scratch: &mut RowScratch,
) -> Vec<(i32, f32)> {
    // loop over the item's users, then over the users' items
    for (u, r) in iu_mat.row_cols(row).iter().zip(iu_mat.row_vals(row)) {
        let u = *u as usize;
        for (other, orate) in ui_mat.row_cols(u).iter().zip(ui_mat.row_vals(u)) {
            let other = *other as usize;
            if !scratch.seen[other] {
                scratch.seen[other] = true;
                scratch.used.push(other);
            }
            scratch.dots[other] += r * orate;
        }
    }

    let mut acc = TopN::new(neighbors);
    for i in scratch.used.iter() {
        acc.add(*i as u32, scratch.dots[*i]);
    }
    scratch.reset();

    // sort by column number
    let mut sims: Vec<(i32, f32)> = acc
        .into_sorted_vec()
        .into_iter()
        .map(|(i, s)| (i as i32, s))
        .collect();
    sims.sort_by_key(|(i, _s)| *i);
    sims
}
