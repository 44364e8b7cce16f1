// This file is part of LensKit.
// Copyright (C) 2018-2023 Boise State University.
// Copyright (C) 2023-2026 Drexel University.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

use ndarray::{Array1, Array2, ArrayViewMut1, Axis};
use rayon::prelude::*;

use log::*;

use crate::{progress::ProgressHandle, sparse::CSRMatrix};

use super::solve::{cholesky_solve, SolveError};

/// Train one half of an implicit-feedback ALS epoch.
///
/// Solves for every row of `this` against the fixed `other` factors, using
/// `matrix` (rows of `this` × rows of `other`) as confidence weights.
/// Returns the Frobenius norm of the change in `this`.
pub(super) fn train_implicit_half(
    matrix: &CSRMatrix,
    this: &mut Array2<f32>,
    other: &Array2<f32>,
    reg: f32,
    alpha: f32,
) -> Result<f32, SolveError> {
    assert_eq!(matrix.n_rows, this.nrows());
    assert_eq!(matrix.n_cols, other.nrows());

    let nd = other.ncols();
    let mut otor = other.t().dot(other);
    for i in 0..nd {
        otor[[i, i]] += reg;
    }

    let progress = ProgressHandle::new("ALS rows", this.nrows());
    debug!(
        "beginning implicit ALS training half with {} rows",
        this.nrows()
    );
    let deltas: Vec<f32> = this
        .outer_iter_mut()
        .into_par_iter()
        .enumerate()
        .map(|(i, row)| {
            let f = train_row_solve(matrix, i, row, other, &otor, alpha);
            progress.tick();
            f
        })
        .collect::<Result<Vec<f32>, SolveError>>()?;
    progress.finish();

    Ok(deltas.iter().sum::<f32>().sqrt())
}

fn train_row_solve(
    matrix: &CSRMatrix,
    row_num: usize,
    mut row_data: ArrayViewMut1<f32>,
    other: &Array2<f32>,
    otor: &Array2<f32>,
    alpha: f32,
) -> Result<f32, SolveError> {
    let cols = matrix.row_cols(row_num);
    let vals = matrix.row_vals(row_num);

    if cols.is_empty() {
        row_data.fill(0.0);
        return Ok(0.0);
    }

    let cols: Vec<_> = cols.iter().map(|c| *c as usize).collect();
    // negative weights are negative feedback: confidence |c|, preference 0
    let conf: Array1<f32> = vals.iter().map(|v| (alpha * v).abs()).collect();
    let pref: Array1<f32> = vals
        .iter()
        .map(|v| {
            let c = alpha * v;
            if c < 0.0 {
                0.0
            } else {
                1.0 + c
            }
        })
        .collect();

    let nd = row_data.len();

    let o_picked = other.select(Axis(0), &cols);

    let mt = o_picked.t();
    let mtl = &mt * &conf;
    let mtm = mtl.dot(&o_picked);
    assert_eq!(mtm.shape(), &[nd, nd]);

    let a = otor + &mtm;
    let y = mt.dot(&pref);

    let soln = cholesky_solve(&a, &y)?;

    let deltas = &soln - &row_data;
    row_data.assign(&soln);

    Ok(deltas.dot(&deltas))
}

#[cfg(test)]
mod tests {
    use ndarray::Array2;

    use super::*;
    use crate::sparse::COOMatrixBuilder;

    #[test]
    fn test_half_step_solves_rows() {
        let mut bld = COOMatrixBuilder::with_capacity((2, 3), 3);
        bld.add_entry(0, 0, 2.0);
        bld.add_entry(0, 2, 1.0);
        bld.add_entry(1, 1, 3.0);
        let matrix = CSRMatrix::from_coo(&bld.finish());

        let other = Array2::from_shape_fn((3, 2), |(i, j)| 0.1 * (i + j + 1) as f32);
        let mut this = Array2::zeros((2, 2));
        let delta = train_implicit_half(&matrix, &mut this, &other, 0.1, 1.0).unwrap();
        assert!(delta > 0.0);
        assert!(this.iter().all(|v| v.is_finite()));

        // a second pass from the solution should not move
        let again = train_implicit_half(&matrix, &mut this, &other, 0.1, 1.0).unwrap();
        assert!(again < 1e-4);
    }

    #[test]
    fn test_empty_row_zeroed() {
        let mut bld = COOMatrixBuilder::with_capacity((2, 2), 1);
        bld.add_entry(0, 1, 1.0);
        let matrix = CSRMatrix::from_coo(&bld.finish());
        let other = Array2::from_elem((2, 2), 0.5);
        let mut this = Array2::from_elem((2, 2), 1.0);
        train_implicit_half(&matrix, &mut this, &other, 0.1, 1.0).unwrap();
        assert_eq!(this.row(1).to_vec(), vec![0.0, 0.0]);
    }
}
