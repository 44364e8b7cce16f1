// This file is part of LensKit.
// Copyright (C) 2018-2023 Boise State University.
// Copyright (C) 2023-2025 Drexel University.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SolveError {
    #[error("matrix is not positive definite")]
    NotPositive,
    #[error("solution has non-finite values")]
    IllegalValue,
}

/// Solve `Ax = b` for a symmetric positive-definite `A` by Cholesky decomposition.
pub fn cholesky_solve(
    matrix: &Array2<f32>,
    vector: &Array1<f32>,
) -> Result<Array1<f32>, SolveError> {
    let mshape = matrix.shape();
    assert_eq!(mshape[0], mshape[1]);
    assert_eq!(vector.len(), mshape[0]);
    let n = mshape[0];

    let a = DMatrix::from_fn(n, n, |i, j| matrix[[i, j]]);
    let b = DVector::from_iterator(n, vector.iter().copied());
    let chol = a.cholesky().ok_or(SolveError::NotPositive)?;
    let soln = chol.solve(&b);

    if soln.iter().all(|x| x.is_finite()) {
        Ok(soln.iter().copied().collect())
    } else {
        Err(SolveError::IllegalValue)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn test_solve_spd() {
        let a = array![[4.0f32, 1.0], [1.0, 3.0]];
        let b = array![1.0f32, 2.0];
        let x = cholesky_solve(&a, &b).unwrap();
        let back = a.dot(&x);
        assert!((back[0] - 1.0).abs() < 1e-5);
        assert!((back[1] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_not_positive() {
        let a = array![[1.0f32, 2.0], [2.0, 1.0]];
        let b = array![1.0f32, 1.0];
        assert!(matches!(cholesky_solve(&a, &b), Err(SolveError::NotPositive)));
    }
}
