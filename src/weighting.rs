// This file is part of LensKit.
// Copyright (C) 2018-2023 Boise State University.
// Copyright (C) 2023-2026 Drexel University.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Re-weighting of interaction matrices.
//!
//! All of these functions keep the shape and sparsity pattern of their input.

use log::*;

use crate::sparse::CSRMatrix;

/// Compute inverse document frequencies for the columns of a matrix.
///
/// Rows play the role of documents: `idf[c] = ln(N) - ln(1 + df[c])`.
fn column_idf(matrix: &CSRMatrix) -> Vec<f32> {
    let n = (matrix.n_rows as f32).ln();
    matrix
        .col_counts()
        .into_iter()
        .map(|df| n - (df as f32).ln_1p())
        .collect()
}

/// Weight a matrix with BM25, treating rows as documents and columns as terms.
///
/// `k1` controls count saturation and `b` controls row-length normalization.
/// With `k1 == 0` the matrix is returned unchanged.
pub fn bm25_weight(matrix: &CSRMatrix, k1: f32, b: f32) -> CSRMatrix {
    if k1 == 0.0 {
        debug!("BM25 disabled by K1=0");
        return matrix.clone();
    }
    debug!(
        "weighting {}x{} matrix by BM25 (K1={}, B={})",
        matrix.n_rows, matrix.n_cols, k1, b
    );

    let idf = column_idf(matrix);
    let row_sums = matrix.row_sums();
    let avg_len = if row_sums.is_empty() {
        0.0
    } else {
        row_sums.iter().sum::<f32>() / row_sums.len() as f32
    };
    let length_norm: Vec<f32> = row_sums
        .iter()
        .map(|s| {
            if avg_len > 0.0 {
                (1.0 - b) + b * s / avg_len
            } else {
                1.0
            }
        })
        .collect();

    matrix.map_values(|r, c, v| v * (k1 + 1.0) / (k1 * length_norm[r] + v) * idf[c])
}

/// Weight a matrix with TF-IDF, using the square root of counts as term frequency.
pub fn tfidf_weight(matrix: &CSRMatrix) -> CSRMatrix {
    let idf = column_idf(matrix);
    matrix.map_values(|_r, c, v| v.sqrt() * idf[c])
}

/// Scale each row of a matrix to unit L2 norm.  All-zero rows are left alone.
pub fn normalize_rows(matrix: &CSRMatrix) -> CSRMatrix {
    let norms: Vec<f32> = (0..matrix.n_rows)
        .map(|r| matrix.row_vals(r).iter().map(|v| v * v).sum::<f32>().sqrt())
        .collect();
    matrix.map_values(|r, _c, v| if norms[r] > 0.0 { v / norms[r] } else { v })
}
