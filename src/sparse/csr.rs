// This file is part of LensKit.
// Copyright (C) 2018-2023 Boise State University.
// Copyright (C) 2023-2026 Drexel University.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

use arrow::array::{Float32Array, Int32Array};
use log::*;

use super::COOMatrix;

/// A compressed sparse row matrix.
///
/// Column indices within each row are strictly increasing.
#[derive(Clone, Debug)]
pub struct CSRMatrix {
    pub n_rows: usize,
    pub n_cols: usize,
    row_ptrs: Vec<usize>,
    pub col_inds: Int32Array,
    pub values: Float32Array,
}

impl CSRMatrix {
    /// Assemble a matrix from its raw parts.
    pub fn from_parts(
        n_rows: usize,
        n_cols: usize,
        row_ptrs: Vec<usize>,
        col_inds: Vec<i32>,
        values: Vec<f32>,
    ) -> CSRMatrix {
        assert_eq!(row_ptrs.len(), n_rows + 1);
        assert_eq!(col_inds.len(), values.len());
        assert_eq!(row_ptrs[n_rows], col_inds.len());
        CSRMatrix {
            n_rows,
            n_cols,
            row_ptrs,
            col_inds: col_inds.into(),
            values: values.into(),
        }
    }

    /// Assemble a matrix from per-row entry lists, already sorted by column.
    pub fn from_rows(n_cols: usize, rows: Vec<Vec<(i32, f32)>>) -> CSRMatrix {
        let n_rows = rows.len();
        let nnz = rows.iter().map(Vec::len).sum();
        let mut row_ptrs = Vec::with_capacity(n_rows + 1);
        let mut col_inds = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);
        row_ptrs.push(0);
        for row in rows {
            for (c, v) in row {
                col_inds.push(c);
                values.push(v);
            }
            row_ptrs.push(col_inds.len());
        }
        CSRMatrix::from_parts(n_rows, n_cols, row_ptrs, col_inds, values)
    }

    /// Compress a coordinate matrix, summing duplicate entries.
    ///
    /// Duplicates are summed in their original order, so the result does not
    /// depend on anything but the input sequence.
    pub fn from_coo(coo: &COOMatrix) -> CSRMatrix {
        let n = coo.len();
        let rows = coo.row.values();
        let cols = coo.col.values();
        let vals = coo.val.values();

        // step 1: count row sizes and convert them to offsets
        let mut offsets = vec![0usize; coo.n_rows + 1];
        for r in rows.iter() {
            offsets[*r as usize + 1] += 1;
        }
        for i in 1..=coo.n_rows {
            offsets[i] += offsets[i - 1];
        }

        // step 2: scatter entries into their rows, keeping input order
        let mut entries = vec![(0i32, 0.0f32); n];
        let mut fill = offsets.clone();
        for k in 0..n {
            let r = rows[k] as usize;
            entries[fill[r]] = (cols[k], vals[k]);
            fill[r] += 1;
        }

        // step 3: sort each row by column and merge duplicates
        let mut row_ptrs = Vec::with_capacity(coo.n_rows + 1);
        let mut col_inds: Vec<i32> = Vec::with_capacity(n);
        let mut values: Vec<f32> = Vec::with_capacity(n);
        row_ptrs.push(0);
        for r in 0..coo.n_rows {
            let row = &mut entries[offsets[r]..offsets[r + 1]];
            row.sort_by_key(|(c, _v)| *c);
            let start = col_inds.len();
            for (c, v) in row.iter() {
                if col_inds.len() > start && col_inds.last() == Some(c) {
                    if let Some(last) = values.last_mut() {
                        *last += *v;
                    }
                } else {
                    col_inds.push(*c);
                    values.push(*v);
                }
            }
            row_ptrs.push(col_inds.len());
        }

        if col_inds.len() < n {
            debug!("merged {} duplicate entries", n - col_inds.len());
        }

        CSRMatrix::from_parts(coo.n_rows, coo.n_cols, row_ptrs, col_inds, values)
    }

    /// Get the matrix shape as (rows, columns).
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    /// Get the "length" (number of rows) in the matrix.
    pub fn len(&self) -> usize {
        self.n_rows
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Get the number of observed values in the matrix.
    pub fn nnz(&self) -> usize {
        self.row_ptrs[self.n_rows]
    }

    /// Get the row pointers as a slice.
    pub fn row_ptrs(&self) -> &[usize] {
        &self.row_ptrs
    }

    /// Get the extent in the underlying arrays for a row in the matrix.
    pub fn extent(&self, row: usize) -> (usize, usize) {
        (self.row_ptrs[row], self.row_ptrs[row + 1])
    }

    /// Get the column indices for a row in the matrix.
    pub fn row_cols(&self, row: usize) -> &[i32] {
        let (start, end) = self.extent(row);
        &self.col_inds.values()[start..end]
    }

    /// Get the values for a row in the matrix.
    pub fn row_vals(&self, row: usize) -> &[f32] {
        let (start, end) = self.extent(row);
        &self.values.values()[start..end]
    }

    /// Query whether a row has a stored entry in a column.
    pub fn contains(&self, row: usize, col: i32) -> bool {
        self.row_cols(row).binary_search(&col).is_ok()
    }

    /// Sum the values in each row.
    pub fn row_sums(&self) -> Vec<f32> {
        (0..self.n_rows)
            .map(|r| self.row_vals(r).iter().sum())
            .collect()
    }

    /// Count the stored entries in each column.
    pub fn col_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.n_cols];
        for c in self.col_inds.values().iter() {
            counts[*c as usize] += 1;
        }
        counts
    }

    /// Get the row number of each stored entry, in storage order.
    pub fn entry_rows(&self) -> Vec<u32> {
        let mut rows = Vec::with_capacity(self.nnz());
        for r in 0..self.n_rows {
            let (sp, ep) = self.extent(r);
            rows.extend(std::iter::repeat(r as u32).take(ep - sp));
        }
        rows
    }

    /// Create a new matrix with the same structure and transformed values.
    ///
    /// The function receives the row, column, and current value of each entry.
    pub fn map_values<F>(&self, func: F) -> CSRMatrix
    where
        F: Fn(usize, usize, f32) -> f32,
    {
        let cols = self.col_inds.values();
        let vals = self.values.values();
        let mut values = Vec::with_capacity(self.nnz());
        for r in 0..self.n_rows {
            let (sp, ep) = self.extent(r);
            for i in sp..ep {
                values.push(func(r, cols[i] as usize, vals[i]));
            }
        }
        CSRMatrix {
            n_rows: self.n_rows,
            n_cols: self.n_cols,
            row_ptrs: self.row_ptrs.clone(),
            col_inds: self.col_inds.clone(),
            values: values.into(),
        }
    }
}
