// This file is part of LensKit.
// Copyright (C) 2018-2023 Boise State University.
// Copyright (C) 2023-2026 Drexel University.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Sparse coordinate arrays.

use arrow::array::{Float32Array, Float32Builder, Int32Array, Int32Builder};

/// A sparse matrix in coordinate form, possibly with duplicate entries.
pub struct COOMatrix {
    pub n_rows: usize,
    pub n_cols: usize,
    pub row: Int32Array,
    pub col: Int32Array,
    pub val: Float32Array,
}

pub struct COOMatrixBuilder {
    n_rows: usize,
    n_cols: usize,
    row: Int32Builder,
    col: Int32Builder,
    val: Float32Builder,
}

impl COOMatrixBuilder {
    /// Initialize a builder for a matrix of a given shape with a specified capacity.
    pub fn with_capacity(shape: (usize, usize), cap: usize) -> Self {
        let (n_rows, n_cols) = shape;
        COOMatrixBuilder {
            n_rows,
            n_cols,
            row: Int32Builder::with_capacity(cap),
            col: Int32Builder::with_capacity(cap),
            val: Float32Builder::with_capacity(cap),
        }
    }

    pub fn add_entry(&mut self, row: i32, col: i32, val: f32) {
        debug_assert!((row as usize) < self.n_rows);
        debug_assert!((col as usize) < self.n_cols);
        self.row.append_value(row);
        self.col.append_value(col);
        self.val.append_value(val);
    }

    /// Build the final COO matrix from this builder.
    pub fn finish(mut self) -> COOMatrix {
        COOMatrix {
            n_rows: self.n_rows,
            n_cols: self.n_cols,
            row: self.row.finish(),
            col: self.col.finish(),
            val: self.val.finish(),
        }
    }
}

impl COOMatrix {
    /// Get the number of stored entries (including duplicates).
    pub fn len(&self) -> usize {
        self.row.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
