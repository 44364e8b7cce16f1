// This file is part of LensKit.
// Copyright (C) 2018-2023 Boise State University.
// Copyright (C) 2023-2025 Drexel University.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

use super::CSRMatrix;

impl CSRMatrix {
    /// Transpose the matrix, carrying values along.
    ///
    /// Rows are scanned in order, so the output rows come out sorted.
    pub fn transpose(&self) -> CSRMatrix {
        let nnz = self.nnz();
        let mut row_ptrs = vec![0usize; self.n_cols + 1];
        let mut col_inds = vec![0i32; nnz];
        let mut values = vec![0.0f32; nnz];

        // step 1: count column values, placing counts in rps[c+1].
        for c in self.col_inds.values().iter() {
            row_ptrs[*c as usize + 1] += 1;
        }

        // step 2: convert column counts into row offsets
        for i in 1..=self.n_cols {
            row_ptrs[i] += row_ptrs[i - 1];
        }

        // step 3: insert row indices and values into outputs
        let mut row_ips = row_ptrs.clone();
        let cols = self.col_inds.values();
        let vals = self.values.values();
        for row in 0..self.n_rows {
            let (sp, ep) = self.extent(row);
            for ci in sp..ep {
                let cv = cols[ci] as usize;
                let pos = row_ips[cv];
                col_inds[pos] = row as i32;
                values[pos] = vals[ci];
                row_ips[cv] += 1;
            }
        }

        CSRMatrix::from_parts(self.n_cols, self.n_rows, row_ptrs, col_inds, values)
    }
}

#[cfg(test)]
mod tests {
    use crate::sparse::{CSRMatrix, COOMatrixBuilder};

    #[test]
    fn test_transpose_small() {
        let mut bld = COOMatrixBuilder::with_capacity((2, 3), 3);
        bld.add_entry(0, 2, 1.0);
        bld.add_entry(1, 0, 2.0);
        bld.add_entry(1, 2, 3.0);
        let csr = CSRMatrix::from_coo(&bld.finish());

        let t = csr.transpose();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t.nnz(), 3);
        assert_eq!(t.row_cols(0), &[1]);
        assert_eq!(t.row_vals(0), &[2.0]);
        assert!(t.row_cols(1).is_empty());
        assert_eq!(t.row_cols(2), &[0, 1]);
        assert_eq!(t.row_vals(2), &[1.0, 3.0]);
    }

    #[test]
    fn test_transpose_twice() {
        let mut bld = COOMatrixBuilder::with_capacity((4, 3), 5);
        for (r, c, v) in [(0, 0, 1.0), (3, 1, 2.0), (2, 2, 0.5), (0, 2, 4.0), (1, 1, 1.0)] {
            bld.add_entry(r, c, v);
        }
        let csr = CSRMatrix::from_coo(&bld.finish());
        let back = csr.transpose().transpose();
        assert_eq!(back.shape(), csr.shape());
        assert_eq!(back.row_ptrs(), csr.row_ptrs());
        for r in 0..csr.n_rows {
            assert_eq!(back.row_cols(r), csr.row_cols(r));
            assert_eq!(back.row_vals(r), csr.row_vals(r));
        }
    }
}
