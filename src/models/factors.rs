// This file is part of LensKit.
// Copyright (C) 2018-2023 Boise State University.
// Copyright (C) 2023-2026 Drexel University.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Scoring with learned latent factors.

use ndarray::{Array1, Array2, Axis};

use crate::errors::Result;
use crate::ok_or_unknown;
use crate::sorting::top_n;

/// User and item embeddings learned by a factorization model.
#[derive(Clone, Debug)]
pub struct LatentFactors {
    pub users: Array2<f32>,
    pub items: Array2<f32>,
    item_norms: Array1<f32>,
}

impl LatentFactors {
    pub fn new(users: Array2<f32>, items: Array2<f32>) -> Self {
        assert_eq!(users.ncols(), items.ncols());
        let item_norms = items.map_axis(Axis(1), |r| r.dot(&r).sqrt());
        LatentFactors {
            users,
            items,
            item_norms,
        }
    }

    pub fn n_users(&self) -> usize {
        self.users.nrows()
    }

    pub fn n_items(&self) -> usize {
        self.items.nrows()
    }

    /// Get the L2 norm of each item's embedding.
    pub fn item_norms(&self) -> &Array1<f32> {
        &self.item_norms
    }

    /// Cosine similarity between two items' embeddings; 0 if either is zero.
    pub fn item_cosine(&self, a: usize, b: usize) -> f32 {
        let denom = self.item_norms[a] * self.item_norms[b];
        if denom > 0.0 {
            self.items.row(a).dot(&self.items.row(b)) / denom
        } else {
            0.0
        }
    }

    /// Dot-product score of an item for a user.
    pub fn user_score(&self, user: usize, item: usize) -> f32 {
        self.users.row(user).dot(&self.items.row(item))
    }

    /// Find the items whose embeddings have the highest cosine with an item.
    pub fn similar_items(&self, item: u32, n: usize) -> Result<Vec<(u32, f32)>> {
        let i = item as usize;
        let target = ok_or_unknown!(
            (i < self.n_items()).then(|| self.items.row(i)),
            "item",
            item
        )?;
        let tnorm = self.item_norms[i];
        let dots = self.items.dot(&target);

        let scores = dots
            .iter()
            .zip(self.item_norms.iter())
            .enumerate()
            .map(|(j, (d, nj))| {
                let denom = nj * tnorm;
                let s = if denom > 0.0 { d / denom } else { 0.0 };
                (j as u32, s)
            });
        Ok(top_n(scores, n))
    }

    /// Score all items for a user by dot product, skipping `exclude` (sorted).
    pub fn recommend(&self, user: u32, exclude: &[i32], n: usize) -> Result<Vec<(u32, f32)>> {
        let u = user as usize;
        let uvec = ok_or_unknown!(
            (u < self.n_users()).then(|| self.users.row(u)),
            "user",
            user
        )?;
        let scores = self.items.dot(&uvec);

        let candidates = scores
            .iter()
            .enumerate()
            .filter(|(j, _s)| exclude.binary_search(&(*j as i32)).is_err())
            .map(|(j, s)| (j as u32, *s));
        Ok(top_n(candidates, n))
    }
}
