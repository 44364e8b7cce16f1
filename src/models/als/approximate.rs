// This file is part of LensKit.
// Copyright (C) 2018-2023 Boise State University.
// Copyright (C) 2023-2026 Drexel University.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! ALS with approximate nearest-neighbor search over the learned factors.
//!
//! Candidates come from HNSW graphs built after training.  Every candidate is
//! re-scored exactly, so only candidate recall is approximate.
use std::time::Instant;

use hnsw_rs::prelude::*;
use log::*;
use serde::{Deserialize, Serialize};

use crate::errors::{RecError, Result};
use crate::models::{user_row, LatentFactors, Recommender};
use crate::ok_or_unknown;
use crate::sorting::top_n;
use crate::sparse::CSRMatrix;

use super::{AlsParams, ImplicitALS};

/// Maximum number of HNSW layers.
const MAX_LAYERS: usize = 16;

type FactorIndex = Hnsw<'static, f32, DistL2>;

/// Hyperparameters for [`ApproximateALS`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ApproxAlsParams {
    pub factors: usize,
    pub regularization: f32,
    pub alpha: f32,
    pub iterations: usize,
    pub random_state: u64,
    /// Maximum graph connections per node.
    pub max_connections: usize,
    /// Candidate list size while building the graphs.
    pub ef_construction: usize,
    /// Candidate list size while searching.
    pub ef_search: usize,
    /// Answer similar-item queries from the item graph.
    pub approximate_similar_items: bool,
    /// Answer recommendation queries from the inner-product graph.
    pub approximate_recommend: bool,
}

impl Default for ApproxAlsParams {
    fn default() -> Self {
        let als = AlsParams::default();
        ApproxAlsParams {
            factors: als.factors,
            regularization: als.regularization,
            alpha: als.alpha,
            iterations: als.iterations,
            random_state: als.random_state,
            max_connections: 16,
            ef_construction: 200,
            ef_search: 64,
            approximate_similar_items: true,
            approximate_recommend: true,
        }
    }
}

impl ApproxAlsParams {
    fn als_params(&self) -> AlsParams {
        AlsParams {
            factors: self.factors,
            regularization: self.regularization,
            alpha: self.alpha,
            iterations: self.iterations,
            random_state: self.random_state,
        }
    }
}

/// Implicit ALS whose queries are served by approximate neighbor search.
pub struct ApproximateALS {
    pub params: ApproxAlsParams,
    als: ImplicitALS,
    similar_index: Option<FactorIndex>,
    recommend_index: Option<FactorIndex>,
}

impl ApproximateALS {
    pub fn new(params: ApproxAlsParams) -> Self {
        let als = ImplicitALS::new(params.als_params());
        ApproximateALS {
            params,
            als,
            similar_index: None,
            recommend_index: None,
        }
    }

    pub fn factors(&self) -> Option<&LatentFactors> {
        self.als.factors()
    }

    fn fitted(&self) -> Result<&LatentFactors> {
        self.als.factors().ok_or(RecError::NotFitted)
    }

    fn build_index(&self, rows: &[Vec<f32>]) -> FactorIndex {
        let index = FactorIndex::new(
            self.params.max_connections,
            rows.len().max(1),
            MAX_LAYERS,
            self.params.ef_construction,
            DistL2,
        );
        for (i, row) in rows.iter().enumerate() {
            index.insert((row, i));
        }
        index
    }

    fn search(&self, index: &FactorIndex, query: &[f32], k: usize) -> Vec<usize> {
        index
            .search(query, k, self.params.ef_search.max(k))
            .into_iter()
            .map(|nbr| nbr.d_id)
            .collect()
    }
}

/// Unit-normalize item factors, so L2 distance ranks items by cosine.
fn normalized_items(lf: &LatentFactors) -> Vec<Vec<f32>> {
    lf.items
        .outer_iter()
        .zip(lf.item_norms().iter())
        .map(|(row, norm)| {
            if *norm > 0.0 {
                row.iter().map(|v| v / norm).collect()
            } else {
                row.to_vec()
            }
        })
        .collect()
}

/// Augment item factors with one extra column so all rows share the largest
/// norm.  L2 distance to a query `[u, 0]` then ranks items by `u · item`.
fn augmented_items(lf: &LatentFactors) -> Vec<Vec<f32>> {
    let max_norm = lf.item_norms().iter().copied().fold(0.0f32, f32::max);
    lf.items
        .outer_iter()
        .zip(lf.item_norms().iter())
        .map(|(row, norm)| {
            let extra = (max_norm * max_norm - norm * norm).max(0.0).sqrt();
            let mut aug = row.to_vec();
            aug.push(extra);
            aug
        })
        .collect()
}

impl Recommender for ApproximateALS {
    fn fit(&mut self, item_users: &CSRMatrix) -> Result<()> {
        self.als = ImplicitALS::new(self.params.als_params());
        self.similar_index = None;
        self.recommend_index = None;
        self.als.fit(item_users)?;

        let lf = self.fitted()?;
        let start = Instant::now();
        let similar_index = if self.params.approximate_similar_items {
            Some(self.build_index(&normalized_items(lf)))
        } else {
            None
        };
        let recommend_index = if self.params.approximate_recommend {
            Some(self.build_index(&augmented_items(lf)))
        } else {
            None
        };
        debug!(
            "built approximate indexes (similar: {}, recommend: {}) in {:.2}s",
            similar_index.is_some(),
            recommend_index.is_some(),
            start.elapsed().as_secs_f32()
        );

        self.similar_index = similar_index;
        self.recommend_index = recommend_index;
        Ok(())
    }

    fn similar_items(&self, item: u32, n: usize) -> Result<Vec<(u32, f32)>> {
        let lf = self.fitted()?;
        let index = match (&self.similar_index, self.params.approximate_similar_items) {
            (Some(index), true) => index,
            _ => return lf.similar_items(item, n),
        };
        let i = item as usize;
        let target = ok_or_unknown!(
            (i < lf.n_items()).then(|| lf.items.row(i)),
            "item",
            item
        )?;
        let norm = lf.item_norms()[i];
        let query: Vec<f32> = if norm > 0.0 {
            target.iter().map(|v| v / norm).collect()
        } else {
            target.to_vec()
        };

        let candidates = self
            .search(index, &query, n)
            .into_iter()
            .map(|j| (j as u32, lf.item_cosine(i, j)));
        Ok(top_n(candidates, n))
    }

    fn recommend(&self, user: u32, user_items: &CSRMatrix, n: usize) -> Result<Vec<(u32, f32)>> {
        let lf = self.fitted()?;
        let liked = user_row(user_items, user)?;
        let index = match (&self.recommend_index, self.params.approximate_recommend) {
            (Some(index), true) => index,
            _ => return lf.recommend(user, liked, n),
        };
        if lf.n_items() == 0 {
            return Ok(Vec::new());
        }
        let u = user as usize;
        let uvec = ok_or_unknown!(
            (u < lf.n_users()).then(|| lf.users.row(u)),
            "user",
            user
        )?;
        let mut query = uvec.to_vec();
        query.push(0.0);

        let candidates = self
            .search(index, &query, n + liked.len())
            .into_iter()
            .filter(|j| liked.binary_search(&(*j as i32)).is_err())
            .map(|j| (j as u32, lf.user_score(u, j)));
        Ok(top_n(candidates, n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::COOMatrixBuilder;

    fn blocks() -> CSRMatrix {
        let mut bld = COOMatrixBuilder::with_capacity((4, 4), 8);
        for (i, u) in [(0, 0), (0, 1), (1, 0), (1, 1), (2, 2), (2, 3), (3, 2), (3, 3)] {
            bld.add_entry(i, u, 1.0);
        }
        CSRMatrix::from_coo(&bld.finish())
    }

    fn params() -> ApproxAlsParams {
        ApproxAlsParams {
            factors: 4,
            iterations: 10,
            ..ApproxAlsParams::default()
        }
    }

    #[test]
    fn test_defaults_match_als() {
        let p = ApproxAlsParams::default();
        assert_eq!(p.als_params(), AlsParams::default());
        assert!(p.approximate_similar_items);
        assert!(p.approximate_recommend);
    }

    #[test]
    fn test_builds_enabled_indexes() {
        let mut model = ApproximateALS::new(ApproxAlsParams {
            approximate_recommend: false,
            ..params()
        });
        model.fit(&blocks()).unwrap();
        assert!(model.similar_index.is_some());
        assert!(model.recommend_index.is_none());
    }

    #[test]
    fn test_similar_matches_exact() {
        let mut model = ApproximateALS::new(params());
        model.fit(&blocks()).unwrap();
        let approx = model.similar_items(0, 2).unwrap();
        let exact = model.factors().unwrap().similar_items(0, 2).unwrap();
        let codes: Vec<u32> = approx.iter().map(|(i, _s)| *i).collect();
        assert!(codes.contains(&0) && codes.contains(&1));
        for ((ai, a), (ei, e)) in approx.iter().zip(exact.iter()) {
            assert_eq!(ai, ei);
            assert!((a - e).abs() < 1e-5);
        }
    }

    #[test]
    fn test_recommend_filters_liked() {
        let m = blocks();
        let ui = m.transpose();
        let mut model = ApproximateALS::new(params());
        model.fit(&m).unwrap();
        let recs = model.recommend(0, &ui, 10).unwrap();
        assert_eq!(recs.len(), 2);
        assert!(recs.iter().all(|(i, _s)| *i == 2 || *i == 3));
    }

    #[test]
    fn test_unfitted() {
        let model = ApproximateALS::new(params());
        assert!(matches!(model.similar_items(0, 1), Err(RecError::NotFitted)));
    }
}
