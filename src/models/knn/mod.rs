// This file is part of LensKit.
// Copyright (C) 2018-2023 Boise State University.
// Copyright (C) 2023-2026 Drexel University.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Item-based k-nearest-neighbor recommendation.
use std::time::Instant;

use log::*;
use serde::{Deserialize, Serialize};

use crate::errors::{RecError, Result};
use crate::ok_or_unknown;
use crate::sorting::top_n;
use crate::sparse::CSRMatrix;
use crate::weighting::{bm25_weight, normalize_rows, tfidf_weight};

use super::{user_row, Recommender};

mod item_score;
mod item_train;

/// Hyperparameters for the cosine and TF-IDF neighborhood models.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct KnnParams {
    /// Number of neighbors to keep per item.
    #[serde(rename = "K")]
    pub neighbors: usize,
}

impl Default for KnnParams {
    fn default() -> Self {
        KnnParams { neighbors: 20 }
    }
}

/// Hyperparameters for the BM25 neighborhood model.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Bm25KnnParams {
    #[serde(rename = "K")]
    pub neighbors: usize,
    #[serde(rename = "K1")]
    pub k1: f32,
    #[serde(rename = "B")]
    pub b: f32,
}

impl Default for Bm25KnnParams {
    fn default() -> Self {
        Bm25KnnParams {
            neighbors: 20,
            k1: 100.0,
            b: 0.5,
        }
    }
}

/// How interactions are weighted before computing similarities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KnnWeighting {
    /// Unit-normalize item rows, so similarities are cosines.
    Cosine,
    TfIdf,
    Bm25 { k1: f32, b: f32 },
}

/// Item-item nearest-neighbor recommender.
pub struct ItemKNN {
    weighting: KnnWeighting,
    neighbors: usize,
    similarity: Option<CSRMatrix>,
}

impl ItemKNN {
    fn new(weighting: KnnWeighting, neighbors: usize) -> Self {
        ItemKNN {
            weighting,
            neighbors,
            similarity: None,
        }
    }

    pub fn cosine(params: KnnParams) -> Self {
        Self::new(KnnWeighting::Cosine, params.neighbors)
    }

    pub fn tfidf(params: KnnParams) -> Self {
        Self::new(KnnWeighting::TfIdf, params.neighbors)
    }

    pub fn bm25(params: Bm25KnnParams) -> Self {
        Self::new(
            KnnWeighting::Bm25 {
                k1: params.k1,
                b: params.b,
            },
            params.neighbors,
        )
    }

    pub fn weighting(&self) -> &KnnWeighting {
        &self.weighting
    }

    /// Get the item-item similarity matrix, if the model has been fit.
    pub fn similarity(&self) -> Option<&CSRMatrix> {
        self.similarity.as_ref()
    }

    fn fitted(&self) -> Result<&CSRMatrix> {
        self.similarity.as_ref().ok_or(RecError::NotFitted)
    }
}

impl Recommender for ItemKNN {
    fn fit(&mut self, item_users: &CSRMatrix) -> Result<()> {
        if self.neighbors == 0 {
            return Err(RecError::InvalidParam {
                key: "K".into(),
                message: "must be positive".into(),
            });
        }
        let start = Instant::now();
        let weighted = match self.weighting {
            KnnWeighting::Cosine => normalize_rows(item_users),
            KnnWeighting::TfIdf => tfidf_weight(item_users),
            KnnWeighting::Bm25 { k1, b } => bm25_weight(item_users, k1, b),
        };
        let sims = item_train::compute_similarities(&weighted, self.neighbors);
        info!(
            "computed {:?} similarities for {} items in {:.2}s",
            self.weighting,
            sims.n_rows,
            start.elapsed().as_secs_f32()
        );
        self.similarity = Some(sims);
        Ok(())
    }

    fn similar_items(&self, item: u32, n: usize) -> Result<Vec<(u32, f32)>> {
        let sims = self.fitted()?;
        let i = item as usize;
        let (cols, vals) = ok_or_unknown!(
            (i < sims.n_rows).then(|| (sims.row_cols(i), sims.row_vals(i))),
            "item",
            item
        )?;
        let scores = cols.iter().zip(vals).map(|(j, s)| (*j as u32, *s));
        Ok(top_n(scores, n))
    }

    fn recommend(&self, user: u32, user_items: &CSRMatrix, n: usize) -> Result<Vec<(u32, f32)>> {
        let sims = self.fitted()?;
        let liked = user_row(user_items, user)?;
        let weights = user_items.row_vals(user as usize);
        if let Some(bad) = liked.iter().find(|i| **i as usize >= sims.n_rows) {
            return Err(RecError::UnknownCode {
                kind: "item",
                code: *bad as u32,
            });
        }
        Ok(item_score::score_items(sims, liked, weights, n))
    }
}
