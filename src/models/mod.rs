// This file is part of LensKit.
// Copyright (C) 2018-2023 Boise State University.
// Copyright (C) 2023-2026 Drexel University.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Recommendation models and the registry that selects them by name.
//!
//! Every model is trained on an item × user matrix and answers two kinds of
//! query through [`Recommender`].  [`ModelKind`] is the closed set of model
//! names the pipeline accepts; [`Model`] holds a configured instance of one.

use std::fmt;
use std::str::FromStr;

use crate::config::{apply_overrides, ParamOverride};
use crate::errors::{RecError, Result};
use crate::ok_or_unknown;
use crate::sparse::CSRMatrix;

pub mod als;
mod bpr;
mod factors;
mod knn;

pub use als::{AlsParams, ApproxAlsParams, ApproximateALS, ImplicitALS};
pub use bpr::{BprParams, BPR};
pub use factors::LatentFactors;
pub use knn::{Bm25KnnParams, ItemKNN, KnnParams, KnnWeighting};

/// Capabilities shared by all recommendation models.
pub trait Recommender {
    /// Train the model on an item × user interaction matrix.
    fn fit(&mut self, item_users: &CSRMatrix) -> Result<()>;

    /// Find up to `n` items similar to `item`, best first.  The item itself
    /// is a candidate.
    fn similar_items(&self, item: u32, n: usize) -> Result<Vec<(u32, f32)>>;

    /// Recommend up to `n` items for `user`, best first.  Items in the user's
    /// row of `user_items` are never recommended.
    fn recommend(&self, user: u32, user_items: &CSRMatrix, n: usize) -> Result<Vec<(u32, f32)>>;
}

/// Broad model families; the pipeline uses them to decide on pre-weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFamily {
    /// Latent factors fit by an iterative least-squares solver.
    Factorization,
    /// Latent factors fit to a pairwise ranking loss.
    RankingLoss,
    /// Item-item similarities computed directly from interactions.
    Neighborhood,
}

/// The models available by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Als,
    NmslibAls,
    AnnoyAls,
    FaissAls,
    Bpr,
    Cosine,
    TfIdf,
    Bm25,
}

impl ModelKind {
    pub const ALL: [ModelKind; 8] = [
        ModelKind::Als,
        ModelKind::NmslibAls,
        ModelKind::AnnoyAls,
        ModelKind::FaissAls,
        ModelKind::TfIdf,
        ModelKind::Cosine,
        ModelKind::Bpr,
        ModelKind::Bm25,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::Als => "als",
            ModelKind::NmslibAls => "nmslib_als",
            ModelKind::AnnoyAls => "annoy_als",
            ModelKind::FaissAls => "faiss_als",
            ModelKind::Bpr => "bpr",
            ModelKind::Cosine => "cosine",
            ModelKind::TfIdf => "tfidf",
            ModelKind::Bm25 => "bm25",
        }
    }

    pub fn family(&self) -> ModelFamily {
        match self {
            ModelKind::Als | ModelKind::NmslibAls | ModelKind::AnnoyAls | ModelKind::FaissAls => {
                ModelFamily::Factorization
            }
            ModelKind::Bpr => ModelFamily::RankingLoss,
            ModelKind::Cosine | ModelKind::TfIdf | ModelKind::Bm25 => ModelFamily::Neighborhood,
        }
    }

    /// List the accepted model names, for help text.
    pub fn names() -> String {
        Self::ALL
            .iter()
            .map(ModelKind::name)
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl FromStr for ModelKind {
    type Err = RecError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.name() == s)
            .ok_or_else(|| RecError::UnknownModel(s.to_string()))
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A configured model of one of the registered kinds.
pub enum Model {
    Als(ImplicitALS),
    /// ALS with approximate search; all three approximate names share it.
    ApproxAls(ModelKind, ApproximateALS),
    Bpr(BPR),
    ItemKNN(ItemKNN),
}

impl Model {
    /// Create a model with its default hyperparameters and the given overrides.
    pub fn create(kind: ModelKind, overrides: &[ParamOverride]) -> Result<Model> {
        let model = match kind {
            ModelKind::Als => {
                Model::Als(ImplicitALS::new(apply_overrides(AlsParams::default(), overrides)?))
            }
            ModelKind::NmslibAls | ModelKind::AnnoyAls | ModelKind::FaissAls => Model::ApproxAls(
                kind,
                ApproximateALS::new(apply_overrides(ApproxAlsParams::default(), overrides)?),
            ),
            ModelKind::Bpr => Model::Bpr(BPR::new(apply_overrides(BprParams::default(), overrides)?)),
            ModelKind::Cosine => Model::ItemKNN(ItemKNN::cosine(apply_overrides(
                KnnParams::default(),
                overrides,
            )?)),
            ModelKind::TfIdf => Model::ItemKNN(ItemKNN::tfidf(apply_overrides(
                KnnParams::default(),
                overrides,
            )?)),
            ModelKind::Bm25 => Model::ItemKNN(ItemKNN::bm25(apply_overrides(
                Bm25KnnParams::default(),
                overrides,
            )?)),
        };
        Ok(model)
    }

    /// Look up a model by name and create it.
    pub fn from_name(name: &str, overrides: &[ParamOverride]) -> Result<Model> {
        Model::create(name.parse()?, overrides)
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Model::Als(_) => ModelKind::Als,
            Model::ApproxAls(kind, _) => *kind,
            Model::Bpr(_) => ModelKind::Bpr,
            Model::ItemKNN(knn) => match knn.weighting() {
                KnnWeighting::Cosine => ModelKind::Cosine,
                KnnWeighting::TfIdf => ModelKind::TfIdf,
                KnnWeighting::Bm25 { .. } => ModelKind::Bm25,
            },
        }
    }

    pub fn family(&self) -> ModelFamily {
        self.kind().family()
    }

    /// Whether recommendations come from an approximate index, for models
    /// that have one.
    pub fn approximate_recommend(&self) -> Option<bool> {
        match self {
            Model::ApproxAls(_, m) => Some(m.params.approximate_recommend),
            _ => None,
        }
    }

    /// Whether similar items come from an approximate index, for models
    /// that have one.
    pub fn approximate_similar_items(&self) -> Option<bool> {
        match self {
            Model::ApproxAls(_, m) => Some(m.params.approximate_similar_items),
            _ => None,
        }
    }

    /// Turn off approximate recommendation.  Returns whether the model had
    /// the option enabled.  Must be called before fitting to skip the index.
    pub fn disable_approximate_recommend(&mut self) -> bool {
        match self {
            Model::ApproxAls(_, m) => {
                let was = m.params.approximate_recommend;
                m.params.approximate_recommend = false;
                was
            }
            _ => false,
        }
    }
}

impl Recommender for Model {
    fn fit(&mut self, item_users: &CSRMatrix) -> Result<()> {
        match self {
            Model::Als(m) => m.fit(item_users),
            Model::ApproxAls(_, m) => m.fit(item_users),
            Model::Bpr(m) => m.fit(item_users),
            Model::ItemKNN(m) => m.fit(item_users),
        }
    }

    fn similar_items(&self, item: u32, n: usize) -> Result<Vec<(u32, f32)>> {
        match self {
            Model::Als(m) => m.similar_items(item, n),
            Model::ApproxAls(_, m) => m.similar_items(item, n),
            Model::Bpr(m) => m.similar_items(item, n),
            Model::ItemKNN(m) => m.similar_items(item, n),
        }
    }

    fn recommend(&self, user: u32, user_items: &CSRMatrix, n: usize) -> Result<Vec<(u32, f32)>> {
        match self {
            Model::Als(m) => m.recommend(user, user_items, n),
            Model::ApproxAls(_, m) => m.recommend(user, user_items, n),
            Model::Bpr(m) => m.recommend(user, user_items, n),
            Model::ItemKNN(m) => m.recommend(user, user_items, n),
        }
    }
}

/// Get a user's item row from a user × item matrix.
pub(crate) fn user_row(user_items: &CSRMatrix, user: u32) -> Result<&[i32]> {
    let u = user as usize;
    ok_or_unknown!(
        (u < user_items.n_rows).then(|| user_items.row_cols(u)),
        "user",
        user
    )
}
