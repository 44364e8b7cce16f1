// This file is part of LensKit.
// Copyright (C) 2018-2023 Boise State University.
// Copyright (C) 2023-2026 Drexel University.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Implicit-feedback alternating least squares.

mod approximate;
mod implicit;
mod solve;

use std::time::Instant;

use log::*;
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use crate::errors::{RecError, Result};
use crate::sparse::CSRMatrix;

use super::{factors::LatentFactors, user_row, Recommender};

pub use approximate::{ApproxAlsParams, ApproximateALS};
pub use solve::{cholesky_solve, SolveError};

/// Hyperparameters for [`ImplicitALS`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AlsParams {
    /// Number of latent factors.
    pub factors: usize,
    /// L2 regularization strength.
    pub regularization: f32,
    /// Scale applied to interaction values to get confidence.
    pub alpha: f32,
    /// Number of training epochs.
    pub iterations: usize,
    /// Seed for factor initialization.
    pub random_state: u64,
}

impl Default for AlsParams {
    fn default() -> Self {
        AlsParams {
            factors: 64,
            regularization: 0.01,
            alpha: 1.0,
            iterations: 15,
            random_state: 42,
        }
    }
}

/// Matrix factorization for implicit feedback, trained by alternating least squares.
pub struct ImplicitALS {
    pub params: AlsParams,
    factors: Option<LatentFactors>,
}

impl ImplicitALS {
    pub fn new(params: AlsParams) -> Self {
        ImplicitALS {
            params,
            factors: None,
        }
    }

    /// Get the learned factors, if the model has been fit.
    pub fn factors(&self) -> Option<&LatentFactors> {
        self.factors.as_ref()
    }

    fn fitted(&self) -> Result<&LatentFactors> {
        self.factors.as_ref().ok_or(RecError::NotFitted)
    }
}

impl Recommender for ImplicitALS {
    fn fit(&mut self, item_users: &CSRMatrix) -> Result<()> {
        let p = &self.params;
        if p.factors == 0 {
            return Err(RecError::InvalidParam {
                key: "factors".into(),
                message: "must be positive".into(),
            });
        }
        let (ni, nu) = item_users.shape();
        let user_items = item_users.transpose();

        let mut rng = Pcg64::seed_from_u64(p.random_state);
        let mut users = Array2::from_shape_fn((nu, p.factors), |_| rng.random::<f32>() * 0.01);
        let mut items = Array2::from_shape_fn((ni, p.factors), |_| rng.random::<f32>() * 0.01);

        info!(
            "training ALS with {} factors on {} users and {} items",
            p.factors, nu, ni
        );
        for epoch in 0..p.iterations {
            let start = Instant::now();
            let du = implicit::train_implicit_half(
                &user_items,
                &mut users,
                &items,
                p.regularization,
                p.alpha,
            )?;
            let di = implicit::train_implicit_half(
                item_users,
                &mut items,
                &users,
                p.regularization,
                p.alpha,
            )?;
            debug!(
                "epoch {}: user delta {:.4}, item delta {:.4} ({:.2}s)",
                epoch + 1,
                du,
                di,
                start.elapsed().as_secs_f32()
            );
        }

        self.factors = Some(LatentFactors::new(users, items));
        Ok(())
    }

    fn similar_items(&self, item: u32, n: usize) -> Result<Vec<(u32, f32)>> {
        self.fitted()?.similar_items(item, n)
    }

    fn recommend(&self, user: u32, user_items: &CSRMatrix, n: usize) -> Result<Vec<(u32, f32)>> {
        let model = self.fitted()?;
        let liked = user_row(user_items, user)?;
        model.recommend(user, liked, n)
    }
}
