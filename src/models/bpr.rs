// This file is part of LensKit.
// Copyright (C) 2018-2023 Boise State University.
// Copyright (C) 2023-2026 Drexel University.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Bayesian personalized ranking with stochastic gradient descent.
use std::time::Instant;

use log::*;
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use crate::errors::{RecError, Result};
use crate::progress::ProgressHandle;
use crate::sparse::CSRMatrix;

use super::{factors::LatentFactors, user_row, Recommender};

/// Hyperparameters for [`BPR`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BprParams {
    /// Number of latent factors, not counting the item bias column.
    pub factors: usize,
    pub learning_rate: f32,
    pub regularization: f32,
    /// Number of passes; each pass draws as many samples as there are interactions.
    pub iterations: usize,
    /// Reject sampled negatives the user has actually interacted with.
    pub verify_negative_samples: bool,
    pub random_state: u64,
}

impl Default for BprParams {
    fn default() -> Self {
        BprParams {
            factors: 63,
            learning_rate: 0.01,
            regularization: 0.01,
            iterations: 100,
            verify_negative_samples: true,
            random_state: 42,
        }
    }
}

/// Matrix factorization trained on a pairwise ranking loss.
///
/// Factor matrices carry one extra column: the item bias on the item side,
/// and a constant 1 on the user side, so a plain dot product includes it.
pub struct BPR {
    pub params: BprParams,
    factors: Option<LatentFactors>,
}

/// Counters from one training pass.
#[derive(Debug, Default)]
struct EpochStats {
    correct: usize,
    skipped: usize,
}

impl BPR {
    pub fn new(params: BprParams) -> Self {
        BPR {
            params,
            factors: None,
        }
    }

    pub fn factors(&self) -> Option<&LatentFactors> {
        self.factors.as_ref()
    }

    fn fitted(&self) -> Result<&LatentFactors> {
        self.factors.as_ref().ok_or(RecError::NotFitted)
    }
}

impl Recommender for BPR {
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
        let nd = p.factors + 1;
        let bias = p.factors;

        let mut rng = Pcg64::seed_from_u64(p.random_state);
        let scale = p.factors as f32;
        let mut users = Array2::from_shape_fn((nu, nd), |(_, j)| {
            if j == bias {
                1.0
            } else {
                (rng.random::<f32>() - 0.5) / scale
            }
        });
        let mut items = Array2::from_shape_fn((ni, nd), |(_, j)| {
            if j == bias {
                0.0
            } else {
                (rng.random::<f32>() - 0.5) / scale
            }
        });

        let entry_users = user_items.entry_rows();
        let entry_items = user_items.col_inds.values();
        let nnz = entry_users.len();
        if nnz == 0 {
            warn!("no interactions to train BPR on");
        }

        info!(
            "training BPR with {} factors on {} users and {} items",
            p.factors, nu, ni
        );
        let progress = ProgressHandle::new("BPR epochs", p.iterations);
        for epoch in 0..p.iterations {
            if nnz == 0 {
                break;
            }
            let start = Instant::now();
            let mut stats = EpochStats::default();
            for _ in 0..nnz {
                let k = rng.random_range(0..nnz);
                let user = entry_users[k] as usize;
                let liked = entry_items[k] as usize;
                let disliked = rng.random_range(0..ni);
                if liked == disliked
                    || (p.verify_negative_samples && user_items.contains(user, disliked as i32))
                {
                    stats.skipped += 1;
                    continue;
                }

                let mut diff = 0.0;
                for f in 0..nd {
                    diff += users[[user, f]] * (items[[liked, f]] - items[[disliked, f]]);
                }
                let z = 1.0 / (1.0 + diff.exp());
                if z < 0.5 {
                    stats.correct += 1;
                }

                for f in 0..nd {
                    let uf = users[[user, f]];
                    let lf = items[[liked, f]];
                    let df = items[[disliked, f]];
                    if f != bias {
                        users[[user, f]] +=
                            p.learning_rate * (z * (lf - df) - p.regularization * uf);
                    }
                    items[[liked, f]] += p.learning_rate * (z * uf - p.regularization * lf);
                    items[[disliked, f]] += p.learning_rate * (-z * uf - p.regularization * df);
                }
            }

            if !(users.iter().all(|v| v.is_finite()) && items.iter().all(|v| v.is_finite())) {
                return Err(RecError::Diverged(format!(
                    "non-finite factors after epoch {}; try a lower learning_rate",
                    epoch + 1
                )));
            }
            let sampled = nnz - stats.skipped;
            trace!(
                "epoch {}: {:.1}% correct, {} skipped ({:.2}s)",
                epoch + 1,
                if sampled > 0 {
                    100.0 * stats.correct as f64 / sampled as f64
                } else {
                    0.0
                },
                stats.skipped,
                start.elapsed().as_secs_f32()
            );
            progress.tick();
        }
        progress.finish();

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
