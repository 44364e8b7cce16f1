// This file is part of LensKit.
// Copyright (C) 2018-2023 Boise State University.
// Copyright (C) 2023-2026 Drexel University.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

use log::*;

use crate::data::InteractionData;
use crate::errors::Result;
use crate::models::Recommender;
use crate::ok_or_unknown;
use crate::sparse::CSRMatrix;

use super::{write_blocks, LineOutcome, ReportSink};

/// Number of recommendations per user.
pub const RECOMMEND_N: usize = 10;

/// Write the recommendation report, one block per user in code order.
///
/// Each block holds the user's recommendations, a separator line, and then
/// the labels of the items the user already interacted with.  `user_items`
/// is the user × item matrix.  Returns the number of users visited.
pub fn write_recommendations<M>(
    model: &M,
    data: &InteractionData,
    user_items: &CSRMatrix,
    sink: &mut ReportSink,
) -> Result<usize>
where
    M: Recommender + Sync + ?Sized,
{
    let users: Vec<u32> = (0..data.users.len() as u32).collect();
    debug!("writing recommendations for {} users", users.len());
    write_blocks(sink, "recommendations", &users, |user| {
        let label = ok_or_unknown!(data.users.label(user), "user", user)?;
        let recs = model.recommend(user, user_items, RECOMMEND_N)?;
        let history = user_items.row_cols(user as usize);

        let mut block = Vec::with_capacity(recs.len() + history.len() + 1);
        block.extend(
            recs.into_iter()
                .map(|(i, s)| LineOutcome::scored(label, &data.items, i, s)),
        );
        block.push(LineOutcome::Line(format!("Applies for user {}\n", label)));
        block.extend(
            history
                .iter()
                .map(|i| LineOutcome::label(&data.items, *i as u32)),
        );
        Ok(block)
    })
}
