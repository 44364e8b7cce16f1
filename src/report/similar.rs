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

use super::{write_blocks, LineOutcome, ReportSink};

/// Number of neighbors requested per item (ten plus the item itself).
pub const SIMILAR_N: usize = 11;

/// Order item codes by descending record count.  Equal counts stay in code order.
pub fn popularity_order(item_counts: &[u32]) -> Vec<u32> {
    let mut order: Vec<u32> = (0..item_counts.len() as u32).collect();
    order.sort_by(|a, b| item_counts[*b as usize].cmp(&item_counts[*a as usize]));
    order
}

/// Write the item similarity report, most popular items first.
///
/// Returns the number of items visited.
pub fn write_similar_items<M>(
    model: &M,
    data: &InteractionData,
    sink: &mut ReportSink,
) -> Result<usize>
where
    M: Recommender + Sync + ?Sized,
{
    let order = popularity_order(&data.item_counts);
    debug!("writing similar items for {} items", order.len());
    write_blocks(sink, "similar items", &order, |item| {
        let source = ok_or_unknown!(data.items.label(item), "item", item)?;
        let nbrs = model.similar_items(item, SIMILAR_N)?;
        Ok(nbrs
            .into_iter()
            .map(|(j, s)| LineOutcome::scored(source, &data.items, j, s))
            .collect())
    })
}
