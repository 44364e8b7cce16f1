// This file is part of LensKit.
// Copyright (C) 2018-2023 Boise State University.
// Copyright (C) 2023-2025 Drexel University.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Interaction data loading and encoding.

mod index;
mod loader;

pub use index::IDIndex;
pub use loader::{read_interactions, read_interactions_from, InteractionData, DEFAULT_COUNT};
