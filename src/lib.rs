// This file is part of LensKit.
// Copyright (C) 2018-2023 Boise State University.
// Copyright (C) 2023-2026 Drexel University.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Batch item-similarity and recommendation reports from interaction logs.
//!
//! The pipeline reads a headerless `user,item,count` CSV file, encodes it into
//! a sparse item × user matrix, fits one of the models in [`models`], and
//! writes a tab-separated report.  See [`pipeline::run`].

pub mod config;
pub mod data;
pub mod errors;
pub mod models;
pub mod parallel;
pub mod pipeline;
mod progress;
pub mod report;
pub mod sorting;
pub mod sparse;
pub mod weighting;

pub use errors::{RecError, Result};
pub use pipeline::{run, PipelineConfig, ReportMode};
