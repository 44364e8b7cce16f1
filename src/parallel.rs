// This file is part of LensKit.
// Copyright (C) 2018-2023 Boise State University.
// Copyright (C) 2023-2025 Drexel University.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

use log::*;
use rayon::{current_num_threads, ThreadPoolBuilder};

use crate::errors::{RecError, Result};

/// Set up the global thread pool used for training and report generation.
pub fn init_thread_pool(n_threads: usize) -> Result<()> {
    debug!("initializing thread pool with {} threads", n_threads);
    ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()
        .map_err(|e| RecError::InvalidParam {
            key: "threads".into(),
            message: format!("thread pool initialization error: {}", e),
        })
}

/// Get the number of threads available for parallel work.
pub fn thread_count() -> usize {
    current_num_threads()
}
