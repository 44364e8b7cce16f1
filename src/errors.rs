// This file is part of LensKit.
// Copyright (C) 2018-2023 Boise State University.
// Copyright (C) 2023-2026 Drexel University.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Error types for the applies pipeline.
use std::path::PathBuf;

use arrow::error::ArrowError;
use thiserror::Error;

use crate::models::als::SolveError;

/// Errors that abort a pipeline run.
#[derive(Error, Debug)]
pub enum RecError {
    #[error("unknown model '{0}'")]
    UnknownModel(String),
    #[error("invalid parameter '{key}': {message}")]
    InvalidParam { key: String, message: String },
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
    #[error("training failed: {0}")]
    Training(#[from] SolveError),
    #[error("training diverged: {0}")]
    Diverged(String),
    #[error("model has not been fit")]
    NotFitted,
    #[error("unknown {kind} code {code}")]
    UnknownCode { kind: &'static str, code: u32 },
}

pub type Result<T> = std::result::Result<T, RecError>;

impl RecError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RecError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convert an `Option` from a code lookup into a [`RecError::UnknownCode`].
#[macro_export]
macro_rules! ok_or_unknown {
    ($opt:expr, $kind:expr, $code:expr) => {
        $opt.ok_or_else(|| $crate::errors::RecError::UnknownCode {
            kind: $kind,
            code: $code,
        })
    };
}
