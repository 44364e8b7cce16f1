// This file is part of LensKit.
// Copyright (C) 2018-2023 Boise State University.
// Copyright (C) 2023-2026 Drexel University.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Command-line entry point for the applies report pipeline.
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::*;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use applies::config::ParamOverride;
use applies::models::ModelKind;
use applies::parallel::{init_thread_pool, thread_count};
use applies::pipeline::{
    run, PipelineConfig, ReportMode, DEFAULT_BM25_B, DEFAULT_BM25_K1, DEFAULT_MODEL,
    DEFAULT_OUTPUT,
};

/// Compute similar items or per-user recommendations from an interaction log.
#[derive(Parser, Debug)]
#[command(name = "lenskit-applies", version, about)]
struct Cli {
    /// Input CSV file with user, item, and count columns (no header).
    #[arg(long)]
    input: PathBuf,

    /// Output file for the report.
    #[arg(long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    #[arg(long, default_value = DEFAULT_MODEL, help = model_help())]
    model: String,

    /// Write per-user recommendations instead of similar items.
    #[arg(long)]
    recommend: bool,

    /// Override a model hyperparameter (repeatable).
    #[arg(long = "param", value_name = "KEY=VALUE")]
    params: Vec<ParamOverride>,

    /// BM25 K1 applied before fitting factorization models (0 disables).
    #[arg(long, default_value_t = DEFAULT_BM25_K1)]
    bm25_k1: f32,

    /// BM25 B applied before fitting factorization models.
    #[arg(long, default_value_t = DEFAULT_BM25_B)]
    bm25_b: f32,

    /// Number of worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Increase log verbosity (repeat for more); RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn model_help() -> String {
    format!("Model to fit ({})", ModelKind::names())
}

impl Cli {
    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            input: self.input.clone(),
            output: self.output.clone(),
            model: self.model.clone(),
            mode: if self.recommend {
                ReportMode::Recommend
            } else {
                ReportMode::SimilarItems
            },
            params: self.params.clone(),
            bm25_k1: self.bm25_k1,
            bm25_b: self.bm25_b,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Some(n) = cli.threads {
        init_thread_pool(n)?;
    }
    debug!("using {} threads", thread_count());

    let config = cli.pipeline_config();
    let summary = run(&config).with_context(|| {
        format!(
            "failed to build report from {} with model {}",
            config.input.display(),
            config.model
        )
    })?;
    info!(
        "finished: {} lines for {} entities ({} skipped)",
        summary.lines, summary.entities, summary.skipped
    );
    Ok(())
}
