// This file is part of LensKit.
// Copyright (C) 2018-2023 Boise State University.
// Copyright (C) 2023-2026 Drexel University.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! The end-to-end batch run: load, weight, fit, report.
use std::path::PathBuf;
use std::time::Instant;

use log::*;

use crate::config::ParamOverride;
use crate::data::read_interactions;
use crate::errors::Result;
use crate::models::{Model, ModelFamily, Recommender};
use crate::sparse::CSRMatrix;
use crate::report::{write_recommendations, write_similar_items, ReportSink, ReportSummary};
use crate::weighting::bm25_weight;

pub const DEFAULT_OUTPUT: &str = "similar-jobs.tsv";
pub const DEFAULT_MODEL: &str = "als";
pub const DEFAULT_BM25_K1: f32 = 100.0;
pub const DEFAULT_BM25_B: f32 = 0.8;

/// Which report to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportMode {
    /// Similar items for every item, most popular first.
    #[default]
    SimilarItems,
    /// Recommendations and history for every user.
    Recommend,
}

/// Settings for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub model: String,
    pub mode: ReportMode,
    /// Model hyperparameter overrides.
    pub params: Vec<ParamOverride>,
    /// BM25 constants applied to counts before fitting factorization models.
    pub bm25_k1: f32,
    pub bm25_b: f32,
}

impl PipelineConfig {
    /// Create a configuration with default settings for an input file.
    pub fn new<P: Into<PathBuf>>(input: P) -> PipelineConfig {
        PipelineConfig {
            input: input.into(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            model: DEFAULT_MODEL.to_string(),
            mode: ReportMode::default(),
            params: Vec::new(),
            bm25_k1: DEFAULT_BM25_K1,
            bm25_b: DEFAULT_BM25_B,
        }
    }
}

/// Run the pipeline.
///
/// The model name and parameters are checked before the input is opened, and
/// the output file only appears once the report is complete.
pub fn run(config: &PipelineConfig) -> Result<ReportSummary> {
    let start = Instant::now();
    let mut model = Model::from_name(&config.model, &config.params)?;
    info!("using model {} ({:?})", model.kind(), model.family());

    let data = read_interactions(&config.input)?;

    let matrix = prepare_model(&mut model, &data.matrix, config.bm25_k1, config.bm25_b);

    let timer = Instant::now();
    model.fit(&matrix)?;
    info!(
        "fit {} model in {:.2}s",
        model.kind(),
        timer.elapsed().as_secs_f32()
    );

    let timer = Instant::now();
    let mut sink = ReportSink::create(&config.output)?;
    let entities = match config.mode {
        ReportMode::SimilarItems => write_similar_items(&model, &data, &mut sink)?,
        ReportMode::Recommend => {
            let user_items = matrix.transpose();
            write_recommendations(&model, &data, &user_items, &mut sink)?
        }
    };
    let summary = sink.commit(entities)?;
    info!(
        "generated report in {:.2}s (total {:.2}s)",
        timer.elapsed().as_secs_f32(),
        start.elapsed().as_secs_f32()
    );

    Ok(summary)
}

/// Get the matrix a model family is trained on.  Factorization models see
/// BM25-weighted counts; the others see the raw counts.
pub(crate) fn training_matrix(
    family: ModelFamily,
    matrix: &CSRMatrix,
    k1: f32,
    b: f32,
) -> CSRMatrix {
    match family {
        ModelFamily::Factorization => {
            let timer = Instant::now();
            let weighted = bm25_weight(matrix, k1, b);
            info!(
                "applied BM25 weighting in {:.2}s",
                timer.elapsed().as_secs_f32()
            );
            weighted
        }
        ModelFamily::RankingLoss | ModelFamily::Neighborhood => matrix.clone(),
    }
}

/// Adjust a model for pipeline use and build its training matrix.
///
/// Approximate recommendation is switched off for factorization models, as
/// the BM25-weighted factors do not hold up under approximate inner-product
/// search.  Approximate similar-item search is left as configured.
fn prepare_model(model: &mut Model, matrix: &CSRMatrix, k1: f32, b: f32) -> CSRMatrix {
    let family = model.family();
    if family == ModelFamily::Factorization && model.disable_approximate_recommend() {
        debug!("disabled approximate recommendation for {}", model.kind());
    }
    training_matrix(family, matrix, k1, b)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::errors::RecError;
    use crate::sparse::COOMatrixBuilder;

    fn counts() -> CSRMatrix {
        let mut bld = COOMatrixBuilder::with_capacity((3, 3), 5);
        for (i, u, v) in [(0, 0, 2.0), (0, 1, 1.0), (1, 1, 5.0), (2, 0, 1.0), (2, 2, 3.0)] {
            bld.add_entry(i, u, v);
        }
        CSRMatrix::from_coo(&bld.finish())
    }

    #[test]
    fn test_defaults() {
        let cfg = PipelineConfig::new("in.csv");
        assert_eq!(cfg.output, PathBuf::from("similar-jobs.tsv"));
        assert_eq!(cfg.model, "als");
        assert_eq!(cfg.mode, ReportMode::SimilarItems);
        assert_eq!(cfg.bm25_k1, 100.0);
        assert_eq!(cfg.bm25_b, 0.8);
    }

    #[test]
    fn test_bad_params_before_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = PipelineConfig::new(dir.path().join("missing.csv"));
        cfg.output = dir.path().join("out.tsv");
        cfg.model = "cosine".into();
        cfg.params = vec!["alpha=2".parse().unwrap()];
        // the missing input would be an I/O error; the parameter check comes first
        assert!(matches!(run(&cfg), Err(RecError::InvalidParam { .. })));
        assert!(!cfg.output.exists());
    }

    #[test]
    fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = PipelineConfig::new(dir.path().join("missing.csv"));
        cfg.output = dir.path().join("out.tsv");
        assert!(matches!(run(&cfg), Err(RecError::Io { .. })));
        assert!(!cfg.output.exists());
    }

    #[test]
    fn test_tfidf_similar() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        fs::write(&input, "u1,a,2\nu2,a,1\nu2,b,1\nu3,c,4\n").unwrap();
        let mut cfg = PipelineConfig::new(&input);
        cfg.output = dir.path().join("out.tsv");
        cfg.model = "tfidf".into();

        let summary = run(&cfg).unwrap();
        assert_eq!(summary.entities, 3);
        let text = fs::read_to_string(&cfg.output).unwrap();
        assert_eq!(text.lines().count(), summary.lines);
        assert!(text.lines().next().unwrap().starts_with("a\t"));
    }

    #[test]
    fn test_training_matrix_weights_factorization() {
        let m = counts();
        let weighted = training_matrix(ModelFamily::Factorization, &m, 100.0, 0.8);
        let expected = bm25_weight(&m, 100.0, 0.8);
        assert_eq!(weighted.col_inds.values(), m.col_inds.values());
        assert_eq!(weighted.values.values(), expected.values.values());
        assert_ne!(weighted.values.values(), m.values.values());
    }

    #[test]
    fn test_training_matrix_keeps_raw_counts() {
        let m = counts();
        for family in [ModelFamily::RankingLoss, ModelFamily::Neighborhood] {
            let raw = training_matrix(family, &m, 100.0, 0.8);
            assert_eq!(raw.values.values(), m.values.values());
            assert_eq!(raw.col_inds.values(), m.col_inds.values());
        }
    }

    #[test]
    fn test_prepare_disables_approximate_recommend() {
        let m = counts();
        let mut model = Model::from_name("annoy_als", &[]).unwrap();
        assert_eq!(model.approximate_recommend(), Some(true));
        let weighted = prepare_model(&mut model, &m, 100.0, 0.8);
        assert_eq!(model.approximate_recommend(), Some(false));
        assert_eq!(model.approximate_similar_items(), Some(true));
        assert_ne!(weighted.values.values(), m.values.values());

        let mut knn = Model::from_name("cosine", &[]).unwrap();
        let raw = prepare_model(&mut knn, &m, 100.0, 0.8);
        assert_eq!(raw.values.values(), m.values.values());
    }
}
