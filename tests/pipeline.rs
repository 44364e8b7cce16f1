// This file is part of LensKit.
// Copyright (C) 2018-2023 Boise State University.
// Copyright (C) 2023-2026 Drexel University.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! End-to-end runs of the report pipeline.
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use applies::{run, PipelineConfig, RecError, ReportMode};
use tempfile::TempDir;

const JOBS: &str = "\
alice,welder,3
alice,plumber,1
bob,welder,2
bob,electrician,1
carol,plumber,4
carol,electrician,
dave,welder,1
dave,carpenter,2
erin,carpenter,1
erin,plumber,2
bob,welder,1
";

fn setup(csv: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("applies.csv");
    fs::write(&input, csv).unwrap();
    (dir, input)
}

fn config(dir: &Path, input: &Path, model: &str, mode: ReportMode) -> PipelineConfig {
    let mut cfg = PipelineConfig::new(input);
    cfg.output = dir.join("out.tsv");
    cfg.model = model.to_string();
    cfg.mode = mode;
    if model.ends_with("als") {
        cfg.params = vec!["factors=4".parse().unwrap(), "iterations=5".parse().unwrap()];
    } else if model == "bpr" {
        cfg.params = vec!["factors=4".parse().unwrap(), "iterations=20".parse().unwrap()];
    }
    cfg
}

/// Split a recommendation report into per-user (recommendations, history) blocks.
fn parse_blocks(text: &str) -> HashMap<String, (Vec<String>, BTreeSet<String>)> {
    let mut blocks = HashMap::new();
    let mut recs = Vec::new();
    let mut current: Option<String> = None;
    for line in text.lines() {
        if let Some(user) = line.strip_prefix("Applies for user ") {
            assert!(!blocks.contains_key(user), "duplicate separator for {}", user);
            blocks.insert(user.to_string(), (std::mem::take(&mut recs), BTreeSet::new()));
            current = Some(user.to_string());
        } else if line.contains('\t') {
            current = None;
            recs.push(line.to_string());
        } else {
            let user = current.as_ref().expect("history line outside a block");
            blocks.get_mut(user).unwrap().1.insert(line.to_string());
        }
    }
    assert!(recs.is_empty(), "recommendations without separator");
    blocks
}

#[test]
fn cosine_recommend_example() {
    let (dir, input) = setup("u1,i1,3\nu1,i2,1\nu2,i1,5\n");
    let cfg = config(dir.path(), &input, "cosine", ReportMode::Recommend);
    let summary = run(&cfg).unwrap();
    assert_eq!(summary.entities, 2);
    assert_eq!(summary.skipped, 0);

    let text = fs::read_to_string(&cfg.output).unwrap();
    let blocks = parse_blocks(&text);
    assert_eq!(blocks.len(), 2);
    let expect = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>();
    assert_eq!(blocks["u1"].1, expect(&["i1", "i2"]));
    assert_eq!(blocks["u2"].1, expect(&["i1"]));
    assert!(blocks["u1"].0.is_empty());
    assert_eq!(blocks["u2"].0.len(), 1);
    assert!(blocks["u2"].0[0].starts_with("u2\ti2\t"));
}

#[test]
fn recommend_history_matches_input() {
    let (dir, input) = setup(JOBS);
    for model in ["als", "annoy_als", "bpr", "cosine", "tfidf", "bm25"] {
        let cfg = config(dir.path(), &input, model, ReportMode::Recommend);
        run(&cfg).unwrap();
        let blocks = parse_blocks(&fs::read_to_string(&cfg.output).unwrap());

        let mut expected: HashMap<&str, BTreeSet<String>> = HashMap::new();
        for line in JOBS.lines() {
            let mut fields = line.split(',');
            let user = fields.next().unwrap();
            let item = fields.next().unwrap();
            expected.entry(user).or_default().insert(item.to_string());
        }
        assert_eq!(blocks.len(), expected.len(), "model {}", model);
        for (user, items) in expected {
            let (recs, history) = &blocks[user];
            assert_eq!(history, &items, "model {} user {}", model, user);
            for rec in recs {
                let item = rec.split('\t').nth(1).unwrap();
                assert!(!items.contains(item), "model {} recommended seen item", model);
            }
        }
    }
}

#[test]
fn similar_items_by_popularity() {
    let (dir, input) = setup(JOBS);
    for model in ["als", "nmslib_als", "cosine", "bm25"] {
        let cfg = config(dir.path(), &input, model, ReportMode::SimilarItems);
        let summary = run(&cfg).unwrap();
        assert_eq!(summary.entities, 4);

        let text = fs::read_to_string(&cfg.output).unwrap();
        let mut sources: Vec<&str> = Vec::new();
        for line in text.lines() {
            let fields: Vec<&str> = line.split('\t').collect();
            assert_eq!(fields.len(), 3);
            assert!(fields[2].parse::<f32>().unwrap().is_finite());
            if sources.last() != Some(&fields[0]) {
                assert!(!sources.contains(&fields[0]), "{} repeated", fields[0]);
                sources.push(fields[0]);
            }
        }
        // welder has 4 records, plumber 3, then electrician and carpenter 2
        // each, which keep their label order
        assert_eq!(sources, vec!["welder", "plumber", "carpenter", "electrician"]);
    }
}

#[test]
fn unknown_model_leaves_no_output() {
    let (dir, input) = setup(JOBS);
    let cfg = config(dir.path(), &input, "svd", ReportMode::SimilarItems);
    assert!(matches!(run(&cfg), Err(RecError::UnknownModel(_))));
    assert!(!cfg.output.exists());
}

#[test]
fn reruns_are_identical() {
    let (dir, input) = setup(JOBS);
    for (model, mode) in [
        ("als", ReportMode::SimilarItems),
        ("bpr", ReportMode::Recommend),
        ("bm25", ReportMode::Recommend),
    ] {
        let cfg = config(dir.path(), &input, model, mode);
        run(&cfg).unwrap();
        let first = fs::read(&cfg.output).unwrap();
        run(&cfg).unwrap();
        let second = fs::read(&cfg.output).unwrap();
        assert_eq!(first, second, "model {} differs between runs", model);
    }
}
