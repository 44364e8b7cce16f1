// This file is part of LensKit.
// Copyright (C) 2018-2023 Boise State University.
// Copyright (C) 2023-2026 Drexel University.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Report generation.
//!
//! Reports are built one entity (item or user) at a time.  Each entity yields
//! a block of [`LineOutcome`]s; blocks are computed in parallel, a chunk at a
//! time, and written in entity order by the [`ReportSink`].  Nothing appears
//! at the output path until the whole report has been written.
use std::fmt;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::*;
use rayon::prelude::*;
use tempfile::NamedTempFile;

use crate::data::IDIndex;
use crate::errors::{RecError, Result};
use crate::progress::ProgressHandle;

mod recommend;
mod similar;

pub use recommend::{write_recommendations, RECOMMEND_N};
pub use similar::{popularity_order, write_similar_items, SIMILAR_N};

/// Number of entities whose blocks are computed together.
const CHUNK_SIZE: usize = 256;

/// Why a report line was left out.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The model returned a code with no label.
    UnknownCode { kind: &'static str, code: u32 },
    /// The model returned a NaN or infinite score.
    NonFiniteScore { code: u32, score: f32 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnknownCode { kind, code } => {
                write!(f, "no label for {} code {}", kind, code)
            }
            SkipReason::NonFiniteScore { code, score } => {
                write!(f, "score {} for item code {} is not finite", score, code)
            }
        }
    }
}

/// The result of formatting one report line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// A complete line, including its newline.
    Line(String),
    Skipped(SkipReason),
}

impl LineOutcome {
    /// Format a `<source>\t<target>\t<score>` line.
    pub fn scored(source: &str, items: &IDIndex, item: u32, score: f32) -> LineOutcome {
        if !score.is_finite() {
            return LineOutcome::Skipped(SkipReason::NonFiniteScore { code: item, score });
        }
        match items.label(item) {
            Some(label) => LineOutcome::Line(format!("{}\t{}\t{}\n", source, label, score)),
            None => LineOutcome::Skipped(SkipReason::UnknownCode {
                kind: "item",
                code: item,
            }),
        }
    }

    /// Format a line with a single item label.
    pub fn label(items: &IDIndex, item: u32) -> LineOutcome {
        match items.label(item) {
            Some(label) => LineOutcome::Line(format!("{}\n", label)),
            None => LineOutcome::Skipped(SkipReason::UnknownCode {
                kind: "item",
                code: item,
            }),
        }
    }
}

/// Counts describing a finished report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReportSummary {
    /// Number of items or users visited.
    pub entities: usize,
    /// Number of lines written.
    pub lines: usize,
    /// Number of lines skipped.
    pub skipped: usize,
}

/// Destination for report lines.
///
/// Lines go to a temporary file in the output directory, which replaces the
/// output path when the sink is committed.  A sink dropped without being
/// committed deletes its temporary file.
pub struct ReportSink {
    path: PathBuf,
    out: BufWriter<NamedTempFile>,
    lines: usize,
    skipped: usize,
}

impl ReportSink {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<ReportSink> {
        let path = path.as_ref().to_path_buf();
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let tmp = NamedTempFile::new_in(&dir).map_err(|e| RecError::io(&dir, e))?;
        debug!("writing report to {}", tmp.path().display());
        Ok(ReportSink {
            path,
            out: BufWriter::new(tmp),
            lines: 0,
            skipped: 0,
        })
    }

    /// Record one line outcome, writing it if it is a line.
    pub fn write_outcome(&mut self, outcome: LineOutcome) -> Result<()> {
        match outcome {
            LineOutcome::Line(line) => {
                self.out
                    .write_all(line.as_bytes())
                    .map_err(|e| RecError::io(&self.path, e))?;
                self.lines += 1;
            }
            LineOutcome::Skipped(reason) => {
                trace!("skipping report line: {}", reason);
                self.skipped += 1;
            }
        }
        Ok(())
    }

    /// Flush the report and move it into place.
    pub fn commit(self, entities: usize) -> Result<ReportSummary> {
        let path = self.path;
        let tmp = self
            .out
            .into_inner()
            .map_err(|e| RecError::io(&path, e.into_error()))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| RecError::io(&path, e))?;
        tmp.persist(&path).map_err(|e| RecError::io(&path, e.error))?;

        let summary = ReportSummary {
            entities,
            lines: self.lines,
            skipped: self.skipped,
        };
        if summary.skipped > 0 {
            warn!(
                "skipped {} of {} report lines (unlabeled codes or non-finite scores)",
                summary.skipped,
                summary.lines + summary.skipped
            );
        }
        info!(
            "wrote {} lines for {} entities to {}",
            summary.lines,
            summary.entities,
            path.display()
        );
        Ok(summary)
    }
}

/// Compute per-entity blocks in parallel chunks and write them in order.
fn write_blocks<F>(
    sink: &mut ReportSink,
    label: &'static str,
    entities: &[u32],
    block: F,
) -> Result<usize>
where
    F: Fn(u32) -> Result<Vec<LineOutcome>> + Sync,
{
    let progress = ProgressHandle::new(label, entities.len());
    for chunk in entities.chunks(CHUNK_SIZE) {
        let blocks = chunk
            .par_iter()
            .map(|e| block(*e))
            .collect::<Result<Vec<_>>>()?;
        for outcome in blocks.into_iter().flatten() {
            sink.write_outcome(outcome)?;
        }
        progress.advance(chunk.len());
    }
    progress.finish();
    Ok(entities.len())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use arrow::array::StringArray;

    use super::*;

    fn items() -> IDIndex {
        IDIndex::from_values(&StringArray::from(vec!["a", "b"]))
    }

    #[test]
    fn test_scored_line() {
        let items = items();
        assert_eq!(
            LineOutcome::scored("x", &items, 1, 0.5),
            LineOutcome::Line("x\tb\t0.5\n".into())
        );
        assert_eq!(
            LineOutcome::scored("x", &items, 5, 0.5),
            LineOutcome::Skipped(SkipReason::UnknownCode {
                kind: "item",
                code: 5
            })
        );
        assert!(matches!(
            LineOutcome::scored("x", &items, 0, f32::NAN),
            LineOutcome::Skipped(SkipReason::NonFiniteScore { code: 0, .. })
        ));
    }

    #[test]
    fn test_sink_commit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tsv");
        let mut sink = ReportSink::create(&path).unwrap();
        sink.write_outcome(LineOutcome::Line("a\n".into())).unwrap();
        sink.write_outcome(LineOutcome::Skipped(SkipReason::NonFiniteScore {
            code: 0,
            score: f32::INFINITY,
        }))
        .unwrap();
        assert!(!path.exists());

        let summary = sink.commit(1).unwrap();
        assert_eq!(
            summary,
            ReportSummary {
                entities: 1,
                lines: 1,
                skipped: 1
            }
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\n");
    }

    #[test]
    fn test_sink_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tsv");
        {
            let mut sink = ReportSink::create(&path).unwrap();
            sink.write_outcome(LineOutcome::Line("a\n".into())).unwrap();
        }
        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_blocks_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tsv");
        let mut sink = ReportSink::create(&path).unwrap();
        let entities: Vec<u32> = (0..1000).rev().collect();
        let n = write_blocks(&mut sink, "test", &entities, |e| {
            Ok(vec![LineOutcome::Line(format!("{}\n", e))])
        })
        .unwrap();
        assert_eq!(n, 1000);
        sink.commit(n).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let got: Vec<u32> = text.lines().map(|l| l.parse().unwrap()).collect();
        assert_eq!(got, entities);
    }
}
