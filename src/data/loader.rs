// This file is part of LensKit.
// Copyright (C) 2018-2023 Boise State University.
// Copyright (C) 2023-2026 Drexel University.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Interaction log loading.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use arrow::{
    array::{Array, Float32Array, Float32Builder, StringArray, StringBuilder},
    csv::ReaderBuilder,
    datatypes::{DataType, Field, Schema},
};
use log::*;

use crate::errors::{RecError, Result};
use crate::sparse::{COOMatrixBuilder, CSRMatrix};

use super::IDIndex;

/// Count assigned to records whose count field is missing or unparseable.
pub const DEFAULT_COUNT: f32 = 1.0;

const BATCH_SIZE: usize = 64 * 1024;

/// Encoded interaction data, ready for model training.
#[derive(Clone, Debug)]
pub struct InteractionData {
    /// User identifiers, indexed by user code.
    pub users: IDIndex,
    /// Item identifiers, indexed by item code.
    pub items: IDIndex,
    /// Item × user interaction counts.
    pub matrix: CSRMatrix,
    /// Number of input records for each item code.
    pub item_counts: Vec<u32>,
    /// Number of records that made it into the matrix.
    pub n_records: usize,
}

/// Valid interaction records, in file order.
struct InteractionLog {
    users: StringArray,
    items: StringArray,
    counts: Float32Array,
    n_skipped: usize,
    n_defaulted: usize,
}

/// Read an interaction CSV file (user, item, count; no header).
pub fn read_interactions<P: AsRef<Path>>(path: P) -> Result<InteractionData> {
    let path = path.as_ref();
    let start = Instant::now();
    debug!("reading data from {}", path.display());
    let file = File::open(path).map_err(|e| RecError::io(path, e))?;
    let data = read_interactions_from(file)?;
    info!(
        "read {} records ({} users, {} items) from {} in {:.2}s",
        data.n_records,
        data.users.len(),
        data.items.len(),
        path.display(),
        start.elapsed().as_secs_f32()
    );
    Ok(data)
}

/// Read interaction CSV data from an arbitrary source.
pub fn read_interactions_from<R: Read>(src: R) -> Result<InteractionData> {
    let log = read_log(src)?;
    if log.n_skipped > 0 {
        warn!("skipped {} records missing a user or item", log.n_skipped);
    }
    if log.n_defaulted > 0 {
        warn!(
            "{} records had a missing or invalid count, using {}",
            log.n_defaulted, DEFAULT_COUNT
        );
    }
    Ok(encode_log(&log))
}

fn interaction_schema() -> Schema {
    Schema::new(vec![
        Field::new("user", DataType::Utf8, true),
        Field::new("item", DataType::Utf8, true),
        Field::new("count", DataType::Utf8, true),
    ])
}

fn read_log<R: Read>(src: R) -> Result<InteractionLog> {
    let reader = ReaderBuilder::new(Arc::new(interaction_schema()))
        .with_header(false)
        .with_truncated_rows(true)
        .with_batch_size(BATCH_SIZE)
        .build(src)?;

    let mut users = StringBuilder::new();
    let mut items = StringBuilder::new();
    let mut counts = Float32Builder::new();
    let mut n_skipped = 0;
    let mut n_defaulted = 0;

    for batch in reader {
        let batch = batch?;
        let ucol = checked_array_ref::<StringArray>("user", batch.column(0).as_ref())?;
        let icol = checked_array_ref::<StringArray>("item", batch.column(1).as_ref())?;
        let ccol = checked_array_ref::<StringArray>("count", batch.column(2).as_ref())?;

        for i in 0..batch.num_rows() {
            if ucol.is_null(i) || icol.is_null(i) {
                n_skipped += 1;
                continue;
            }
            let count = if ccol.is_null(i) {
                None
            } else {
                parse_count(ccol.value(i))
            };
            let count = count.unwrap_or_else(|| {
                n_defaulted += 1;
                DEFAULT_COUNT
            });
            users.append_value(ucol.value(i));
            items.append_value(icol.value(i));
            counts.append_value(count);
        }
    }

    Ok(InteractionLog {
        users: users.finish(),
        items: items.finish(),
        counts: counts.finish(),
        n_skipped,
        n_defaulted,
    })
}

/// Parse an interaction count, rejecting non-finite values.
fn parse_count(field: &str) -> Option<f32> {
    field
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|c| c.is_finite())
}

fn encode_log(log: &InteractionLog) -> InteractionData {
    let users = IDIndex::from_values(&log.users);
    let items = IDIndex::from_values(&log.items);
    let ucodes = users.codes(&log.users);
    let icodes = items.codes(&log.items);
    let n = log.counts.len();

    let mut item_counts = vec![0u32; items.len()];
    let mut coo = COOMatrixBuilder::with_capacity((items.len(), users.len()), n);
    for k in 0..n {
        // every logged record has both labels, so codes are never null here
        let ic = icodes.value(k);
        let uc = ucodes.value(k);
        coo.add_entry(ic, uc, log.counts.value(k));
        item_counts[ic as usize] += 1;
    }
    let matrix = CSRMatrix::from_coo(&coo.finish());
    debug!(
        "built {}x{} matrix with {} entries",
        matrix.n_rows,
        matrix.n_cols,
        matrix.nnz()
    );

    InteractionData {
        users,
        items,
        matrix,
        item_counts,
        n_records: n,
    }
}

/// Downcast an Arrow array to a concrete type, or fail with a type error.
fn checked_array_ref<'array, T: Array + 'static>(
    name: &str,
    array: &'array dyn Array,
) -> Result<&'array T> {
    array.as_any().downcast_ref().ok_or_else(|| {
        RecError::Arrow(arrow::error::ArrowError::SchemaError(format!(
            "invalid {} column type {}",
            name,
            array.data_type()
        )))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(text: &str) -> InteractionData {
        read_interactions_from(text.as_bytes()).expect("load failed")
    }

    #[test]
    fn test_load_small() {
        let data = load("u1,i1,3\nu1,i2,1\nu2,i1,5\n");
        assert_eq!(data.n_records, 3);
        assert_eq!(data.users.len(), 2);
        assert_eq!(data.items.len(), 2);
        assert_eq!(data.matrix.shape(), (2, 2));
        assert_eq!(data.matrix.nnz(), 3);

        let i1 = data.items.code("i1").unwrap() as usize;
        let u2 = data.users.code("u2").unwrap() as i32;
        assert_eq!(data.matrix.row_cols(i1), &[0, u2]);
        assert_eq!(data.matrix.row_vals(i1), &[3.0, 5.0]);
        assert_eq!(data.item_counts[i1], 2);
    }

    #[test]
    fn test_missing_count_defaults() {
        let data = load("u1,i1\nu2,i1,abc\nu3,i1,\n");
        assert_eq!(data.n_records, 3);
        assert_eq!(data.matrix.row_vals(0), &[DEFAULT_COUNT; 3]);
    }

    #[test]
    fn test_short_lines_skipped() {
        let data = load("u1,i1,2\nu2\nu3,i2,1\n");
        assert_eq!(data.n_records, 2);
        assert_eq!(data.users.len(), 2);
        assert_eq!(data.users.code("u2"), None);
    }

    #[test]
    fn test_duplicates_count_and_merge() {
        let data = load("u1,i1,1\nu1,i1,2\nu2,i2,1\n");
        assert_eq!(data.n_records, 3);
        assert_eq!(data.matrix.nnz(), 2);
        assert_eq!(data.matrix.row_vals(0), &[3.0]);
        assert_eq!(data.item_counts, vec![2, 1]);
    }

    #[test]
    fn test_distinct_items() {
        let data = load("a,x,1\nb,y,1\nc,x,1\na,z,4\nb,z,1\n");
        assert_eq!(data.items.len(), 3);
        assert_eq!(data.items.labels().collect::<Vec<_>>(), vec!["x", "y", "z"]);
        assert_eq!(data.item_counts, vec![2, 1, 2]);
    }

    #[test]
    fn test_missing_file() {
        let res = read_interactions("/nonexistent/applies.csv");
        assert!(matches!(res, Err(RecError::Io { .. })));
    }
}
