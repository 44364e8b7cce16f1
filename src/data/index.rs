// This file is part of LensKit.
// Copyright (C) 2018-2023 Boise State University.
// Copyright (C) 2023-2025 Drexel University.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Arrow-based ID index.

use arrow::array::{Array, Int32Array, Int32Builder, StringArray};
use rustc_hash::FxHashMap;

/// Bidirectional mapping between entity identifiers and dense codes.
///
/// Codes are assigned in lexicographic order of the identifiers, starting at
/// 0. The index is immutable once built.
#[derive(Clone, Debug)]
pub struct IDIndex {
    /// The identifiers, in code order.
    ids: StringArray,

    /// Lookup table.
    index: FxHashMap<String, u32>,
}

impl IDIndex {
    /// Build an index over the distinct values of an identifier column.
    ///
    /// Null entries are ignored.
    pub fn from_values(values: &StringArray) -> Self {
        let mut labels: Vec<&str> = values.iter().flatten().collect();
        labels.sort_unstable();
        labels.dedup();

        let mut index = FxHashMap::default();
        index.reserve(labels.len());
        for (i, l) in labels.iter().enumerate() {
            index.insert(l.to_string(), i as u32);
        }

        IDIndex {
            ids: StringArray::from(labels),
            index,
        }
    }

    /// Get the number of identifiers in the index.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Look up the code for an identifier.
    pub fn code(&self, id: &str) -> Option<u32> {
        self.index.get(id).copied()
    }

    /// Look up the identifier for a code.
    pub fn label(&self, code: u32) -> Option<&str> {
        let code = code as usize;
        if code < self.ids.len() {
            Some(self.ids.value(code))
        } else {
            None
        }
    }

    /// Encode an identifier column into codes.  Unknown or null identifiers
    /// become nulls.
    pub fn codes(&self, values: &StringArray) -> Int32Array {
        let mut out = Int32Builder::with_capacity(values.len());
        for v in values.iter() {
            out.append_option(v.and_then(|v| self.code(v)).map(|c| c as i32));
        }
        out.finish()
    }

    /// Iterate over the identifiers in code order.
    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.ids.iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexicographic_codes() {
        let vals = StringArray::from(vec!["u2", "u10", "u1", "u2"]);
        let idx = IDIndex::from_values(&vals);
        assert_eq!(idx.len(), 3);
        assert_eq!(idx.code("u1"), Some(0));
        assert_eq!(idx.code("u10"), Some(1));
        assert_eq!(idx.code("u2"), Some(2));
        assert_eq!(idx.code("u3"), None);
        assert_eq!(idx.labels().collect::<Vec<_>>(), vec!["u1", "u10", "u2"]);
    }

    #[test]
    fn test_round_trip_labels() {
        let vals = StringArray::from(vec!["b", "a", "c"]);
        let idx = IDIndex::from_values(&vals);
        for code in 0..idx.len() as u32 {
            let label = idx.label(code).unwrap();
            assert_eq!(idx.code(label), Some(code));
        }
        assert_eq!(idx.label(3), None);
    }

    #[test]
    fn test_codes_with_nulls() {
        let vals = StringArray::from(vec![Some("x"), None, Some("y")]);
        let idx = IDIndex::from_values(&vals);
        assert_eq!(idx.len(), 2);
        let codes = idx.codes(&vals);
        assert_eq!(codes.len(), 3);
        assert_eq!(codes.value(0), 0);
        assert!(codes.is_null(1));
        assert_eq!(codes.value(2), 1);
    }
}
