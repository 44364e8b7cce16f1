// This file is part of LensKit.
// Copyright (C) 2018-2023 Boise State University.
// Copyright (C) 2023-2026 Drexel University.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Model hyperparameter overrides.
//!
//! Overrides arrive as `KEY=VALUE` strings.  They are merged into the JSON
//! form of a model's default parameters and deserialized back, so serde does
//! the type checking.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::errors::{RecError, Result};

/// A single `KEY=VALUE` parameter override.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamOverride {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for ParamOverride {
    type Err = RecError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('=') {
            Some((k, v)) if !k.trim().is_empty() => Ok(ParamOverride {
                key: k.trim().to_string(),
                value: v.trim().to_string(),
            }),
            _ => Err(RecError::InvalidParam {
                key: s.to_string(),
                message: "expected KEY=VALUE".into(),
            }),
        }
    }
}

/// Interpret an override value: JSON if it parses, a plain string otherwise.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Apply parameter overrides to a set of defaults.
///
/// Keys must name existing fields of the parameter struct.
pub fn apply_overrides<P>(defaults: P, overrides: &[ParamOverride]) -> Result<P>
where
    P: Serialize + DeserializeOwned,
{
    if overrides.is_empty() {
        return Ok(defaults);
    }

    let mut value = serde_json::to_value(&defaults).map_err(|e| RecError::InvalidParam {
        key: "*".into(),
        message: e.to_string(),
    })?;
    let fields = value.as_object_mut().ok_or_else(|| RecError::InvalidParam {
        key: "*".into(),
        message: "model takes no parameters".into(),
    })?;

    for ov in overrides {
        if !fields.contains_key(&ov.key) {
            let mut known: Vec<&str> = fields.keys().map(String::as_str).collect();
            known.sort_unstable();
            return Err(RecError::InvalidParam {
                key: ov.key.clone(),
                message: format!("unknown parameter (expected one of {})", known.join(", ")),
            });
        }
        fields.insert(ov.key.clone(), parse_value(&ov.value));
    }

    serde_json::from_value(value).map_err(|e| RecError::InvalidParam {
        key: overrides
            .iter()
            .map(|o| o.key.as_str())
            .collect::<Vec<_>>()
            .join(","),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct TestParams {
        factors: usize,
        rate: f32,
        #[serde(rename = "K1")]
        k1: f32,
        verify: bool,
    }

    fn defaults() -> TestParams {
        TestParams {
            factors: 10,
            rate: 0.5,
            k1: 1.2,
            verify: true,
        }
    }

    fn ov(s: &str) -> ParamOverride {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_override() {
        let o = ov("factors = 32");
        assert_eq!(o.key, "factors");
        assert_eq!(o.value, "32");
        assert!("factors".parse::<ParamOverride>().is_err());
        assert!("=3".parse::<ParamOverride>().is_err());
    }

    #[test]
    fn test_no_overrides() {
        assert_eq!(apply_overrides(defaults(), &[]).unwrap(), defaults());
    }

    #[test]
    fn test_overrides_apply() {
        let p = apply_overrides(
            defaults(),
            &[ov("factors=32"), ov("K1=100"), ov("verify=false")],
        )
        .unwrap();
        assert_eq!(p.factors, 32);
        assert_eq!(p.k1, 100.0);
        assert!(!p.verify);
        assert_eq!(p.rate, 0.5);
    }

    #[test]
    fn test_unknown_key() {
        let res = apply_overrides(defaults(), &[ov("fctors=32")]);
        match res {
            Err(RecError::InvalidParam { key, .. }) => assert_eq!(key, "fctors"),
            r => panic!("unexpected result {:?}", r),
        }
    }

    #[test]
    fn test_bad_type() {
        let res = apply_overrides(defaults(), &[ov("factors=many")]);
        assert!(matches!(res, Err(RecError::InvalidParam { .. })));
    }
}
