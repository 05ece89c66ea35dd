// SPDX-License-Identifier: Apache-2.0
//! `input_fingerprint` and `params_hash` computation (§4.8).
//!
//! Reuses `fantasim_core::hash::Preimage`'s length-prefixed tuple framing
//! (the same discipline the event hash chain preimage uses) rather than a
//! bespoke encoder, so a fingerprint and an event hash are computed by the
//! same injective-framing rule.

use std::collections::BTreeMap;

use fantasim_core::hash::{to_hex, Preimage};

/// One parameter value in a generator's parameter map, serialized by a
/// type discriminator so values of different types never collide in the
/// digest even when their raw bytes would otherwise coincide.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Boolean.
    Bool(bool),
    /// Signed 64-bit integer.
    Int(i64),
    /// IEEE-754 double, compared bit-for-bit via `to_bits`.
    Float(f64),
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

impl ParamValue {
    fn fold_into(&self, preimage: Preimage) -> Preimage {
        match self {
            Self::Bool(b) => preimage.field(&[0]).field(&[u8::from(*b)]),
            Self::Int(i) => preimage.field(&[1]).field_i64(*i),
            Self::Float(f) => preimage.field(&[2]).field(&f.to_bits().to_be_bytes()),
            Self::Text(s) => preimage.field(&[3]).field(s.as_bytes()),
            Self::Bytes(b) => preimage.field(&[4]).field(b),
        }
    }
}

/// A boundary coordinate scoping a cached artifact to a point in the
/// simulation (a tick, a feature-set id, ...). Opaque to the cache itself:
/// the caller picks `kind`/`value` conventions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryRef {
    /// The boundary's kind, e.g. `"tick"` or `"feature_set"`.
    pub kind: String,
    /// The boundary's value, canonicalized to its string form by the caller.
    pub value: String,
}

impl BoundaryRef {
    /// Builds a boundary reference.
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

/// Computes `params_hash`: canonical deterministic serialization of
/// `params` (keys sorted lexicographically — free via `BTreeMap` iteration
/// order — values serialized by type-discriminated bytes), then SHA-256,
/// hex-encoded.
#[must_use]
pub fn params_hash(params: &BTreeMap<String, ParamValue>) -> String {
    let mut preimage = Preimage::new();
    for (key, value) in params {
        preimage = value.fold_into(preimage.field(key.as_bytes()));
    }
    to_hex(&preimage.finish())
}

/// Computes `input_fingerprint = SHA-256(stream_key || boundary_kind ||
/// boundary_value || generator_id || generator_version || params_hash)`,
/// hex-encoded (§4.8).
#[must_use]
pub fn input_fingerprint(
    stream_key: &str,
    boundary: &BoundaryRef,
    generator_id: &str,
    generator_version: &str,
    params: &BTreeMap<String, ParamValue>,
) -> String {
    let hashed_params = params_hash(params);
    let digest = Preimage::new()
        .field(stream_key.as_bytes())
        .field(boundary.kind.as_bytes())
        .field(boundary.value.as_bytes())
        .field(generator_id.as_bytes())
        .field(generator_version.as_bytes())
        .field(hashed_params.as_bytes())
        .finish();
    to_hex(&digest)
}
