// SPDX-License-Identifier: Apache-2.0
//! Stream identity and stable 128-bit semantic identifiers.
//!
//! Follows the newtype-over-opaque-bytes pattern `warp_core::ident` uses for
//! `NodeId`/`TypeId`/`EdgeId`: each identifier is a `#[repr(transparent)]`
//! wrapper that prevents accidental mixing between identifier domains, even
//! though the underlying representation (a 128-bit integer here, a 256-bit
//! hash there) is structurally interchangeable.

use std::fmt;
use std::str::FromStr;

/// Finite enumeration of stream domains (§3: "one of a finite enum").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StreamDomain {
    /// Plate topology events (creation, retirement, boundaries, junctions).
    PlatesTopology,
    /// Plate kinematics events (motion segments, model assignment).
    PlatesKinematics,
}

impl StreamDomain {
    /// Canonical wire token used in storage key prefixes (§6).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PlatesTopology => "geo.plates.topology",
            Self::PlatesKinematics => "geo.plates.kinematics",
        }
    }

    /// Parses a canonical wire token.
    ///
    /// # Errors
    /// Returns `Err` if `s` does not match a known domain token.
    pub fn parse(s: &str) -> Result<Self, InvalidStreamDomain> {
        match s {
            "geo.plates.topology" => Ok(Self::PlatesTopology),
            "geo.plates.kinematics" => Ok(Self::PlatesKinematics),
            other => Err(InvalidStreamDomain(other.to_string())),
        }
    }
}

/// Raised when a stream domain token does not match the finite enum (§3).
#[derive(Debug, Clone, thiserror::Error)]
#[error("unrecognized stream domain: {0}")]
pub struct InvalidStreamDomain(pub String);

/// Opaque namespace identifying one event stream (§3).
///
/// `to_stream_key` is total and injective: distinct `StreamIdentity` values
/// always produce distinct keys, and the mapping never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamIdentity {
    /// Scenario/variant grouping (e.g. a named "what-if" run).
    pub variant_id: u32,
    /// Branch within a variant (e.g. a forked timeline).
    pub branch_id: u32,
    /// Nesting level, `>= 0`.
    pub level: u32,
    /// Stream domain.
    pub domain: StreamDomain,
    /// Motion/topology model identifier scoping this stream.
    pub model: u32,
}

impl StreamIdentity {
    /// Creates a new stream identity.
    #[must_use]
    pub const fn new(variant_id: u32, branch_id: u32, level: u32, domain: StreamDomain, model: u32) -> Self {
        Self {
            variant_id,
            branch_id,
            level,
            domain,
            model,
        }
    }

    /// Produces the canonical storage key prefix (§6):
    /// `S:{variant}:{branch}:L{level}:{domain}:M{model}:`
    #[must_use]
    pub fn to_stream_key(self) -> String {
        format!(
            "S:{}:{}:L{}:{}:M{}:",
            self.variant_id,
            self.branch_id,
            self.level,
            self.domain.as_str(),
            self.model
        )
    }
}

impl fmt::Display for StreamIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_stream_key())
    }
}

impl FromStr for StreamIdentity {
    type Err = InvalidStreamKey;

    /// Parses the canonical form `to_stream_key` produces:
    /// `S:{variant}:{branch}:L{level}:{domain}:M{model}:`.
    ///
    /// Exists for CLI and config callers that take a stream as a single
    /// opaque string rather than its five component fields.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || InvalidStreamKey(s.to_string());
        let body = s.strip_prefix("S:").ok_or_else(err)?;
        let body = body.strip_suffix(':').ok_or_else(err)?;
        let parts: Vec<&str> = body.split(':').collect();
        let [variant, branch, level, domain, model] = parts.as_slice() else {
            return Err(err());
        };
        let variant_id: u32 = variant.parse().map_err(|_| err())?;
        let branch_id: u32 = branch.parse().map_err(|_| err())?;
        let level: u32 = level.strip_prefix('L').ok_or_else(err)?.parse().map_err(|_| err())?;
        let domain = StreamDomain::parse(domain).map_err(|_| err())?;
        let model: u32 = model.strip_prefix('M').ok_or_else(err)?.parse().map_err(|_| err())?;
        Ok(Self::new(variant_id, branch_id, level, domain, model))
    }
}

/// Raised when a string does not match the canonical stream key form.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid stream key: {0}")]
pub struct InvalidStreamKey(pub String);

/// Generates a 128-bit stable semantic identifier newtype with canonical
/// textual form (32 lowercase hex characters), following the
/// `#[repr(transparent)]` newtype pattern of `warp_core::ident::NodeId`.
macro_rules! stable_id {
    ($name:ident, $prefix:literal) => {
        #[doc = concat!("Stable, cross-boundary identifier: `", $prefix, "`.")]
        #[repr(transparent)]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub u128);

        impl $name {
            /// Constructs an identifier from a raw 128-bit value.
            #[must_use]
            pub const fn from_raw(value: u128) -> Self {
                Self(value)
            }

            /// Returns the raw 128-bit value.
            #[must_use]
            pub const fn raw(self) -> u128 {
                self.0
            }

            /// Derives a stable id from a label, domain-separated by the
            /// identifier kind, mirroring `warp_core::ident::make_node_id`'s
            /// `blake3("node:" || label)` convention but folded into 128 bits
            /// via a truncated SHA-256 digest (this crate standardizes on
            /// SHA-256 per §4.1/§6; see `fantasim-core::hash`).
            #[must_use]
            pub fn from_label(label: &str) -> Self {
                let digest = crate::hash::Preimage::new()
                    .field($prefix.as_bytes())
                    .field(label.as_bytes())
                    .finish();
                let mut raw = [0u8; 16];
                raw.copy_from_slice(&digest[..16]);
                Self(u128::from_be_bytes(raw))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:032x}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = InvalidStableId;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if s.len() != 32 {
                    return Err(InvalidStableId(s.to_string()));
                }
                u128::from_str_radix(s, 16)
                    .map(Self)
                    .map_err(|_| InvalidStableId(s.to_string()))
            }
        }
    };
}

stable_id!(PlateId, "plate");
stable_id!(BoundaryId, "boundary");
stable_id!(JunctionId, "junction");
stable_id!(MotionSegmentId, "motion-segment");
stable_id!(FeatureId, "feature");
stable_id!(ModelId, "model");
stable_id!(FeatureSetId, "feature-set");

/// Raised when parsing a stable id's canonical textual form fails.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid stable id text: {0}")]
pub struct InvalidStableId(pub String);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn stream_key_is_total_and_injective() {
        let a = StreamIdentity::new(1, 0, 0, StreamDomain::PlatesTopology, 1);
        let b = StreamIdentity::new(1, 0, 0, StreamDomain::PlatesKinematics, 1);
        let c = StreamIdentity::new(2, 0, 0, StreamDomain::PlatesTopology, 1);
        assert_ne!(a.to_stream_key(), b.to_stream_key());
        assert_ne!(a.to_stream_key(), c.to_stream_key());
    }

    #[test]
    fn stream_key_round_trips_through_parse() {
        let identity = StreamIdentity::new(3, 1, 2, StreamDomain::PlatesKinematics, 7);
        let parsed: StreamIdentity = identity.to_stream_key().parse().unwrap();
        assert_eq!(identity, parsed);
    }

    #[test]
    fn malformed_stream_key_is_rejected() {
        assert!("not-a-stream-key".parse::<StreamIdentity>().is_err());
        assert!("S:1:0:L0:geo.plates.topology:7".parse::<StreamIdentity>().is_err());
    }

    #[test]
    fn stream_domain_round_trips() {
        assert_eq!(
            StreamDomain::parse(StreamDomain::PlatesTopology.as_str()).unwrap(),
            StreamDomain::PlatesTopology
        );
        assert!(StreamDomain::parse("bogus").is_err());
    }

    #[test]
    fn plate_id_domain_separation_prevents_collision() {
        let plate = PlateId::from_label("pacific");
        let boundary = BoundaryId::from_label("pacific");
        assert_ne!(plate.raw(), boundary.raw());
    }

    #[test]
    fn plate_id_text_round_trips() {
        let id = PlateId::from_label("nazca");
        let text = id.to_string();
        assert_eq!(text.len(), 32);
        assert_eq!(PlateId::from_str(&text).unwrap(), id);
    }

    #[test]
    fn plate_id_deterministic_across_calls() {
        assert_eq!(PlateId::from_label("eurasia"), PlateId::from_label("eurasia"));
    }
}
