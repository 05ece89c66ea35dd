// SPDX-License-Identifier: Apache-2.0
//! Crate-wide error taxonomy.
//!
//! One `thiserror` enum with one variant per named failure mode (§7), each
//! carrying structured context fields rather than an interpolated message,
//! mirroring `echo_cas::CasError`'s shape.

use crate::hash::Hash;
use crate::tick::Tick;

/// Top-level error type returned by every FantaSim-World operation.
#[derive(Debug, thiserror::Error)]
pub enum FantaSimError {
    /// A caller-supplied argument violated a documented precondition.
    #[error("invalid argument `{field}`: {reason}")]
    InvalidArgument {
        /// Name of the offending field or parameter.
        field: &'static str,
        /// Human-readable reason the value was rejected.
        reason: String,
    },

    /// An appended event's tick violated the stream's [`crate::config::TickPolicy`].
    #[error("tick {candidate} is not monotone after {last_seen} on stream {stream_key}")]
    TickMonotonicityViolation {
        /// Key of the stream the append targeted.
        stream_key: String,
        /// Tick of the last record already present on the stream.
        last_seen: Tick,
        /// Tick of the rejected candidate record.
        candidate: Tick,
    },

    /// The stored hash chain failed verification at the given sequence.
    #[error("hash chain corrupted on stream {stream_key} at sequence {sequence}: expected previous_hash {expected:x?}, found {found:x?}")]
    HashChainCorruption {
        /// Key of the stream whose chain failed to verify.
        stream_key: String,
        /// Sequence number of the first record that failed to verify.
        sequence: u64,
        /// `previous_hash` the record should have carried.
        expected: Hash,
        /// `previous_hash` the record actually carried.
        found: Hash,
    },

    /// A record's `schema_version` is not one this build understands.
    #[error("unsupported schema version {found} on stream {stream_key} (supports {supported_min}..={supported_max})")]
    SchemaVersionUnsupported {
        /// Key of the stream containing the offending record.
        stream_key: String,
        /// Schema version found on the record.
        found: u32,
        /// Minimum schema version this build supports.
        supported_min: u32,
        /// Maximum schema version this build supports.
        supported_max: u32,
    },

    /// Reconstruction encountered a motion frame reference cycle.
    #[error("cyclic frame reference detected while resolving frame {frame_id} at tick {tick}")]
    CyclicFrameReference {
        /// Identifier of the frame where the cycle was detected.
        frame_id: String,
        /// Tick at which resolution was attempted.
        tick: Tick,
    },

    /// Plate topology violated a structural invariant (dangling reference,
    /// non-manifold boundary graph, etc).
    #[error("invalid topology: {reason}")]
    InvalidTopology {
        /// Human-readable description of the violated invariant.
        reason: String,
    },

    /// Spherical polygon construction could not produce a closed, simple ring.
    #[error("polygonization failed for plate {plate_id} at tick {tick}: {reason}")]
    PolygonizationFailed {
        /// Plate whose partition polygon failed to close.
        plate_id: String,
        /// Tick at which polygonization was attempted.
        tick: Tick,
        /// Human-readable description of the failure.
        reason: String,
    },

    /// A cached artifact's recomputed fingerprint does not match its manifest.
    #[error("fingerprint mismatch for artifact {artifact_key}: manifest says {expected:x?}, recomputed {found:x?}")]
    FingerprintMismatch {
        /// Key identifying the artifact in the cache.
        artifact_key: String,
        /// Fingerprint recorded in the artifact's manifest.
        expected: Hash,
        /// Fingerprint recomputed from the artifact's declared inputs.
        found: Hash,
    },

    /// A cached artifact's payload hash does not match its manifest's
    /// declared content hash.
    #[error("content hash mismatch for artifact {artifact_key}: manifest says {expected:x?}, payload hashes to {found:x?}")]
    ContentHashMismatch {
        /// Key identifying the artifact in the cache.
        artifact_key: String,
        /// Content hash recorded in the artifact's manifest.
        expected: Hash,
        /// Content hash recomputed from the stored payload bytes.
        found: Hash,
    },

    /// The operation was cancelled before completion (e.g. a scheduler run
    /// stopped at a horizon tick).
    #[error("operation cancelled: {reason}")]
    Cancelled {
        /// Human-readable description of why the operation stopped.
        reason: String,
    },

    /// Wraps a lower-level I/O failure from a storage backend.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Wraps a CBOR (de)serialization failure on the wire codec.
    #[error("codec error: {0}")]
    Codec(String),
}
