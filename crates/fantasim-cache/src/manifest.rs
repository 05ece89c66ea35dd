// SPDX-License-Identifier: Apache-2.0
//! Cache manifest record (§4.8, §6 "Cache manifest").

use fantasim_core::hash::Hash;
use fantasim_core::FantaSimError;
use serde::{Deserialize, Serialize};

/// Where a payload's bytes physically live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StorageRef {
    /// Payload bytes are stored alongside the manifest, under the payload
    /// key.
    Embedded {
        /// `SHA-256(payload bytes)`.
        content_hash: Hash,
    },
    /// Payload bytes live at an external URI, fetched and verified on read.
    External {
        /// Location of the payload.
        uri: String,
        /// `SHA-256(payload bytes)`, verified after fetch.
        content_hash: Hash,
    },
}

impl StorageRef {
    /// The content hash regardless of storage mode.
    #[must_use]
    pub fn content_hash(&self) -> Hash {
        match self {
            Self::Embedded { content_hash } | Self::External { content_hash, .. } => *content_hash,
        }
    }
}

/// Manifest record pairing a cached payload with the inputs that produced
/// it (§4.8). Manifests and payloads are always written as a pair and read
/// manifest-first; a reader never observes a payload without its manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    /// `input_fingerprint` this manifest was written under.
    pub input_fingerprint: String,
    /// Artifact kind, e.g. `"Atlas"`.
    pub artifact_kind: String,
    /// Generator that produced the payload.
    pub generator_id: String,
    /// Generator version string.
    pub generator_version: String,
    /// `params_hash` folded into `input_fingerprint`.
    pub params_hash: String,
    /// Where the payload lives.
    pub storage: StorageRef,
    /// Monotonic write sequence assigned by the cache at write time, used
    /// for GC age comparisons in place of a wall-clock timestamp.
    pub written_at_sequence: u64,
}

impl ArtifactManifest {
    /// Serializes this manifest to its wire form (CBOR).
    ///
    /// # Errors
    /// Returns [`FantaSimError::Codec`] if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, FantaSimError> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).map_err(|e| FantaSimError::Codec(e.to_string()))?;
        Ok(buf)
    }

    /// Deserializes a manifest from its wire form.
    ///
    /// # Errors
    /// Returns [`FantaSimError::Codec`] if `bytes` is malformed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FantaSimError> {
        ciborium::from_reader(bytes).map_err(|e| FantaSimError::Codec(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn manifest_round_trips_through_bytes() {
        let manifest = ArtifactManifest {
            input_fingerprint: "f".repeat(64),
            artifact_kind: "Atlas".to_string(),
            generator_id: "G".to_string(),
            generator_version: "1.0.0".to_string(),
            params_hash: "p".repeat(64),
            storage: StorageRef::Embedded {
                content_hash: [7u8; 32],
            },
            written_at_sequence: 42,
        };
        let bytes = manifest.to_bytes().unwrap();
        let decoded = ArtifactManifest::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, manifest);
    }

    #[test]
    fn content_hash_is_extracted_regardless_of_storage_mode() {
        let embedded = StorageRef::Embedded { content_hash: [1u8; 32] };
        let external = StorageRef::External {
            uri: "kv:external".to_string(),
            content_hash: [1u8; 32],
        };
        assert_eq!(embedded.content_hash(), external.content_hash());
    }
}
