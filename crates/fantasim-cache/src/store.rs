// SPDX-License-Identifier: Apache-2.0
//! Manifest-aware artifact cache: key layout, `get_or_create`, pair-write
//! (§4.8).

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use fantasim_core::hash::sha256;
use fantasim_core::FantaSimError;
use fantasim_kv::{KvStore, WriteOp};
use tracing::{info, instrument};

use crate::fingerprint::{input_fingerprint, params_hash, BoundaryRef, ParamValue};
use crate::manifest::{ArtifactManifest, StorageRef};

/// Builds the manifest key `stream_prefix || "Artifact:" || kind || ":" ||
/// fingerprint || ":Manifest"` (§6).
#[must_use]
pub fn manifest_key(stream_prefix: &str, artifact_kind: &str, fingerprint: &str) -> Vec<u8> {
    format!("{stream_prefix}Artifact:{artifact_kind}:{fingerprint}:Manifest").into_bytes()
}

/// Builds the payload key: the manifest key with a `:Payload` suffix (§6).
#[must_use]
pub fn payload_key(stream_prefix: &str, artifact_kind: &str, fingerprint: &str) -> Vec<u8> {
    format!("{stream_prefix}Artifact:{artifact_kind}:{fingerprint}:Payload").into_bytes()
}

/// Outcome of a [`ArtifactCache::get_or_create`] call.
#[derive(Debug, Clone)]
pub struct GetOrCreateOutcome {
    /// The cached (or freshly generated) payload bytes.
    pub payload: Arc<[u8]>,
    /// The manifest describing `payload`.
    pub manifest: ArtifactManifest,
    /// `true` if an existing manifest/payload pair was found; `false` if
    /// `generate` was invoked.
    pub is_hit: bool,
}

/// Manifest-aware cache over a shared [`KvStore`] backend.
///
/// Mirrors `fantasim_events::EventStore`'s shape: a thin wrapper around a
/// shared, lock-guarded [`KvStore`], scoped by a string key prefix rather
/// than owning storage itself.
pub struct ArtifactCache {
    kv: Arc<Mutex<dyn KvStore + Send>>,
    write_sequence: Mutex<u64>,
}

impl ArtifactCache {
    /// Opens a cache over a shared KV backend.
    #[must_use]
    pub fn new(kv: Arc<Mutex<dyn KvStore + Send>>) -> Self {
        Self {
            kv,
            write_sequence: Mutex::new(0),
        }
    }

    pub(crate) fn lock(&self) -> std::sync::MutexGuard<'_, dyn KvStore + Send + 'static> {
        match self.kv.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Deletes the value at `key`, if present. Used by [`crate::gc::collect`]
    /// to remove a collected manifest or payload.
    pub(crate) fn delete_raw(&self, key: &[u8]) {
        self.lock().delete(key);
    }

    fn next_write_sequence(&self) -> u64 {
        let mut guard = match self.write_sequence.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let current = *guard;
        *guard += 1;
        current
    }

    /// Current write-sequence counter value, without advancing it. Used by
    /// [`crate::gc::collect`] to compute manifest age.
    #[must_use]
    pub fn current_write_sequence(&self) -> u64 {
        match self.write_sequence.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Reads the raw manifest bytes at the given coordinates, or `None` if
    /// absent.
    #[must_use]
    pub fn read_manifest_bytes(&self, stream_prefix: &str, artifact_kind: &str, fingerprint: &str) -> Option<Arc<[u8]>> {
        self.lock().get(&manifest_key(stream_prefix, artifact_kind, fingerprint))
    }

    fn read_payload(&self, storage: &StorageRef, stream_prefix: &str, artifact_kind: &str, fingerprint: &str) -> Option<Arc<[u8]>> {
        match storage {
            StorageRef::Embedded { .. } => self.lock().get(&payload_key(stream_prefix, artifact_kind, fingerprint)),
            StorageRef::External { uri, .. } => self.lock().get(uri.as_bytes()),
        }
    }

    /// Implements the §4.8 `get_or_create` algorithm: compute the
    /// fingerprint, read the manifest (manifest-first), verify fingerprint
    /// and content hash on a hit, or invoke `generate` and pair-write on a
    /// miss.
    ///
    /// # Errors
    /// Returns [`FantaSimError::FingerprintMismatch`] if a stored manifest's
    /// fingerprint disagrees with the recomputed one (cache poisoning), or
    /// [`FantaSimError::ContentHashMismatch`] if the payload bytes don't
    /// match the manifest's declared content hash. Propagates whatever
    /// error `generate` returns on a miss.
    #[instrument(skip(self, params, generate), fields(stream_prefix, artifact_kind))]
    pub fn get_or_create<F>(
        &self,
        stream_prefix: &str,
        artifact_kind: &str,
        boundary: &BoundaryRef,
        generator_id: &str,
        generator_version: &str,
        params: &BTreeMap<String, ParamValue>,
        generate: F,
    ) -> Result<GetOrCreateOutcome, FantaSimError>
    where
        F: FnOnce() -> Result<Vec<u8>, FantaSimError>,
    {
        let fingerprint = input_fingerprint(stream_prefix, boundary, generator_id, generator_version, params);
        let hashed_params = params_hash(params);
        let artifact_key = format!("{stream_prefix}Artifact:{artifact_kind}:{fingerprint}");

        if let Some(manifest_bytes) = self.read_manifest_bytes(stream_prefix, artifact_kind, &fingerprint) {
            let manifest = ArtifactManifest::from_bytes(&manifest_bytes)?;
            if manifest.input_fingerprint != fingerprint {
                return Err(FantaSimError::FingerprintMismatch {
                    artifact_key,
                    expected: fantasim_core::hash::from_hex(&fingerprint).unwrap_or(fantasim_core::hash::ZERO_HASH),
                    found: fantasim_core::hash::from_hex(&manifest.input_fingerprint).unwrap_or(fantasim_core::hash::ZERO_HASH),
                });
            }
            let payload = self
                .read_payload(&manifest.storage, stream_prefix, artifact_kind, &fingerprint)
                .ok_or_else(|| FantaSimError::ContentHashMismatch {
                    artifact_key: artifact_key.clone(),
                    expected: manifest.storage.content_hash(),
                    found: fantasim_core::hash::ZERO_HASH,
                })?;
            let found = sha256(&payload);
            if found != manifest.storage.content_hash() {
                return Err(FantaSimError::ContentHashMismatch {
                    artifact_key,
                    expected: manifest.storage.content_hash(),
                    found,
                });
            }
            info!(%artifact_key, "cache hit");
            return Ok(GetOrCreateOutcome {
                payload,
                manifest,
                is_hit: true,
            });
        }

        let payload_bytes = generate()?;
        let content_hash = sha256(&payload_bytes);
        let manifest = ArtifactManifest {
            input_fingerprint: fingerprint.clone(),
            artifact_kind: artifact_kind.to_string(),
            generator_id: generator_id.to_string(),
            generator_version: generator_version.to_string(),
            params_hash: hashed_params,
            storage: StorageRef::Embedded { content_hash },
            written_at_sequence: self.next_write_sequence(),
        };

        let ops = vec![
            WriteOp {
                key: payload_key(stream_prefix, artifact_kind, &fingerprint),
                value: Arc::from(payload_bytes.clone().into_boxed_slice()),
            },
            WriteOp {
                key: manifest_key(stream_prefix, artifact_kind, &fingerprint),
                value: Arc::from(manifest.to_bytes()?.into_boxed_slice()),
            },
        ];
        self.lock()
            .batch_write(&ops)
            .map_err(|e| FantaSimError::Codec(e.to_string()))?;

        info!(%artifact_key, "cache miss, generated and stored");
        Ok(GetOrCreateOutcome {
            payload: Arc::from(payload_bytes.into_boxed_slice()),
            manifest,
            is_hit: false,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fantasim_kv::MemoryKv;

    fn cache() -> ArtifactCache {
        let kv: Arc<Mutex<dyn KvStore + Send>> = Arc::new(Mutex::new(MemoryKv::new()));
        ArtifactCache::new(kv)
    }

    fn boundary() -> BoundaryRef {
        BoundaryRef::new("tick", "10")
    }

    #[test]
    fn miss_then_hit_returns_identical_payload() {
        let cache = cache();
        let params = BTreeMap::new();
        let calls = Mutex::new(0);
        let generate = || -> Result<Vec<u8>, FantaSimError> {
            *calls.lock().unwrap() += 1;
            Ok(b"generated bytes".to_vec())
        };

        let first = cache
            .get_or_create("S:1:", "Atlas", &boundary(), "G", "1.0.0", &params, generate)
            .unwrap();
        assert!(!first.is_hit);
        assert_eq!(&*first.payload, b"generated bytes");

        let second = cache
            .get_or_create("S:1:", "Atlas", &boundary(), "G", "1.0.0", &params, || {
                Ok(b"should not be called".to_vec())
            })
            .unwrap();
        assert!(second.is_hit);
        assert_eq!(&*second.payload, b"generated bytes");
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn tampered_payload_is_detected_on_read() {
        let cache = cache();
        let params = BTreeMap::new();
        cache
            .get_or_create("S:1:", "Atlas", &boundary(), "G", "1.0.0", &params, || Ok(b"original".to_vec()))
            .unwrap();

        let fingerprint = input_fingerprint("S:1:", &boundary(), "G", "1.0.0", &params);
        let key = payload_key("S:1:", "Atlas", &fingerprint);
        cache.lock().put(&key, b"tampered");

        let result = cache.get_or_create("S:1:", "Atlas", &boundary(), "G", "1.0.0", &params, || {
            Ok(b"should not be called".to_vec())
        });
        assert!(matches!(result, Err(FantaSimError::ContentHashMismatch { .. })));
    }

    #[test]
    fn different_params_are_distinct_cache_entries() {
        let cache = cache();
        let mut a = BTreeMap::new();
        a.insert("n".to_string(), ParamValue::Int(1));
        let mut b = BTreeMap::new();
        b.insert("n".to_string(), ParamValue::Int(2));

        cache
            .get_or_create("S:1:", "Atlas", &boundary(), "G", "1.0.0", &a, || Ok(b"a-bytes".to_vec()))
            .unwrap();
        let result_b = cache
            .get_or_create("S:1:", "Atlas", &boundary(), "G", "1.0.0", &b, || Ok(b"b-bytes".to_vec()))
            .unwrap();
        assert!(!result_b.is_hit);
        assert_eq!(&*result_b.payload, b"b-bytes");
    }
}
