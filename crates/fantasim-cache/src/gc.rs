// SPDX-License-Identifier: Apache-2.0
//! Retention-policy garbage collection (§4.8 "Garbage collection").
//!
//! Generalizes `echo_cas`'s pin/unpin retention-root model: instead of an
//! explicit pin set, retention is computed from age (`max_sequence_age`,
//! measured against [`ArtifactCache::current_write_sequence`] rather than a
//! wall clock) and a `min_artifacts_to_keep` floor per artifact kind.

use std::collections::BTreeMap;

use fantasim_core::FantaSimError;
use tracing::info;

use crate::manifest::ArtifactManifest;
use crate::store::{payload_key, ArtifactCache};

/// Retention policy for [`collect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Manifests written more than this many write-sequence ticks ago are
    /// eligible for deletion.
    pub max_sequence_age: u64,
    /// Minimum number of most-recent entries to retain per artifact kind,
    /// regardless of age.
    pub min_artifacts_to_keep: usize,
}

/// Summary of a [`collect`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollectionReport {
    /// Manifests deleted.
    pub manifests_deleted: u64,
    /// Payloads deleted.
    pub payloads_deleted: u64,
}

struct Entry {
    manifest_key: Vec<u8>,
    manifest: ArtifactManifest,
}

/// Enumerates manifests under `stream_prefix`, sorts each artifact kind's
/// entries by `written_at_sequence` descending, and deletes both the
/// manifest and payload for anything older than `policy.max_sequence_age`
/// while retaining at least `policy.min_artifacts_to_keep` most-recent
/// entries per kind (§4.8).
///
/// # Errors
/// Returns [`FantaSimError::Codec`] if a stored manifest cannot be decoded.
pub fn collect(cache: &ArtifactCache, stream_prefix: &str, policy: RetentionPolicy) -> Result<CollectionReport, FantaSimError> {
    let scan_prefix = format!("{stream_prefix}Artifact:").into_bytes();
    let entries = cache.lock().scan_prefix(&scan_prefix);

    let mut by_kind: BTreeMap<String, Vec<Entry>> = BTreeMap::new();
    for (key, bytes) in entries {
        if !key.ends_with(b":Manifest") {
            continue;
        }
        let manifest = ArtifactManifest::from_bytes(&bytes)?;
        by_kind.entry(manifest.artifact_kind.clone()).or_default().push(Entry {
            manifest_key: key,
            manifest,
        });
    }

    let now = cache.current_write_sequence();
    let mut report = CollectionReport::default();

    for entries in by_kind.values_mut() {
        entries.sort_by(|a, b| b.manifest.written_at_sequence.cmp(&a.manifest.written_at_sequence));
        for entry in entries.iter().skip(policy.min_artifacts_to_keep) {
            let age = now.saturating_sub(entry.manifest.written_at_sequence);
            if age <= policy.max_sequence_age {
                continue;
            }
            let payload_k = payload_key(stream_prefix, &entry.manifest.artifact_kind, &entry.manifest.input_fingerprint);
            cache.delete_raw(&entry.manifest_key);
            cache.delete_raw(&payload_k);
            report.manifests_deleted += 1;
            report.payloads_deleted += 1;
            info!(
                artifact_kind = %entry.manifest.artifact_kind,
                fingerprint = %entry.manifest.input_fingerprint,
                age,
                "collected artifact"
            );
        }
    }

    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fingerprint::BoundaryRef;
    use crate::store::ArtifactCache;
    use fantasim_kv::{KvStore, MemoryKv};
    use std::collections::BTreeMap as Map;
    use std::sync::{Arc, Mutex};

    fn cache() -> ArtifactCache {
        let kv: Arc<Mutex<dyn KvStore + Send>> = Arc::new(Mutex::new(MemoryKv::new()));
        ArtifactCache::new(kv)
    }

    #[test]
    fn keeps_min_artifacts_even_when_old() {
        let cache = cache();
        let params = Map::new();
        for tick in 0..3 {
            cache
                .get_or_create(
                    "S:1:",
                    "Atlas",
                    &BoundaryRef::new("tick", tick.to_string()),
                    "G",
                    "1.0.0",
                    &params,
                    || Ok(format!("payload-{tick}").into_bytes()),
                )
                .unwrap();
        }
        let report = collect(
            &cache,
            "S:1:",
            RetentionPolicy {
                max_sequence_age: 0,
                min_artifacts_to_keep: 2,
            },
        )
        .unwrap();
        assert_eq!(report.manifests_deleted, 1);
        assert_eq!(report.payloads_deleted, 1);
    }

    #[test]
    fn nothing_collected_when_within_max_age() {
        let cache = cache();
        let params = Map::new();
        cache
            .get_or_create("S:1:", "Atlas", &BoundaryRef::new("tick", "0"), "G", "1.0.0", &params, || {
                Ok(b"p".to_vec())
            })
            .unwrap();
        let report = collect(
            &cache,
            "S:1:",
            RetentionPolicy {
                max_sequence_age: 1000,
                min_artifacts_to_keep: 0,
            },
        )
        .unwrap();
        assert_eq!(report.manifests_deleted, 0);
    }
}
