// SPDX-License-Identifier: Apache-2.0
//! In-memory reference implementation of [`KvStore`].

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::{KvError, KvStore, WriteOp};

/// `BTreeMap`-backed ordered key-value store, adapted from
/// `echo_cas::MemoryTier`'s in-memory tier but keyed by ordered byte strings
/// instead of content hash, and supporting native range scans.
///
/// Single-writer serialization (§5: "writers serialize via a per-process
/// lock") is a [`Mutex`] guarding the map, the same shared-resource shape
/// `warp_core::scheduler` documents for its process-wide tie-break counter.
pub struct MemoryKv {
    map: Mutex<BTreeMap<Vec<u8>, Arc<[u8]>>>,
}

impl MemoryKv {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: Mutex::new(BTreeMap::new()),
        }
    }

    /// Number of keys currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if no keys are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<Vec<u8>, Arc<[u8]>>> {
        // A poisoned lock means a prior writer panicked mid-mutation; since
        // this type forbids panics in its own methods, recover the guard
        // rather than poisoning every subsequent caller.
        match self.map.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for MemoryKv {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &[u8]) -> Option<Arc<[u8]>> {
        self.lock().get(key).cloned()
    }

    fn put(&mut self, key: &[u8], value: &[u8]) {
        self.lock().insert(key.to_vec(), Arc::from(value));
    }

    fn batch_write(&mut self, ops: &[WriteOp]) -> Result<(), KvError> {
        let mut guard = self.lock();
        for op in ops {
            guard.insert(op.key.clone(), op.value.clone());
        }
        Ok(())
    }

    fn supports_scan(&self) -> bool {
        true
    }

    fn scan_from(&self, from: &[u8]) -> Vec<(Vec<u8>, Arc<[u8]>)> {
        self.lock()
            .range(from.to_vec()..)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Arc<[u8]>)> {
        self.lock()
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn delete(&mut self, key: &[u8]) {
        self.lock().remove(key);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn put_get_round_trip() {
        let mut kv = MemoryKv::new();
        kv.put(b"a", b"1");
        assert_eq!(kv.get(b"a").as_deref(), Some(b"1".as_slice()));
    }

    #[test]
    fn get_missing_returns_none() {
        let kv = MemoryKv::new();
        assert!(kv.get(b"missing").is_none());
    }

    #[test]
    fn scan_from_is_ordered_and_inclusive() {
        let mut kv = MemoryKv::new();
        kv.put(b"b", b"2");
        kv.put(b"a", b"1");
        kv.put(b"c", b"3");
        let scanned = kv.scan_from(b"b");
        let keys: Vec<_> = scanned.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, vec![b"b".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn scan_prefix_excludes_non_matching_keys() {
        let mut kv = MemoryKv::new();
        kv.put(b"S:1:E:0001", b"x");
        kv.put(b"S:1:E:0002", b"y");
        kv.put(b"S:2:E:0001", b"z");
        let scanned = kv.scan_prefix(b"S:1:");
        assert_eq!(scanned.len(), 2);
    }

    #[test]
    fn batch_write_applies_all_ops_atomically() {
        let mut kv = MemoryKv::new();
        let ops = vec![
            WriteOp {
                key: b"x".to_vec(),
                value: Arc::from(b"1".as_slice()),
            },
            WriteOp {
                key: b"y".to_vec(),
                value: Arc::from(b"2".as_slice()),
            },
        ];
        kv.batch_write(&ops).unwrap();
        assert_eq!(kv.get(b"x").as_deref(), Some(b"1".as_slice()));
        assert_eq!(kv.get(b"y").as_deref(), Some(b"2".as_slice()));
    }

    #[test]
    fn delete_removes_key() {
        let mut kv = MemoryKv::new();
        kv.put(b"a", b"1");
        kv.delete(b"a");
        assert!(kv.get(b"a").is_none());
    }

    #[test]
    fn supports_scan_is_true() {
        assert!(MemoryKv::new().supports_scan());
    }

    #[test]
    fn len_and_is_empty_track_contents() {
        let mut kv = MemoryKv::new();
        assert!(kv.is_empty());
        kv.put(b"a", b"1");
        assert_eq!(kv.len(), 1);
    }
}
