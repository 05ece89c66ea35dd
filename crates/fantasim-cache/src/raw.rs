// SPDX-License-Identifier: Apache-2.0
//! Content-addressed blob store, adapted from `echo_cas::BlobStore` and
//! `echo_cas::MemoryTier`.
//!
//! The content IS the identity: [`blob_hash`] carries no domain prefix,
//! matching `echo_cas`'s hash domain policy. BLAKE3 is fine for this
//! internal dedup layer even though the wire-visible manifest content hash
//! is SHA-256 (§4.1, §6; see [`crate::manifest::StorageRef`] and
//! `fantasim_core::hash`, which documents the split).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use fantasim_core::hash::to_hex;

/// Content address of a blob: `BLAKE3(bytes)`.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BlobHash(pub [u8; 32]);

impl BlobHash {
    /// Renders the hash as lowercase hex.
    #[must_use]
    pub fn to_hex(self) -> String {
        to_hex(&self.0)
    }
}

impl std::fmt::Display for BlobHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Computes the content address of `bytes`.
#[must_use]
pub fn blob_hash(bytes: &[u8]) -> BlobHash {
    BlobHash(*blake3::hash(bytes).as_bytes())
}

/// Errors raised storing or verifying a raw blob.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// `put_verified` was given bytes whose digest disagrees with the
    /// caller's claimed hash.
    #[error("blob hash mismatch: expected {expected}, computed {computed}")]
    HashMismatch {
        /// Hash the caller expected.
        expected: BlobHash,
        /// Hash actually computed from the bytes.
        computed: BlobHash,
    },
}

/// Content-addressed blob store. Absence is not an error:
/// [`get`](RawStore::get) returns `None` for a missing hash rather than
/// failing.
pub trait RawStore {
    /// Stores `bytes`, returning its content address. Idempotent: storing
    /// the same bytes twice returns the same hash and does not duplicate
    /// storage.
    fn put(&mut self, bytes: &[u8]) -> BlobHash;

    /// Stores `bytes` only if they hash to `expected`.
    ///
    /// # Errors
    /// Returns [`CacheError::HashMismatch`] if `bytes` does not hash to
    /// `expected`; the store is left unchanged.
    fn put_verified(&mut self, expected: BlobHash, bytes: &[u8]) -> Result<(), CacheError>;

    /// Reads the blob stored at `hash`, or `None` if absent.
    fn get(&self, hash: &BlobHash) -> Option<Arc<[u8]>>;

    /// Returns `true` if `hash` is present.
    fn has(&self, hash: &BlobHash) -> bool;

    /// Marks `hash` as a retention root, exempt from garbage collection.
    fn pin(&mut self, hash: &BlobHash);

    /// Clears a retention root. No-op if `hash` was not pinned.
    fn unpin(&mut self, hash: &BlobHash);
}

/// In-memory [`RawStore`], adapted from `echo_cas::MemoryTier`.
pub struct MemoryRawStore {
    blobs: HashMap<BlobHash, Arc<[u8]>>,
    pins: HashSet<BlobHash>,
}

impl MemoryRawStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            blobs: HashMap::new(),
            pins: HashSet::new(),
        }
    }

    /// Number of blobs stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Returns `true` if no blobs are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Returns `true` if `hash` is in the pin-set.
    #[must_use]
    pub fn is_pinned(&self, hash: &BlobHash) -> bool {
        self.pins.contains(hash)
    }
}

impl Default for MemoryRawStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RawStore for MemoryRawStore {
    fn put(&mut self, bytes: &[u8]) -> BlobHash {
        let hash = blob_hash(bytes);
        self.blobs.entry(hash).or_insert_with(|| Arc::from(bytes));
        hash
    }

    fn put_verified(&mut self, expected: BlobHash, bytes: &[u8]) -> Result<(), CacheError> {
        let computed = blob_hash(bytes);
        if computed != expected {
            return Err(CacheError::HashMismatch { expected, computed });
        }
        self.blobs.entry(computed).or_insert_with(|| Arc::from(bytes));
        Ok(())
    }

    fn get(&self, hash: &BlobHash) -> Option<Arc<[u8]>> {
        self.blobs.get(hash).cloned()
    }

    fn has(&self, hash: &BlobHash) -> bool {
        self.blobs.contains_key(hash)
    }

    fn pin(&mut self, hash: &BlobHash) {
        self.pins.insert(*hash);
    }

    fn unpin(&mut self, hash: &BlobHash) {
        self.pins.remove(hash);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn put_get_round_trip() {
        let mut store = MemoryRawStore::new();
        let data = b"hello fantasim-cache";
        let hash = store.put(data);
        assert_eq!(store.get(&hash).as_deref(), Some(data.as_slice()));
    }

    #[test]
    fn put_verified_rejects_mismatch() {
        let mut store = MemoryRawStore::new();
        let bad_hash = BlobHash([0xFF; 32]);
        let result = store.put_verified(bad_hash, b"some bytes");
        assert!(matches!(result, Err(CacheError::HashMismatch { .. })));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn put_idempotence() {
        let mut store = MemoryRawStore::new();
        let h1 = store.put(b"duplicate");
        let h2 = store.put(b"duplicate");
        assert_eq!(h1, h2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn pre_pin_then_put_preserves_pin() {
        let mut store = MemoryRawStore::new();
        let hash = blob_hash(b"arriving later");
        store.pin(&hash);
        assert!(store.is_pinned(&hash));
        assert!(!store.has(&hash));
        store.put(b"arriving later");
        assert!(store.is_pinned(&hash));
        assert!(store.has(&hash));
    }

    #[test]
    fn unpin_missing_is_noop() {
        let mut store = MemoryRawStore::new();
        let hash = BlobHash([0xAA; 32]);
        store.unpin(&hash);
        assert!(!store.is_pinned(&hash));
    }

    #[test]
    fn get_missing_returns_none() {
        let store = MemoryRawStore::new();
        assert!(store.get(&BlobHash([0xBB; 32])).is_none());
    }

    #[test]
    fn hex_display_round_trips_through_to_hex() {
        let hash = blob_hash(b"display me");
        assert_eq!(hash.to_string(), hash.to_hex());
        assert_eq!(hash.to_hex().len(), 64);
    }
}
