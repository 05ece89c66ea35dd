// SPDX-License-Identifier: Apache-2.0
//! Whole-file-snapshot persistent [`KvStore`], the backend `fantasim-cli`
//! opens so state survives between invocations.
//!
//! No disk-tier reference existed to adapt, so this backend is built
//! directly: the entire ordered map is decoded
//! from a single CBOR file at open and re-encoded on every
//! [`batch_write`](KvStore::batch_write). Adequate for a developer CLI
//! operating on one stream at a time; a production deployment would want
//! incremental persistence instead of whole-file rewrites.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::{KvError, KvStore, WriteOp};

type Snapshot = BTreeMap<Vec<u8>, Vec<u8>>;

/// File-backed ordered key-value store.
pub struct FileKv {
    path: PathBuf,
    map: Mutex<Snapshot>,
}

impl FileKv {
    /// Opens (creating if absent) a store backed by `path`.
    ///
    /// # Errors
    /// Returns [`KvError::Backend`] if `path` exists but cannot be read or
    /// decoded as a valid snapshot.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, KvError> {
        let path = path.as_ref().to_path_buf();
        let map = if path.exists() {
            let bytes = fs::read(&path).map_err(|e| KvError::Backend(e.to_string()))?;
            if bytes.is_empty() {
                Snapshot::new()
            } else {
                ciborium::from_reader(bytes.as_slice()).map_err(|e| KvError::Backend(e.to_string()))?
            }
        } else {
            Snapshot::new()
        };
        Ok(Self {
            path,
            map: Mutex::new(map),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Snapshot> {
        match self.map.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn flush(&self, map: &Snapshot) -> Result<(), KvError> {
        let mut bytes = Vec::new();
        ciborium::into_writer(map, &mut bytes).map_err(|e| KvError::Backend(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| KvError::Backend(e.to_string()))?;
        }
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, &bytes).map_err(|e| KvError::Backend(e.to_string()))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| KvError::Backend(e.to_string()))
    }
}

impl KvStore for FileKv {
    fn get(&self, key: &[u8]) -> Option<Arc<[u8]>> {
        self.lock().get(key).map(|v| Arc::from(v.as_slice()))
    }

    fn put(&mut self, key: &[u8], value: &[u8]) {
        let mut guard = self.lock();
        guard.insert(key.to_vec(), value.to_vec());
        let _ = self.flush(&guard);
    }

    fn batch_write(&mut self, ops: &[WriteOp]) -> Result<(), KvError> {
        let mut guard = self.lock();
        for op in ops {
            guard.insert(op.key.clone(), op.value.to_vec());
        }
        self.flush(&guard)
    }

    fn supports_scan(&self) -> bool {
        true
    }

    fn scan_from(&self, from: &[u8]) -> Vec<(Vec<u8>, Arc<[u8]>)> {
        self.lock()
            .range(from.to_vec()..)
            .map(|(k, v)| (k.clone(), Arc::from(v.as_slice())))
            .collect()
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Arc<[u8]>)> {
        self.lock()
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), Arc::from(v.as_slice())))
            .collect()
    }

    fn delete(&mut self, key: &[u8]) {
        let mut guard = self.lock();
        guard.remove(key);
        let _ = self.flush(&guard);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn put_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.cbor");
        {
            let mut kv = FileKv::open(&path).unwrap();
            kv.put(b"a", b"1");
        }
        let kv = FileKv::open(&path).unwrap();
        assert_eq!(kv.get(b"a").as_deref(), Some(b"1".as_slice()));
    }

    #[test]
    fn opening_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKv::open(dir.path().join("missing.cbor")).unwrap();
        assert!(kv.get(b"a").is_none());
    }

    #[test]
    fn batch_write_is_durable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.cbor");
        let mut kv = FileKv::open(&path).unwrap();
        kv.batch_write(&[
            WriteOp { key: b"x".to_vec(), value: Arc::from(b"1".as_slice()) },
            WriteOp { key: b"y".to_vec(), value: Arc::from(b"2".as_slice()) },
        ])
        .unwrap();
        drop(kv);
        let kv = FileKv::open(&path).unwrap();
        assert_eq!(kv.get(b"x").as_deref(), Some(b"1".as_slice()));
        assert_eq!(kv.get(b"y").as_deref(), Some(b"2".as_slice()));
    }
}
