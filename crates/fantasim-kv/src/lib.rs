// SPDX-License-Identifier: Apache-2.0
//! Abstract ordered key-value substrate with capability probes.
//!
//! `echo-cas::BlobStore` defines a small, object-safe trait over a
//! content-addressed map. [`KvStore`] generalizes that shape to an
//! arbitrary-key *ordered* map: event stores key records by
//! `stream_prefix || "E:" || big_endian_u64(sequence)` and need range scans,
//! not just point lookups by content hash.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions
)]

mod file;
mod memory;

pub use file::FileKv;
pub use memory::MemoryKv;

use std::sync::Arc;

/// Errors raised by a [`KvStore`] implementation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum KvError {
    /// The backend could not perform the requested operation.
    #[error("kv backend error: {0}")]
    Backend(String),
}

/// A single key/value write.
#[derive(Debug, Clone)]
pub struct WriteOp {
    /// Key to write.
    pub key: Vec<u8>,
    /// New value.
    pub value: Arc<[u8]>,
}

/// Abstract ordered key-value substrate.
///
/// Mirrors `echo_cas::BlobStore`'s small, object-safe trait shape, but keyed
/// by arbitrary ordered byte strings rather than content hash. Absence is
/// not an error: [`get`](KvStore::get) returns `None` for a missing key.
pub trait KvStore {
    /// Reads the value stored at `key`, or `None` if absent.
    fn get(&self, key: &[u8]) -> Option<Arc<[u8]>>;

    /// Writes `value` at `key`, replacing any prior value.
    fn put(&mut self, key: &[u8], value: &[u8]);

    /// Atomically applies every write in `ops`, in order. Either all writes
    /// land or, on backend failure, none do.
    ///
    /// # Errors
    /// Returns [`KvError::Backend`] if the backend could not commit the
    /// batch; the store is left unchanged.
    fn batch_write(&mut self, ops: &[WriteOp]) -> Result<(), KvError>;

    /// Returns `true` if this backend can seek an iterator directly to a
    /// starting key rather than the caller issuing individual point reads.
    /// Event-store reads (§4.2) prefer this path when available.
    fn supports_scan(&self) -> bool;

    /// Returns every `(key, value)` pair with `key >= from`, in ascending
    /// key order. Callers should check [`supports_scan`](KvStore::supports_scan)
    /// first; backends without a native seek still implement this correctly,
    /// just less efficiently.
    fn scan_from(&self, from: &[u8]) -> Vec<(Vec<u8>, Arc<[u8]>)>;

    /// Returns every `(key, value)` pair whose key starts with `prefix`, in
    /// ascending key order.
    fn scan_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Arc<[u8]>)>;

    /// Deletes the value at `key`, if present. No-op if absent.
    fn delete(&mut self, key: &[u8]);
}
