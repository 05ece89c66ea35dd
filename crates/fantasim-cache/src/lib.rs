// SPDX-License-Identifier: Apache-2.0
//! Content-addressed artifact cache: manifest/payload pairing, fingerprint
//! computation, and retention-policy garbage collection (§4.8).
//!
//! Generalizes `echo_cas` from a flat `BlobHash -> bytes` map to the
//! three-tier key layout `stream_prefix || "Artifact:" || artifact_kind ||
//! ":" || input_fingerprint || ":Manifest"/":Payload"` (§6). [`RawStore`]
//! plays the role `echo_cas::BlobStore` plays — a store that knows nothing
//! about manifests — and [`store::ArtifactCache`] is the manifest-aware
//! caller built on top, the same split `echo_cas`'s own callers observe
//! against `BlobStore`. GC generalizes `echo_cas`'s pin/unpin retention-root
//! model into age-plus-min-keep-per-kind (§4.8 "Garbage collection").
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

/// Content-addressed raw blob storage (BLAKE3), mirroring `echo_cas::BlobStore`.
pub mod raw;
/// `input_fingerprint` and `params_hash` computation.
pub mod fingerprint;
/// Cache manifest record shape.
pub mod manifest;
/// Manifest-aware artifact cache: key layout, `get_or_create`, pair-write.
pub mod store;
/// Retention-policy garbage collection.
pub mod gc;

pub use fingerprint::{input_fingerprint, params_hash, BoundaryRef, ParamValue};
pub use gc::{collect, CollectionReport, RetentionPolicy};
pub use manifest::{ArtifactManifest, StorageRef};
pub use raw::{blob_hash, BlobHash, CacheError, MemoryRawStore, RawStore};
pub use store::{ArtifactCache, GetOrCreateOutcome};
