// SPDX-License-Identifier: Apache-2.0
//! Canonical SHA-256 hashing helpers.
//!
//! The wire format (§4.1, §6) normatively specifies SHA-256 for the event
//! hash chain, manifest content hashes, and fingerprints, so this crate
//! wraps `sha2` here rather than `blake3` (see `fantasim-cache`, which uses
//! BLAKE3 for its own internal blob layer; the split is recorded in
//! `DESIGN.md`).

use sha2::{Digest, Sha256};

/// A 32-byte SHA-256 digest used throughout the engine for hash chains,
/// content addressing, and fingerprints.
pub type Hash = [u8; 32];

/// The all-zero hash used as the genesis `previous_hash` in a hash chain.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Computes `SHA-256(bytes)`.
#[must_use]
pub fn sha256(bytes: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Incremental canonical-preimage builder.
///
/// Canonical tuple framing for the event hash chain preimage (§4.1): each
/// field is length-prefixed so the framing
/// is unambiguous and injective, the same discipline
/// `warp_core::ident::make_node_id` applies to a single domain-separated
/// label but generalized to a tuple of heterogeneous fields.
#[derive(Default)]
pub struct Preimage {
    hasher: Sha256,
}

impl Preimage {
    /// Starts a new preimage accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
        }
    }

    /// Appends a length-prefixed byte field.
    #[must_use]
    pub fn field(mut self, bytes: &[u8]) -> Self {
        self.hasher.update((bytes.len() as u64).to_be_bytes());
        self.hasher.update(bytes);
        self
    }

    /// Appends a big-endian `i64` field.
    #[must_use]
    pub fn field_i64(self, value: i64) -> Self {
        self.field(&value.to_be_bytes())
    }

    /// Appends a big-endian `u64` field.
    #[must_use]
    pub fn field_u64(self, value: u64) -> Self {
        self.field(&value.to_be_bytes())
    }

    /// Appends a big-endian `i32` field.
    #[must_use]
    pub fn field_i32(self, value: i32) -> Self {
        self.field(&value.to_be_bytes())
    }

    /// Finalizes the accumulated preimage into a digest.
    #[must_use]
    pub fn finish(self) -> Hash {
        self.hasher.finalize().into()
    }
}

/// Renders a hash as lowercase hex, matching `echo_cas::BlobHash`'s `Display`.
#[must_use]
pub fn to_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

/// Parses a 64-char lowercase hex string into a hash.
///
/// # Errors
/// Returns `Err` if the string is not exactly 64 hex characters.
pub fn from_hex(s: &str) -> Result<Hash, hex::FromHexError> {
    let bytes = hex::decode(s)?;
    bytes
        .try_into()
        .map_err(|_| hex::FromHexError::InvalidStringLength)
}
