// SPDX-License-Identifier: Apache-2.0
//! `fantasim-core`: stream identity, ticks, stable ids, and the deterministic
//! rotation math shared by every other FantaSim-World crate.
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

/// Configuration structs mirroring the options recognized by each component.
pub mod config;
/// Crate-wide error taxonomy (§7).
pub mod error;
/// Canonical hashing helpers (SHA-256 preimage framing).
pub mod hash;
/// Stream identity and stable 128-bit semantic identifiers.
pub mod ident;
/// Deterministic math: vectors, quaternions, quantized stage rotations.
pub mod math;
/// Canonical simulation tick.
pub mod tick;

pub use error::FantaSimError;
pub use hash::Hash;
pub use ident::{
    BoundaryId, FeatureId, FeatureSetId, JunctionId, MotionSegmentId, ModelId, PlateId,
    StreamDomain, StreamIdentity,
};
pub use math::{Quat, StageRotation, Vec3};
pub use tick::Tick;
