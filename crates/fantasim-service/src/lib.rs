// SPDX-License-Identifier: Apache-2.0
//! Query facade over materialized topology and kinematics state:
//! `Reconstruct`, `QueryPlateId`, and `QueryVelocity` (§4.9), each returning
//! a [`provenance::ProvenanceChain`] alongside its result.
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

/// Provenance chain assembly, validation, and digesting.
pub mod provenance;
/// `Reconstruct`: feature-set geometry replay under plate kinematics.
pub mod reconstruct;
/// `QueryPlateId`: point-in-plate resolution.
pub mod plate_query;
/// `QueryVelocity`: point velocity resolution and decomposition.
pub mod velocity_query;

pub use plate_query::{query_plate_id, PlateAssignmentConfidence, PlateAssignmentResult, PlateCandidate};
pub use provenance::{frame_cache_fragment, topology_stream_hash, ProvenanceChain, RotationSegmentRef};
pub use reconstruct::{reconstruct, Feature, FeatureSet, ReconstructResult, ReconstructedFeature};
pub use velocity_query::{query_velocity, VelocityDecomposition, VelocityResult};
