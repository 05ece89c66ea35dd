// SPDX-License-Identifier: Apache-2.0
//! Spherical geometry: reconstruction/partition solving (§4.6) and
//! velocity/boundary analytics (§4.7).
//!
//! Reuses `rmg_geom`'s general shape (typed wrapper crate over a core math
//! crate, `#![deny(missing_docs)]`, float-precision determinism notes) for
//! its supporting spherical types, but the polygon arrangement solver and
//! velocity decomposition are built from scratch: nothing else in this
//! workspace performs spherical polygonization.
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

/// Spherical points and great-circle arcs.
pub mod spherical;
/// Reconstruction and partition solvers.
pub mod partition;
/// Velocity and boundary analytics.
pub mod velocity;
/// Reference-frame composition.
pub mod frame;

pub use frame::{Frame, FrameLink};
pub use partition::{PartitionResult, PlatePolygon, QualityMetrics};
pub use spherical::{contains_point, resolve_epsilon, GreatCircleArc, SphericalPoint};
pub use velocity::{BoundaryVelocityProfile, StrikeSlipSense};
