// SPDX-License-Identifier: Apache-2.0
//! Folds append-only event streams into read-only state views.
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

/// Kinematics materializer and rotation evaluation (§4.4).
pub mod kinematics;
/// Topology materializer and snapshot (§4.3).
pub mod topology;

pub use kinematics::{KinematicsState, PlateKinematics};
pub use topology::{Boundary, Junction, Plate, TopologySnapshot};
