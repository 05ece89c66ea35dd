// SPDX-License-Identifier: Apache-2.0
//! Event envelope, hash chain codec, and the topology/kinematics event
//! stores built on top of it.
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

/// Event envelope and the SHA-256 hash-chain codec (§4.1).
pub mod envelope;
/// Topology and kinematics event payload variants (§3).
pub mod payload;
/// Generic append-only, hash-chained event store (§4.2).
pub mod store;

pub use envelope::{EventRecord, HeadRecord};
pub use payload::{KinematicsEvent, TopologyEvent};
pub use store::{EventStore, KinematicsEventStore, TopologyEventStore};
