// SPDX-License-Identifier: Apache-2.0
//! Discrete-event simulation scheduler: a total-order priority queue under
//! the canonical ordering key, and the runtime loop that drains it (§4.5).
//!
//! Deliberately simpler than `warp_core::scheduler::RadixScheduler`, which
//! solves multi-writer footprint conflict detection — of no use to a
//! single-writer DES loop. This crate keeps its total-order drain discipline
//! and `tracing`-based run telemetry and drops the conflict machinery
//! entirely.
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

mod queue;
mod run;

pub use queue::{Scheduler, ScheduledWorkItem, Sphere};
pub use run::{run, Dispatcher, RunOptions, RunSummary};
