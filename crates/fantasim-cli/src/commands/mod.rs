// SPDX-License-Identifier: Apache-2.0
//! One module per subcommand.

pub mod append;
pub mod cache_gc;
pub mod materialize;
pub mod reconstruct;
pub mod run;
