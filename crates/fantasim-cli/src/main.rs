// SPDX-License-Identifier: Apache-2.0
//! FantaSim-World developer CLI: `append`, `materialize`, `run`,
//! `reconstruct`, `cache gc` (§6 External Interfaces).
//!
//! Owns the process-wide `tracing` subscriber and the exit-code mapping
//! from [`FantaSimError`] to the codes §6 documents.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
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
    clippy::dbg_macro
)]
// A developer CLI's entire job is printing to stdout/stderr.
#![allow(clippy::print_stdout, clippy::print_stderr)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]

mod args;
mod commands;
mod kv;

use clap::{Args, Parser, Subcommand};
use fantasim_core::FantaSimError;
use tracing_subscriber::EnvFilter;

use commands::append::AppendArgs;
use commands::cache_gc::CacheGcArgs;
use commands::materialize::MaterializeArgs;
use commands::reconstruct::ReconstructArgs;
use commands::run::RunArgs;

#[derive(Parser)]
#[command(name = "fantasim", about = "FantaSim-World developer CLI", disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append events to a stream.
    Append(AppendArgs),
    /// Fold a stream's events into a snapshot as of a tick.
    Materialize(MaterializeArgs),
    /// Drain a scheduled work queue against a stream.
    Run(RunArgs),
    /// Replay a feature set's geometry to a tick under plate kinematics.
    Reconstruct(ReconstructArgs),
    /// Cache maintenance.
    Cache(CacheArgs),
}

#[derive(Args)]
struct CacheArgs {
    #[command(subcommand)]
    command: CacheCommands,
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Collect stale cached artifacts under a retention policy.
    Gc(CacheGcArgs),
}

fn dispatch(command: &Commands) -> anyhow::Result<()> {
    match command {
        Commands::Append(args) => commands::append::run(args),
        Commands::Materialize(args) => commands::materialize::run(args),
        Commands::Run(args) => commands::run::run(args),
        Commands::Reconstruct(args) => commands::reconstruct::run(args),
        Commands::Cache(cache) => match &cache.command {
            CacheCommands::Gc(args) => commands::cache_gc::run(args),
        },
    }
}

/// Maps an error to the exit code §6 documents: `2` invalid
/// arguments/config, `3` corruption detected, `4` tick policy violation on
/// append, `5` I/O error, `0` on success (handled by the caller).
fn exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(fanta) = cause.downcast_ref::<FantaSimError>() {
            return match fanta {
                FantaSimError::TickMonotonicityViolation { .. } => 4,
                FantaSimError::HashChainCorruption { .. }
                | FantaSimError::FingerprintMismatch { .. }
                | FantaSimError::ContentHashMismatch { .. } => 3,
                FantaSimError::Io(_) => 5,
                FantaSimError::InvalidArgument { .. }
                | FantaSimError::SchemaVersionUnsupported { .. }
                | FantaSimError::CyclicFrameReference { .. }
                | FantaSimError::InvalidTopology { .. }
                | FantaSimError::PolygonizationFailed { .. }
                | FantaSimError::Cancelled { .. }
                | FantaSimError::Codec(_) => 2,
            };
        }
        if cause.downcast_ref::<std::io::Error>().is_some() {
            return 5;
        }
    }
    2
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Err(err) = dispatch(&cli.command) {
        eprintln!("error: {err:#}");
        std::process::exit(exit_code(&err));
    }
}
