// SPDX-License-Identifier: Apache-2.0
//! `fantasim materialize`: folds a stream's event log into a topology or
//! kinematics snapshot as of a tick, and prints a summary table (§6
//! `materialize`).

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use clap::Args;
use comfy_table::Table;
use fantasim_core::config::MaterializeOptions;
use fantasim_core::{StreamDomain, StreamIdentity, Tick};
use fantasim_events::store::{KinematicsEventStore, TopologyEventStore};
use fantasim_materialize::{kinematics, topology};

use crate::args::TickFilterModeArg;
use crate::kv;

/// Arguments for `fantasim materialize`.
#[derive(Debug, Args)]
pub struct MaterializeArgs {
    /// Stream to materialize.
    #[arg(long)]
    stream: String,
    /// Tick to materialize state as of.
    #[arg(long)]
    tick: i64,
    /// How far into the log to scan when locating the target tick.
    #[arg(long, value_enum, default_value = "auto")]
    mode: TickFilterModeArg,
    /// Path to the KV store backing file.
    #[arg(long, default_value = "fantasim.kv")]
    kv: PathBuf,
}

/// Runs `fantasim materialize`.
pub fn run(args: &MaterializeArgs) -> anyhow::Result<()> {
    let identity = StreamIdentity::from_str(&args.stream).with_context(|| format!("invalid --stream {}", args.stream))?;
    let kv = kv::open(&args.kv)?;
    let target_tick = Tick::new(args.tick);
    let options = MaterializeOptions {
        tick_filter_mode: args.mode.into(),
    };

    match identity.domain {
        StreamDomain::PlatesTopology => {
            let store = TopologyEventStore::new(kv, identity);
            let records = store.read(0)?;
            let snapshot = topology::materialize(&records, target_tick, options.tick_filter_mode)?;

            let mut table = Table::new();
            table.set_header(vec!["plate", "retired"]);
            for (id, plate) in &snapshot.plates {
                table.add_row(vec![id.to_string(), plate.is_retired.to_string()]);
            }
            println!("{table}");
            println!("boundaries: {}, junctions: {}", snapshot.boundaries.len(), snapshot.junctions.len());
        }
        StreamDomain::PlatesKinematics => {
            let store = KinematicsEventStore::new(kv, identity);
            let records = store.read(0)?;
            let state = kinematics::materialize(&records)?;

            let mut table = Table::new();
            table.set_header(vec!["plate", "motion segments", "model"]);
            for (id, plate_kinematics) in state.plates() {
                table.add_row(vec![
                    id.to_string(),
                    plate_kinematics.segments().len().to_string(),
                    plate_kinematics
                        .model_assignment()
                        .map_or_else(|| "-".to_string(), |(model, tick)| format!("{model} @ {}", tick.index())),
                ]);
            }
            println!("{table}");
        }
    }

    Ok(())
}
