// SPDX-License-Identifier: Apache-2.0
//! `fantasim reconstruct`: replays a caller-supplied feature set to a tick
//! under a plate's kinematics (§6 `reconstruct`, §4.9 `Reconstruct`).

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use clap::Args;
use fantasim_core::config::{PartitionOptions, ReconstructOptions, TolerancePolicy};
use fantasim_core::{StreamDomain, StreamIdentity, Tick};
use fantasim_events::store::{KinematicsEventStore, TopologyEventStore};
use fantasim_materialize::{kinematics, topology};
use fantasim_service::{reconstruct as reconstruct_features, FeatureSet};

use crate::args::{ProvenanceStrictnessArg, ToleranceKindArg};
use crate::kv;

/// Arguments for `fantasim reconstruct`.
#[derive(Debug, Args)]
pub struct ReconstructArgs {
    /// Stream identifying the plate system (either domain; the paired
    /// topology/kinematics stream is derived by substituting the domain).
    #[arg(long)]
    stream: String,
    /// Path to a JSON-encoded `FeatureSet`.
    #[arg(long)]
    feature_set: PathBuf,
    /// Tick to reconstruct the feature set's geometry to.
    #[arg(long)]
    tick: i64,
    /// Numerical tolerance policy for the underlying partition solve.
    #[arg(long, value_enum, default_value = "default")]
    tolerance: ToleranceKindArg,
    /// Tolerated angular inconsistency in radians, only read when `--tolerance lenient`.
    #[arg(long)]
    epsilon: Option<f64>,
    /// How strictly the returned provenance chain must be fully linked.
    #[arg(long, value_enum, default_value = "strict")]
    provenance: ProvenanceStrictnessArg,
    /// Path to the KV store backing file.
    #[arg(long, default_value = "fantasim.kv")]
    kv: PathBuf,
}

fn tolerance_policy(kind: ToleranceKindArg, epsilon: Option<f64>) -> anyhow::Result<TolerancePolicy> {
    Ok(match kind {
        ToleranceKindArg::Strict => TolerancePolicy::Strict,
        ToleranceKindArg::Default => TolerancePolicy::Default,
        ToleranceKindArg::Lenient => TolerancePolicy::Lenient {
            epsilon: epsilon.context("--tolerance lenient requires --epsilon")?,
        },
    })
}

/// Runs `fantasim reconstruct`.
pub fn run(args: &ReconstructArgs) -> anyhow::Result<()> {
    let identity = StreamIdentity::from_str(&args.stream).with_context(|| format!("invalid --stream {}", args.stream))?;
    let topo_identity = StreamIdentity::new(identity.variant_id, identity.branch_id, identity.level, StreamDomain::PlatesTopology, identity.model);
    let kinem_identity = StreamIdentity::new(identity.variant_id, identity.branch_id, identity.level, StreamDomain::PlatesKinematics, identity.model);

    let kv = kv::open(&args.kv)?;
    let target_tick = Tick::new(args.tick);

    let topo_records = TopologyEventStore::new(kv.clone(), topo_identity).read(0)?;
    let topology_snapshot = topology::materialize(&topo_records, target_tick, fantasim_core::config::TickFilterMode::Auto)?;

    let kinem_records = KinematicsEventStore::new(kv, kinem_identity).read(0)?;
    let kinematics_state = kinematics::materialize(&kinem_records)?;

    let raw = fs::read_to_string(&args.feature_set).with_context(|| format!("reading {}", args.feature_set.display()))?;
    let feature_set: FeatureSet = serde_json::from_str(&raw).with_context(|| format!("parsing {}", args.feature_set.display()))?;

    let options = ReconstructOptions {
        partition: PartitionOptions {
            tolerance: tolerance_policy(args.tolerance, args.epsilon)?,
        },
        provenance: args.provenance.into(),
    };

    let result = reconstruct_features(&feature_set, &topology_snapshot, target_tick, &kinematics_state, target_tick, options)?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
