// SPDX-License-Identifier: Apache-2.0
//! `fantasim append`: reads a JSON array of tick-stamped events and appends
//! them to a stream (§6 `append`).

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use clap::Args;
use fantasim_core::config::AppendOptions;
use fantasim_core::{StreamDomain, StreamIdentity, Tick};
use fantasim_events::payload::{KinematicsEvent, TopologyEvent};
use fantasim_events::store::{EventDraft, KinematicsEventStore, TopologyEventStore};
use serde::de::DeserializeOwned;

use crate::args::TickPolicyArg;
use crate::kv;

/// Arguments for `fantasim append`.
#[derive(Debug, Args)]
pub struct AppendArgs {
    /// Target stream, in canonical key form (`S:{variant}:{branch}:L{level}:{domain}:M{model}:`).
    #[arg(long)]
    stream: String,
    /// Path to a JSON file holding an array of `{"tick": <i64>, "payload": <event>}` objects.
    #[arg(long)]
    events: PathBuf,
    /// Tick monotonicity enforcement for this append.
    #[arg(long, value_enum, default_value = "reject")]
    tick_policy: TickPolicyArg,
    /// Path to the KV store backing file.
    #[arg(long, default_value = "fantasim.kv")]
    kv: PathBuf,
}

#[derive(Debug, serde::Deserialize)]
struct EventIn<P> {
    tick: i64,
    payload: P,
}

fn load_drafts<P: DeserializeOwned>(path: &PathBuf) -> anyhow::Result<Vec<EventDraft<P>>> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let items: Vec<EventIn<P>> = serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    Ok(items.into_iter().map(|item| EventDraft::new(Tick::new(item.tick), item.payload)).collect())
}

/// Runs `fantasim append`.
pub fn run(args: &AppendArgs) -> anyhow::Result<()> {
    let identity = StreamIdentity::from_str(&args.stream).with_context(|| format!("invalid --stream {}", args.stream))?;
    let kv = kv::open(&args.kv)?;
    let options = AppendOptions {
        tick_policy: args.tick_policy.into(),
    };

    match identity.domain {
        StreamDomain::PlatesTopology => {
            let drafts: Vec<EventDraft<TopologyEvent>> = load_drafts(&args.events)?;
            let store = TopologyEventStore::new(kv, identity);
            let records = store.append(&drafts, options)?;
            println!("appended {} record(s) to {}", records.len(), identity);
        }
        StreamDomain::PlatesKinematics => {
            let drafts: Vec<EventDraft<KinematicsEvent>> = load_drafts(&args.events)?;
            let store = KinematicsEventStore::new(kv, identity);
            let records = store.append(&drafts, options)?;
            println!("appended {} record(s) to {}", records.len(), identity);
        }
    }

    Ok(())
}
